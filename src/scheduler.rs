//! Batch scheduler submission for file-concatenation jobs.
//!
//! The cluster runs the actual concatenation; this crate only submits jobs.
//! `JobScheduler` is the seam between the merge workflow and the external
//! queue, so tests can substitute a recording fake.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

/// Submission command used when none is configured.
pub const DEFAULT_SUBMIT_COMMAND: &str = "sbatch";
/// Concatenation job script handed to the scheduler.
pub const DEFAULT_CONCAT_SCRIPT: &str = "utils/concat_files.sbatch";

/// A single concatenation request: merge `input_a` and `input_b` into `output`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeJob {
    pub input_a: PathBuf,
    pub input_b: PathBuf,
    pub output: PathBuf,
}

impl MergeJob {
    pub fn new(
        input_a: impl Into<PathBuf>,
        input_b: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_a: input_a.into(),
            input_b: input_b.into(),
            output: output.into(),
        }
    }

    /// Scheduler argument list: `-1 <inputA> -2 <inputB> -o <output>`.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-1".to_string(),
            self.input_a.display().to_string(),
            "-2".to_string(),
            self.input_b.display().to_string(),
            "-o".to_string(),
            self.output.display().to_string(),
        ]
    }
}

/// External job queue interface.
pub trait JobScheduler {
    fn submit(&mut self, job: &MergeJob) -> Result<(), Box<dyn std::error::Error>>;
}

/// Submits jobs by invoking the batch scheduler binary (sbatch by default).
pub struct SbatchScheduler {
    submit_command: String,
    script: PathBuf,
}

impl SbatchScheduler {
    pub fn new(submit_command: &str, script: &Path) -> Self {
        Self {
            submit_command: submit_command.to_string(),
            script: script.to_path_buf(),
        }
    }
}

impl Default for SbatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMIT_COMMAND, Path::new(DEFAULT_CONCAT_SCRIPT))
    }
}

impl JobScheduler for SbatchScheduler {
    fn submit(&mut self, job: &MergeJob) -> Result<(), Box<dyn std::error::Error>> {
        let args = job.args();
        info!(
            "Running command: {} {} {}",
            self.submit_command,
            self.script.display(),
            args.join(" ")
        );
        let status = Command::new(&self.submit_command)
            .arg(&self.script)
            .args(&args)
            .status()
            .map_err(|e| {
                std::io::Error::other(format!(
                    "Error invoking {}: {}",
                    self.submit_command, e
                ))
            })?;
        if !status.success() {
            return Err(format!(
                "{} exited with {} for output {}",
                self.submit_command,
                status,
                job.output.display()
            )
            .into());
        }
        Ok(())
    }
}

/// Logs the would-be submission without invoking anything.
pub struct DryRunScheduler {
    submit_command: String,
    script: PathBuf,
}

impl DryRunScheduler {
    pub fn new(submit_command: &str, script: &Path) -> Self {
        Self {
            submit_command: submit_command.to_string(),
            script: script.to_path_buf(),
        }
    }

    /// The command line that a real submission would run.
    pub fn preview(&self, job: &MergeJob) -> String {
        format!(
            "{} {} {}",
            self.submit_command,
            self.script.display(),
            job.args().join(" ")
        )
    }
}

impl Default for DryRunScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMIT_COMMAND, Path::new(DEFAULT_CONCAT_SCRIPT))
    }
}

impl JobScheduler for DryRunScheduler {
    fn submit(&mut self, job: &MergeJob) -> Result<(), Box<dyn std::error::Error>> {
        info!("[dry-run] {}", self.preview(job));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_args_convention() {
        let job = MergeJob::new("a.fq.gz", "b.fq.gz", "out/S1.R1.fq.gz");
        assert_eq!(
            job.args(),
            vec!["-1", "a.fq.gz", "-2", "b.fq.gz", "-o", "out/S1.R1.fq.gz"]
        );
    }

    #[test]
    fn test_sbatch_missing_command_is_an_error() {
        let mut sched = SbatchScheduler::new(
            "definitely-not-a-real-scheduler-binary",
            Path::new(DEFAULT_CONCAT_SCRIPT),
        );
        let job = MergeJob::new("a", "b", "c");
        assert!(sched.submit(&job).is_err());
    }

    #[test]
    fn test_sbatch_nonzero_exit_is_an_error() {
        let mut sched = SbatchScheduler::new("false", Path::new("ignored"));
        let job = MergeJob::new("a", "b", "c");
        let err = sched.submit(&job).unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[test]
    fn test_dry_run_always_succeeds() {
        let mut sched = DryRunScheduler::default();
        assert!(sched.submit(&MergeJob::new("a", "b", "c")).is_ok());
    }

    #[test]
    fn test_dry_run_preview_uses_configured_command() {
        let sched = DryRunScheduler::new("qsub", Path::new("scripts/cat.sh"));
        let job = MergeJob::new("a.fq.gz", "b.fq.gz", "out/S1.R1.fq.gz");
        assert_eq!(
            sched.preview(&job),
            "qsub scripts/cat.sh -1 a.fq.gz -2 b.fq.gz -o out/S1.R1.fq.gz"
        );
    }
}
