//! Merge planning and dispatch for split sequencing runs.
//!
//! Planning reads an immutable snapshot of the combined metadata and builds
//! the full job list up front; the read-path columns are only rewritten once
//! dispatch is done, so original paths stay visible throughout the loop.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{error, info, warn};

use crate::metadata::{batch2_column, FORWARD_READS, REVERSE_READS};
use crate::scheduler::{JobScheduler, MergeJob};
use crate::table::SampleTable;

/// Merged output paths for one sample: forward (R1) and reverse (R2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPaths {
    pub forward: PathBuf,
    pub reverse: PathBuf,
}

/// Everything the dispatcher needs: the job list plus, per sample, the
/// merged paths that will replace the read columns after dispatch.
#[derive(Debug, Default)]
pub struct MergePlan {
    pub jobs: Vec<MergeJob>,
    pub merged: IndexMap<String, MergedPaths>,
    /// Samples skipped because their batch-2 read paths were missing.
    pub skipped: Vec<String>,
}

/// Deterministic merged path pair for a sample under `output_dir`.
pub fn merged_read_paths(output_dir: &Path, sample: &str) -> MergedPaths {
    MergedPaths {
        forward: output_dir.join(format!("{}.R1.fq.gz", sample)),
        reverse: output_dir.join(format!("{}.R2.fq.gz", sample)),
    }
}

/// Build the merge plan from a combined metadata table.
///
/// Two jobs per sample (forward pair, reverse pair). A sample whose batch-2
/// read paths are empty cannot be merged; it is logged and recorded in
/// `skipped`, and its metadata row is left pointing at the original files.
pub fn plan_merges(combined: &SampleTable, output_dir: &Path) -> MergePlan {
    let fwd2_col = batch2_column(FORWARD_READS);
    let rev2_col = batch2_column(REVERSE_READS);

    let mut plan = MergePlan::default();
    for sample in combined.samples() {
        let fwd_1 = combined.get(sample, FORWARD_READS).unwrap_or("");
        let fwd_2 = combined.get(sample, &fwd2_col).unwrap_or("");
        let rev_1 = combined.get(sample, REVERSE_READS).unwrap_or("");
        let rev_2 = combined.get(sample, &rev2_col).unwrap_or("");

        if fwd_2.is_empty() || rev_2.is_empty() {
            warn!(
                "Sample '{}' has no batch-2 read paths - skipping merge for this sample",
                sample
            );
            plan.skipped.push(sample.to_string());
            continue;
        }
        if fwd_1.is_empty() || rev_1.is_empty() {
            warn!(
                "Sample '{}' has no batch-1 read paths - skipping merge for this sample",
                sample
            );
            plan.skipped.push(sample.to_string());
            continue;
        }

        let paths = merged_read_paths(output_dir, sample);
        plan.jobs.push(MergeJob::new(fwd_1, fwd_2, &paths.forward));
        plan.jobs.push(MergeJob::new(rev_1, rev_2, &paths.reverse));
        plan.merged.insert(sample.to_string(), paths);
    }
    plan
}

/// Submit every planned job. Failures are reported and counted; remaining
/// jobs are still submitted. Returns the number of failed submissions.
pub fn dispatch(plan: &MergePlan, scheduler: &mut dyn JobScheduler) -> usize {
    let mut failures = 0;
    for job in &plan.jobs {
        if let Err(e) = scheduler.submit(job) {
            error!("Job submission failed for {}: {}", job.output.display(), e);
            failures += 1;
        }
    }
    info!(
        "Submitted {} of {} merge jobs",
        plan.jobs.len() - failures,
        plan.jobs.len()
    );
    failures
}

/// Point the read columns at the merged outputs for every planned sample.
pub fn apply_merged_paths(table: &mut SampleTable, plan: &MergePlan) {
    for (sample, paths) in &plan.merged {
        table.set(sample, FORWARD_READS, &paths.forward.display().to_string());
        table.set(sample, REVERSE_READS, &paths.reverse.display().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::combine;
    use std::io::Cursor;

    struct FakeScheduler {
        submitted: Vec<MergeJob>,
        fail_on: Option<PathBuf>,
    }

    impl FakeScheduler {
        fn new() -> Self {
            Self {
                submitted: Vec::new(),
                fail_on: None,
            }
        }
    }

    impl JobScheduler for FakeScheduler {
        fn submit(&mut self, job: &MergeJob) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail_on.as_deref() == Some(job.output.as_path()) {
                return Err("queue rejected job".into());
            }
            self.submitted.push(job.clone());
            Ok(())
        }
    }

    fn parse(data: &str) -> SampleTable {
        SampleTable::from_reader(Cursor::new(data)).unwrap()
    }

    fn two_sample_combined() -> SampleTable {
        let b1 = parse("Sample,ForwardReads,ReverseReads\nS1,f1.fq.gz,r1.fq.gz\nS2,f1b.fq.gz,r1b.fq.gz\n");
        let b2 = parse("Sample,ForwardReads,ReverseReads\nS1,f2.fq.gz,r2.fq.gz\nS2,f2b.fq.gz,r2b.fq.gz\n");
        combine(&b1, &b2)
    }

    #[test]
    fn test_two_jobs_per_sample() {
        let plan = plan_merges(&two_sample_combined(), Path::new("merged"));
        assert_eq!(plan.jobs.len(), 4);
        assert!(plan.skipped.is_empty());

        assert_eq!(
            plan.jobs[0],
            MergeJob::new("f1.fq.gz", "f2.fq.gz", "merged/S1.R1.fq.gz")
        );
        assert_eq!(
            plan.jobs[1],
            MergeJob::new("r1.fq.gz", "r2.fq.gz", "merged/S1.R2.fq.gz")
        );
        assert_eq!(
            plan.jobs[3],
            MergeJob::new("r1b.fq.gz", "r2b.fq.gz", "merged/S2.R2.fq.gz")
        );
    }

    #[test]
    fn test_sample_missing_batch2_is_skipped() {
        let b1 = parse("Sample,ForwardReads,ReverseReads\nS1,f1,r1\nS2,f1b,r1b\n");
        let b2 = parse("Sample,ForwardReads,ReverseReads\nS1,f2,r2\n");
        let combined = combine(&b1, &b2);

        let plan = plan_merges(&combined, Path::new("merged"));
        assert_eq!(plan.jobs.len(), 2);
        assert_eq!(plan.skipped, vec!["S2".to_string()]);
        assert!(!plan.merged.contains_key("S2"));
    }

    #[test]
    fn test_dispatch_submits_all_jobs() {
        let plan = plan_merges(&two_sample_combined(), Path::new("merged"));
        let mut sched = FakeScheduler::new();
        let failures = dispatch(&plan, &mut sched);
        assert_eq!(failures, 0);
        assert_eq!(sched.submitted.len(), 4);
    }

    #[test]
    fn test_dispatch_continues_past_failures() {
        let plan = plan_merges(&two_sample_combined(), Path::new("merged"));
        let mut sched = FakeScheduler::new();
        sched.fail_on = Some(PathBuf::from("merged/S1.R2.fq.gz"));
        let failures = dispatch(&plan, &mut sched);
        assert_eq!(failures, 1);
        // The failed job did not stop the remaining submissions.
        assert_eq!(sched.submitted.len(), 3);
    }

    #[test]
    fn test_apply_merged_paths_overwrites_read_columns() {
        let mut combined = two_sample_combined();
        let plan = plan_merges(&combined, Path::new("merged"));
        apply_merged_paths(&mut combined, &plan);

        assert_eq!(combined.get("S1", FORWARD_READS), Some("merged/S1.R1.fq.gz"));
        assert_eq!(combined.get("S1", REVERSE_READS), Some("merged/S1.R2.fq.gz"));
        assert_eq!(combined.get("S2", FORWARD_READS), Some("merged/S2.R1.fq.gz"));
        // Batch-2 columns still hold the original inputs until emission drops them.
        assert_eq!(combined.get("S2", "ForwardReads_2"), Some("f2b.fq.gz"));
    }

    #[test]
    fn test_end_to_end_merge_workflow() {
        use crate::metadata::drop_batch2_read_columns;

        let dir = tempfile::tempdir().unwrap();
        let m1 = dir.path().join("metadata_1.csv");
        let m2 = dir.path().join("metadata_2.csv");
        std::fs::write(&m1, "Sample,ForwardReads,ReverseReads\nS1,f1.fq.gz,r1.fq.gz\nS2,f1b.fq.gz,r1b.fq.gz\n").unwrap();
        std::fs::write(&m2, "Sample,ForwardReads,ReverseReads\nS1,f2.fq.gz,r2.fq.gz\nS2,f2b.fq.gz,r2b.fq.gz\n").unwrap();

        let batch1 = SampleTable::read_csv(m1.to_str().unwrap()).unwrap();
        let batch2 = SampleTable::read_csv(m2.to_str().unwrap()).unwrap();
        let mut combined = combine(&batch1, &batch2);

        let plan = plan_merges(&combined, Path::new("merged"));
        let mut sched = FakeScheduler::new();
        assert_eq!(dispatch(&plan, &mut sched), 0);
        assert_eq!(sched.submitted.len(), 4);

        apply_merged_paths(&mut combined, &plan);
        drop_batch2_read_columns(&mut combined);

        let out = dir.path().join("metadata_out.csv");
        combined.write_csv(out.to_str().unwrap()).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(
            text,
            "Sample,ForwardReads,ReverseReads\n\
             S1,merged/S1.R1.fq.gz,merged/S1.R2.fq.gz\n\
             S2,merged/S2.R1.fq.gz,merged/S2.R2.fq.gz\n"
        );
    }

    #[test]
    fn test_skipped_sample_keeps_original_paths() {
        let b1 = parse("Sample,ForwardReads,ReverseReads\nS1,f1,r1\n");
        let b2 = parse("Sample,ForwardReads,ReverseReads\nSX,f2,r2\n");
        let mut combined = combine(&b1, &b2);

        let plan = plan_merges(&combined, Path::new("merged"));
        apply_merged_paths(&mut combined, &plan);
        assert_eq!(combined.get("S1", FORWARD_READS), Some("f1"));
    }
}
