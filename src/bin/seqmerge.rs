use std::path::Path;

use clap::Parser;
use log::{error, info, warn};

use seqmerge::logging::{self, LogLevel};
use seqmerge::merge::{apply_merged_paths, dispatch, plan_merges};
use seqmerge::metadata::{combine, drop_batch2_read_columns};
use seqmerge::scheduler::{
    DryRunScheduler, JobScheduler, SbatchScheduler, DEFAULT_CONCAT_SCRIPT, DEFAULT_SUBMIT_COMMAND,
};
use seqmerge::table::SampleTable;

#[derive(Parser)]
#[command(name = "seqmerge")]
#[command(
    about = "Concatenate split sequencing data",
    long_about = "Deep sequencing runs are sometimes delivered split across two sets of files \
        (e.g., 50M reads in one file, 50M reads in another). This program submits cluster jobs \
        to combine each sample's pair of FASTQs into one, and rewrites the sample metadata to \
        point at the merged files."
)]
struct Cli {
    /// Metadata CSV for the first delivery (must have a 'Sample' column).
    #[arg(long = "metadata_1", visible_alias = "m1", required = true)]
    metadata_1: String,
    /// Metadata CSV for the second delivery.
    #[arg(long = "metadata_2", visible_alias = "m2", required = true)]
    metadata_2: String,
    /// Destination path for the combined metadata CSV.
    #[arg(long = "metadata_output", visible_alias = "mo", required = true)]
    metadata_output: String,
    /// Directory where merged FASTQs will be written by the cluster jobs.
    #[arg(short = 'o', long = "output_directory", required = true)]
    output_directory: String,
    /// Batch scheduler submission command.
    #[arg(long, default_value = DEFAULT_SUBMIT_COMMAND)]
    submit_command: String,
    /// Concatenation job script handed to the scheduler.
    #[arg(long, default_value = DEFAULT_CONCAT_SCRIPT)]
    concat_script: String,
    /// Log the jobs that would be submitted without submitting them.
    #[arg(long)]
    dry_run: bool,
    /// Log verbosity level
    #[arg(long, default_value = "info")]
    log_level: LogLevel,
    /// Write log output to a file instead of stderr
    #[arg(long)]
    log_file: Option<String>,
    /// Append to log file instead of truncating
    #[arg(long)]
    append_log: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_file.as_deref(), cli.append_log);

    let metadata_1 = match SampleTable::read_csv(&cli.metadata_1) {
        Ok(t) => t,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let metadata_2 = match SampleTable::read_csv(&cli.metadata_2) {
        Ok(t) => t,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Loaded {} samples from {} and {} from {}",
        metadata_1.len(),
        cli.metadata_1,
        metadata_2.len(),
        cli.metadata_2
    );

    let mut combined = combine(&metadata_1, &metadata_2);

    let plan = plan_merges(&combined, Path::new(&cli.output_directory));
    if !plan.skipped.is_empty() {
        warn!(
            "{} of {} samples had incomplete read paths and were not merged",
            plan.skipped.len(),
            combined.len()
        );
    }

    let failures = if cli.dry_run {
        let mut scheduler =
            DryRunScheduler::new(&cli.submit_command, Path::new(&cli.concat_script));
        dispatch(&plan, &mut scheduler)
    } else {
        let mut scheduler: Box<dyn JobScheduler> = Box::new(SbatchScheduler::new(
            &cli.submit_command,
            Path::new(&cli.concat_script),
        ));
        dispatch(&plan, scheduler.as_mut())
    };

    apply_merged_paths(&mut combined, &plan);
    drop_batch2_read_columns(&mut combined);

    if let Err(e) = combined.write_csv(&cli.metadata_output) {
        error!("Error writing metadata: {}", e);
        std::process::exit(1);
    }
    info!("Combined metadata written to {}", cli.metadata_output);

    if failures > 0 {
        error!("{} job submissions failed", failures);
        std::process::exit(1);
    }
}
