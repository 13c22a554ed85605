use clap::Parser;
use log::error;

use seqmerge::demux::{
    check_alignment, combined_counts, read_demux_report, DEFAULT_COUNT_COLUMN, DEFAULT_SKIP_ROWS,
};
use seqmerge::logging::{self, LogLevel};
use seqmerge::stats::describe;

#[derive(Parser)]
#[command(name = "read_counts")]
#[command(about = "Sum per-sample read counts across two demultiplexing reports")]
struct Cli {
    /// Demux report CSV for the first run
    report_1: String,
    /// Demux report CSV for the second run
    report_2: String,
    /// Count column to sum across the two reports
    #[arg(long, default_value = DEFAULT_COUNT_COLUMN)]
    column: String,
    /// Leading non-data rows to skip before the header
    #[arg(long, default_value_t = DEFAULT_SKIP_ROWS)]
    skip_rows: usize,
    /// Print the summary as JSON instead of a text block
    #[arg(long)]
    json: bool,
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

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let report_1 = read_demux_report(&cli.report_1, cli.skip_rows)?;
    let report_2 = read_demux_report(&cli.report_2, cli.skip_rows)?;

    let aligned = report_2.align_to(report_1.samples());
    check_alignment(&report_1, &aligned)?;

    let sums = combined_counts(&report_1, &aligned, &cli.column)?;
    let values: Vec<f64> = sums.iter().map(|(_, v)| *v).collect();

    let summary = describe(&values)
        .ok_or_else(|| format!("No samples found in {}", cli.report_1))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_file.as_deref(), cli.append_log);

    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}
