//! Demultiplexing summary report parsing and reconciliation.
//!
//! Sequencer demux reports carry a few lines of run description before the
//! actual table, then one units/fluff row directly under the header. Counts
//! are locale-formatted ("1,234") and must be normalized before arithmetic.

use std::fs::File;
use std::io::{BufRead, BufReader};

use log::info;

use crate::table::SampleTable;

/// Leading non-data lines before the header in a demux report.
pub const DEFAULT_SKIP_ROWS: usize = 4;

/// Metric column summed by the read-count reconciliation.
pub const DEFAULT_COUNT_COLUMN: &str = "PF Clusters";

/// Read a demux report CSV: skip `skip_rows` leading lines, parse the header,
/// and drop the one fluff row immediately following it.
pub fn read_demux_report(
    path: &str,
    skip_rows: usize,
) -> Result<SampleTable, Box<dyn std::error::Error>> {
    let file = File::open(path).map_err(|e| {
        std::io::Error::other(format!("Error opening demux report {}: {}", path, e))
    })?;
    read_demux_from_reader(BufReader::new(file), skip_rows)
        .map_err(|e| format!("Error reading demux report {}: {}", path, e).into())
}

pub fn read_demux_from_reader<R: BufRead>(
    reader: R,
    skip_rows: usize,
) -> Result<SampleTable, Box<dyn std::error::Error>> {
    let mut lines = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if i < skip_rows {
            continue;
        }
        lines.push(line);
    }
    if lines.is_empty() {
        return Err(format!("No header found after skipping {} rows", skip_rows).into());
    }
    // Header stays, the fluff row under it goes.
    if lines.len() > 1 {
        lines.remove(1);
    }
    SampleTable::from_reader(lines.join("\n").as_bytes())
}

/// Verify that two tables list the same samples in the same order.
///
/// Returns the number of matched samples and logs a confirmation. A mismatch
/// is an error naming the first diverging row, so a silently reordered or
/// truncated report cannot slip through to the summed counts.
pub fn check_alignment(
    t1: &SampleTable,
    t2: &SampleTable,
) -> Result<usize, Box<dyn std::error::Error>> {
    let keys1: Vec<&str> = t1.samples().collect();
    let keys2: Vec<&str> = t2.samples().collect();

    if keys1.len() != keys2.len() {
        return Err(format!(
            "Reports list different sample counts: {} vs {}",
            keys1.len(),
            keys2.len()
        )
        .into());
    }
    for (i, (k1, k2)) in keys1.iter().zip(keys2.iter()).enumerate() {
        if k1 != k2 {
            return Err(format!(
                "Sample mismatch at row {}: '{}' vs '{}'",
                i + 1,
                k1,
                k2
            )
            .into());
        }
    }
    info!("Indexes are matched ({} samples)", keys1.len());
    Ok(keys1.len())
}

/// Normalize a locale-formatted count ("1,234") to a float.
pub fn parse_count(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let cleaned = value.trim().replace(',', "");
    cleaned
        .parse::<f64>()
        .map_err(|e| format!("Invalid count '{}': {}", value, e).into())
}

/// Per-sample sum of `column` across two aligned reports, in `t1` row order.
pub fn combined_counts(
    t1: &SampleTable,
    t2: &SampleTable,
    column: &str,
) -> Result<Vec<(String, f64)>, Box<dyn std::error::Error>> {
    let mut sums = Vec::with_capacity(t1.len());
    for sample in t1.samples() {
        let v1 = t1
            .get(sample, column)
            .ok_or_else(|| format!("Sample '{}' has no '{}' in report 1", sample, column))?;
        let v2 = t2
            .get(sample, column)
            .ok_or_else(|| format!("Sample '{}' has no '{}' in report 2", sample, column))?;
        let sum = parse_count(v1)
            .map_err(|e| format!("Sample '{}', report 1: {}", sample, e))?
            + parse_count(v2).map_err(|e| format!("Sample '{}', report 2: {}", sample, e))?;
        sums.push((sample.to_string(), sum));
    }
    Ok(sums)
}
