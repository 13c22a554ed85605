//! Sample metadata tables for split sequencing runs.
//!
//! The genomics core splits deep runs across two deliveries, each with its
//! own metadata CSV. `combine` joins the two tables on the sample key so the
//! merge workflow can pair up read files from both batches.

use crate::table::SampleTable;

/// Path to the forward (R1) read file for a sample.
pub const FORWARD_READS: &str = "ForwardReads";
/// Path to the reverse (R2) read file for a sample.
pub const REVERSE_READS: &str = "ReverseReads";

/// Suffix appended to every batch-2 column in the combined table.
pub const BATCH2_SUFFIX: &str = "_2";

pub fn batch2_column(name: &str) -> String {
    format!("{}{}", name, BATCH2_SUFFIX)
}

/// Join two sample-keyed metadata tables into one wide table.
///
/// The result has one row per sample in `batch1`, carrying all of batch 1's
/// columns unchanged plus every `batch2` column renamed with a `_2` suffix.
/// A sample missing from `batch2` gets empty `_2` cells; callers decide
/// whether that is a problem.
pub fn combine(batch1: &SampleTable, batch2: &SampleTable) -> SampleTable {
    let mut columns: Vec<String> = batch1.columns().to_vec();
    columns.extend(batch2.columns().iter().map(|c| batch2_column(c)));

    let mut combined = SampleTable::new(columns);
    for sample in batch1.samples() {
        for col in batch1.columns() {
            let value = batch1.get(sample, col).unwrap_or("");
            combined.set(sample, col, value);
        }
        for col in batch2.columns() {
            let value = batch2.get(sample, col).unwrap_or("");
            combined.set(sample, &batch2_column(col), value);
        }
    }
    combined
}

/// Strip the batch-2 read-path columns before the combined table is emitted.
///
/// The emitted metadata should describe the merged files only; the `_2` read
/// paths are consumed by the merge jobs and have no meaning afterwards.
pub fn drop_batch2_read_columns(table: &mut SampleTable) {
    let fwd2 = batch2_column(FORWARD_READS);
    let rev2 = batch2_column(REVERSE_READS);
    table.drop_columns(&[fwd2.as_str(), rev2.as_str()]);
}
