//! Utilities for a sequencing core's split-run handling:
//!
//! - merging per-sample metadata from two run deliveries and submitting
//!   concatenation jobs to the cluster queue (`seqmerge` binary);
//! - reconciling per-sample read counts across two demultiplexing reports
//!   (`read_counts` binary).

pub mod demux;
pub mod logging;
pub mod merge;
pub mod metadata;
pub mod scheduler;
pub mod stats;
pub mod table;
