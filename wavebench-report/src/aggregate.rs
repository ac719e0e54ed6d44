//! Aggregate Report Schema
//!
//! Derived view over a Result Store. Never persisted as ground truth; always
//! recomputed. Times are milliseconds, throughput MB/s, memory kilobytes.

use crate::record::{BenchmarkRecord, ErrorCategory, RecordStatus};
use crate::store::Coverage;
use serde::{Deserialize, Serialize};
use wavebench_core::{Format, Scale};
use wavebench_ipc::Operation;

/// Optional restriction applied before aggregation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateFilter {
    /// Keep only this scale
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Scale>,
    /// Keep only this format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Format>,
}

impl AggregateFilter {
    /// Whether a record passes every set restriction
    pub fn matches(&self, record: &BenchmarkRecord) -> bool {
        self.scale.is_none_or(|s| s == record.scale)
            && self.format.is_none_or(|f| f == record.format)
    }
}

/// Complete aggregate output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Filter the report was built with
    pub filter: AggregateFilter,
    /// One table per (operation, scale, format, file), in that order
    pub groups: Vec<GroupTable>,
    /// Cross-group ranking, fastest first
    pub overall: Vec<OverallRow>,
    /// Error and skipped records, sorted by (library, operation, file)
    pub failures: Vec<FailureRow>,
    /// Counts over the filtered records
    pub coverage: Coverage,
}

/// Comparison table for one (file, operation)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTable {
    /// Input file id
    pub file: String,
    /// Operation measured
    pub operation: Operation,
    /// Scale of the input
    pub scale: Scale,
    /// Format of the input
    pub format: Format,
    /// Input size used for throughput
    pub file_size_bytes: u64,
    /// Ordered by rank
    pub rows: Vec<GroupRow>,
}

/// One library's statistics within a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    /// Adapter name
    pub library: String,
    /// Adapter language
    pub language: String,
    /// Format of the input
    pub format: Format,
    /// Mean sample time in ms
    pub mean_time: f64,
    /// Sample standard deviation in ms; 0 for a single sample
    pub stdev: f64,
    /// Median sample time in ms
    pub median_time: f64,
    /// Fastest sample in ms
    pub min_time: f64,
    /// Slowest sample in ms
    pub max_time: f64,
    /// MB/s; `None` when the mean time is zero
    pub throughput: Option<f64>,
    /// Largest known peak memory in kB
    pub memory: Option<u64>,
    /// 1-based, ascending by mean time, ties by library name
    pub rank: usize,
    /// mean / fastest mean; exactly 1.0 for rank 1
    pub relative_factor: f64,
    /// Number of timed repetitions
    pub samples: usize,
}

/// Cross-group ranking entry for one library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallRow {
    /// Adapter name
    pub library: String,
    /// Adapter language
    pub language: String,
    /// Mean of the library's per-group mean times
    pub avg_time: f64,
    /// Distinct files with at least one measured record
    pub files_tested: usize,
    /// Number of groups contributing to `avg_time`
    pub groups_measured: usize,
    /// avg_time / best avg_time
    pub relative_factor: f64,
    /// 1-based, ties by library name
    pub rank: usize,
}

/// Non-measured record surfaced in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRow {
    /// Adapter name
    pub library: String,
    /// Operation attempted
    pub operation: Operation,
    /// Input file id
    pub file: String,
    /// `error` or `skipped`
    pub status: RecordStatus,
    /// Category for `error` records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorCategory>,
    /// Adapter message or skip reason
    pub error: String,
}

impl GroupTable {
    /// Row for a library, if it measured this group
    pub fn row(&self, library: &str) -> Option<&GroupRow> {
        self.rows.iter().find(|r| r.library == library)
    }
}

impl AggregateReport {
    /// Group for a (file, operation), if any library measured it
    pub fn group(&self, file: &str, operation: Operation) -> Option<&GroupTable> {
        self.groups
            .iter()
            .find(|g| g.file == file && g.operation == operation)
    }
}
