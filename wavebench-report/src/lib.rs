#![warn(missing_docs)]
//! Wavebench Report - Result Store and Aggregate Schemas
//!
//! - Result Store: the append-only record log, the harness's interchange format
//! - Aggregate report: derived per-group statistics, rankings and failures
//! - JSON output and unit formatting for terminal tables

mod aggregate;
mod format;
mod json;
mod meta;
mod record;
mod store;

pub use aggregate::{
    AggregateFilter, AggregateReport, FailureRow, GroupRow, GroupTable, OverallRow,
};
pub use format::{format_bytes, format_duration_ms, format_memory_kb, format_throughput};
pub use json::generate_json_report;
pub use meta::{RunSettings, STORE_SCHEMA_VERSION, ScalePolicy, StoreMeta, SystemInfo};
pub use record::{
    BenchmarkRecord, ErrorCategory, Outcome, RecordError, RecordKey, RecordStatus, SampleRecord,
};
pub use store::{Coverage, ResultStore, StoreError};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON aggregate report
    Json,
    /// Human-readable terminal tables
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
