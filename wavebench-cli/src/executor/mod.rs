//! Benchmark Executor
//!
//! Runs the matrix, fills the Result Store and derives the aggregate view.
//!
//! ## Pipeline Overview
//!
//! ```text
//! MatrixPlan (planner)
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  One isolated adapter process per entry → ResultStore
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ statistics  │  Per-record summary stats (parallel)
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   report    │  Groups, ranks, overall table, failures
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Human-readable output
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Runs entries through the supervisor and records outcomes
//! - [`statistics`] - Parallel statistics computation
//! - [`report`] - Aggregation into the report schema
//! - [`formatting`] - Terminal tables
//! - [`metadata`] - Run and system metadata for the store

mod execution;
mod formatting;
mod metadata;
mod report;
mod statistics;

pub use execution::{ExecutionConfig, RunSummary, Runner};
pub use formatting::format_human_output;
pub use metadata::build_store_meta;
pub use report::build_aggregate;
pub use statistics::compute_statistics;
