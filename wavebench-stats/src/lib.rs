#![warn(missing_docs)]
//! Wavebench Statistical Engine
//!
//! Pure functions over raw timing samples:
//! - Summary statistics (mean, sample stdev, median, extremes)
//! - Percentiles by linear interpolation
//! - Ascending ranking with deterministic tie-breaks and relative factors
//! - Throughput in MB/s

mod percentiles;
mod ranking;
mod summary;
mod throughput;

pub use percentiles::compute_percentile;
pub use ranking::{MIN_RESOLVABLE_MS, RankPosition, rank_ascending};
pub use summary::{SummaryStatistics, compute_summary};
pub use throughput::throughput_mb_per_sec;
