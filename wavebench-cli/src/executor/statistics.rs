//! Statistics Computation
//!
//! Summary statistics for every measured record, computed in parallel with
//! Rayon. Records are independent, so the result order always matches the
//! input order regardless of scheduling.

use rayon::prelude::*;
use wavebench_report::BenchmarkRecord;
use wavebench_stats::{SummaryStatistics, compute_summary};

/// Statistics per record; `None` for records without samples
pub fn compute_statistics(records: &[&BenchmarkRecord]) -> Vec<Option<SummaryStatistics>> {
    records
        .par_iter()
        .map(|record| {
            let times = record.times_ms();
            (!times.is_empty()).then(|| compute_summary(&times))
        })
        .collect()
}
