//! Percentile Computation
//!
//! Linear interpolation between nearest ranks over the raw samples. Repetition
//! counts are small (2-10), so the interpolation matters more than speed.

/// Compute a single percentile (0-100) from samples
///
/// Returns 0.0 for an empty slice.
pub fn compute_percentile(samples: &[f64], percentile: f64) -> f64 {
    match samples {
        [] => 0.0,
        [only] => *only,
        _ => {
            let mut sorted = samples.to_vec();
            sorted.sort_by(f64::total_cmp);

            let n = sorted.len();
            let rank = (percentile.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower_idx = rank.floor() as usize;
            let upper_idx = (lower_idx + 1).min(n - 1);
            let fraction = rank - lower_idx as f64;

            sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
        }
    }
}
