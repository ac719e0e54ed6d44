//! Summary Statistics
//!
//! Every timed repetition counts: no outlier rejection happens here, because
//! the harness records all N samples and the reader decides what is noise.
//! Standard deviation is the sample standard deviation (N-1 denominator) and
//! is defined as 0 for a single sample.

use crate::percentiles::compute_percentile;

/// Summary of one sample sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStatistics {
    /// Arithmetic mean
    pub mean: f64,
    /// 50th percentile
    pub median: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    /// Fastest sample
    pub min: f64,
    /// Slowest sample
    pub max: f64,
    /// Number of samples
    pub sample_count: usize,
}

/// Compute summary statistics over all samples
pub fn compute_summary(samples: &[f64]) -> SummaryStatistics {
    if samples.is_empty() {
        return SummaryStatistics {
            mean: 0.0,
            median: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            sample_count: 0,
        };
    }

    let n = samples.len();
    let mean = samples.iter().sum::<f64>() / n as f64;

    let std_dev = if n < 2 {
        0.0
    } else {
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    };

    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    SummaryStatistics {
        mean,
        median: compute_percentile(samples, 50.0),
        std_dev,
        min,
        max,
        sample_count: n,
    }
}

impl SummaryStatistics {
    /// Coefficient of variation (relative stddev, percent)
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean == 0.0 {
            0.0
        } else {
            (self.std_dev / self.mean) * 100.0
        }
    }

    /// Check if distribution appears stable (low CV)
    pub fn is_stable(&self, cv_threshold: f64) -> bool {
        self.coefficient_of_variation() < cv_threshold
    }
}
