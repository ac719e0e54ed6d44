//! Throughput
//!
//! Input bytes processed per second of mean operation time, in MB/s
//! (1 MB = 1024 × 1024 bytes).

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Throughput in MB/s, `None` when the mean time is not positive
pub fn throughput_mb_per_sec(size_bytes: u64, mean_time_ms: f64) -> Option<f64> {
    if !mean_time_ms.is_finite() || mean_time_ms <= 0.0 {
        return None;
    }
    let seconds = mean_time_ms / 1000.0;
    Some((size_bytes as f64 / BYTES_PER_MB) / seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_mb_per_second() {
        let t = throughput_mb_per_sec(1024 * 1024, 1000.0).unwrap();
        assert!((t - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_scales_with_time() {
        let fast = throughput_mb_per_sec(20 * 1024 * 1024, 100.0).unwrap();
        let slow = throughput_mb_per_sec(20 * 1024 * 1024, 1000.0).unwrap();
        assert!((fast - 200.0).abs() < 1e-9);
        assert!((slow - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_positive_time() {
        assert_eq!(throughput_mb_per_sec(100, 0.0), None);
        assert_eq!(throughput_mb_per_sec(100, -1.0), None);
        assert_eq!(throughput_mb_per_sec(100, f64::NAN), None);
    }
}
