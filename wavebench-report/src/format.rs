//! Unit formatting for terminal output

/// Format a millisecond duration with an appropriate unit (µs, ms, s)
pub fn format_duration_ms(ms: f64) -> String {
    if !ms.is_finite() {
        return "-".to_string();
    }
    if ms < 1.0 {
        format!("{:.1} µs", ms * 1000.0)
    } else if ms < 1000.0 {
        format!("{:.2} ms", ms)
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
}

/// Format a kilobyte count, `-` when unknown
pub fn format_memory_kb(kb: Option<u64>) -> String {
    match kb {
        None => "-".to_string(),
        Some(kb) if kb < 1024 => format!("{} KB", kb),
        Some(kb) if kb < 1024 * 1024 => format!("{:.1} MB", kb as f64 / 1024.0),
        Some(kb) => format!("{:.2} GB", kb as f64 / (1024.0 * 1024.0)),
    }
}

/// Format a byte count (file sizes)
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else if b < KB * KB * KB {
        format!("{:.1} MB", b / (KB * KB))
    } else {
        format!("{:.2} GB", b / (KB * KB * KB))
    }
}

/// Format MB/s, `-` when unavailable
pub fn format_throughput(mb_per_sec: Option<f64>) -> String {
    match mb_per_sec {
        Some(v) if v >= 100.0 => format!("{:.0} MB/s", v),
        Some(v) => format!("{:.1} MB/s", v),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_units() {
        assert_eq!(format_duration_ms(0.25), "250.0 µs");
        assert_eq!(format_duration_ms(2.333), "2.33 ms");
        assert_eq!(format_duration_ms(1500.0), "1.50 s");
        assert_eq!(format_duration_ms(f64::NAN), "-");
    }

    #[test]
    fn test_memory_units() {
        assert_eq!(format_memory_kb(None), "-");
        assert_eq!(format_memory_kb(Some(512)), "512 KB");
        assert_eq!(format_memory_kb(Some(2048)), "2.0 MB");
        assert_eq!(format_memory_kb(Some(3 * 1024 * 1024)), "3.00 GB");
    }

    #[test]
    fn test_bytes_and_throughput() {
        assert_eq!(format_bytes(100), "100 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10.0 MB");
        assert_eq!(format_throughput(Some(512.4)), "512 MB/s");
        assert_eq!(format_throughput(Some(12.34)), "12.3 MB/s");
        assert_eq!(format_throughput(None), "-");
    }
}
