//! Timing and Peak Memory
//!
//! Wall-clock timing around the operation boundary plus best-effort peak
//! resident set size. On Linux the high-water mark is reset before each timed
//! execution so every sample reports its own peak; elsewhere the process-lifetime
//! peak from `getrusage` is used.

use std::time::{Duration, Instant};

/// Timer for measuring one operation
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time since start
    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time in fractional milliseconds
    #[inline(always)]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

/// Reset the kernel's peak-RSS counter for this process.
///
/// Returns `false` when the platform or permissions do not allow it, in which
/// case [`peak_rss_kb`] reports the process-lifetime peak.
pub fn reset_peak_rss() -> bool {
    #[cfg(target_os = "linux")]
    {
        std::fs::write("/proc/self/clear_refs", "5").is_ok()
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

/// Peak resident set size in kilobytes, `None` when it cannot be obtained
pub fn peak_rss_kb() -> Option<u64> {
    proc_status_hwm_kb().or_else(rusage_max_rss_kb)
}

#[cfg(target_os = "linux")]
fn proc_status_hwm_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_status_kb(&status, "VmHWM:")
}

#[cfg(not(target_os = "linux"))]
fn proc_status_hwm_kb() -> Option<u64> {
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_status_kb(status: &str, key: &str) -> Option<u64> {
    status
        .lines()
        .find(|l| l.starts_with(key))
        .and_then(|l| l.split_whitespace().nth(1))
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|kb| *kb > 0)
}

#[cfg(unix)]
fn rusage_max_rss_kb() -> Option<u64> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if ret != 0 {
        return None;
    }
    let usage = unsafe { usage.assume_init() };
    let max_rss = u64::try_from(usage.ru_maxrss).ok()?;
    // macOS reports bytes, Linux reports kilobytes
    let kb = if cfg!(target_os = "macos") {
        max_rss / 1024
    } else {
        max_rss
    };
    (kb > 0).then_some(kb)
}

#[cfg(not(unix))]
fn rusage_max_rss_kb() -> Option<u64> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        let ms = timer.elapsed_ms();

        assert!(ms >= 5.0);
        assert!(ms < 1000.0);
    }

    #[test]
    fn test_parse_status() {
        let status = "Name:\tcat\nVmPeak:\t  10000 kB\nVmHWM:\t    2048 kB\nVmRSS:\t 1024 kB\n";
        assert_eq!(parse_status_kb(status, "VmHWM:"), Some(2048));
        assert_eq!(parse_status_kb(status, "VmSwap:"), None);
        assert_eq!(parse_status_kb("VmHWM:\t0 kB\n", "VmHWM:"), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_peak_rss_is_known_on_linux() {
        let kb = peak_rss_kb();
        assert!(kb.is_some_and(|kb| kb > 0));
    }
}
