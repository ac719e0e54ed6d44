//! System Metadata Collection
//!
//! Collects the host and run details written at the head of every Result
//! Store. Linux-specific data (CPU model, memory) degrades to "Unknown" or 0
//! on other platforms.

use super::execution::ExecutionConfig;
use chrono::Utc;
use wavebench_core::Scale;
use wavebench_report::{RunSettings, STORE_SCHEMA_VERSION, ScalePolicy, StoreMeta, SystemInfo};

/// Build store metadata for a run over `scales`
pub fn build_store_meta(scales: &[Scale], config: &ExecutionConfig) -> StoreMeta {
    let git_commit = git(&["rev-parse", "HEAD"]);
    let git_branch = git(&["rev-parse", "--abbrev-ref", "HEAD"]);

    let system = SystemInfo {
        os: std::env::consts::OS.to_string(),
        os_version: get_os_version().unwrap_or_default(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: get_cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: num_cpus(),
        memory_gb: get_memory_gb().unwrap_or(0.0),
    };

    let policies = scales
        .iter()
        .map(|&scale| {
            let policy = config.policy(scale);
            ScalePolicy {
                scale,
                repetitions: policy.repetitions,
                timeout_secs: policy.timeout.as_secs_f64(),
            }
        })
        .collect();

    StoreMeta {
        schema_version: STORE_SCHEMA_VERSION,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        git_commit,
        git_branch,
        system,
        run: RunSettings {
            scales: scales.to_vec(),
            warmup: config.warmup,
            jobs: config.jobs,
            policies,
        },
    }
}

fn git(args: &[&str]) -> Option<String> {
    std::process::Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Kernel release from /proc (Linux only)
fn get_os_version() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/sys/kernel/osrelease")
            .ok()
            .map(|s| s.trim().to_string())
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Get CPU model name from /proc/cpuinfo (Linux only)
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// Get total system memory in GB (Linux only)
fn get_memory_gb() -> Option<f64> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("MemTotal"))
                    .and_then(|l| {
                        l.split_whitespace()
                            .nth(1)
                            .and_then(|s| s.parse::<u64>().ok())
                    })
                    .map(|kb| kb as f64 / 1024.0 / 1024.0)
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_records_policy_per_scale() {
        let config = ExecutionConfig::default();
        let meta = build_store_meta(&[Scale::Small, Scale::Large], &config);

        assert_eq!(meta.schema_version, STORE_SCHEMA_VERSION);
        assert_eq!(meta.run.scales, vec![Scale::Small, Scale::Large]);
        assert_eq!(meta.run.policies.len(), 2);
        assert_eq!(meta.run.policies[0].repetitions, 5);
        assert_eq!(meta.run.policies[1].timeout_secs, 300.0);
        assert!(meta.system.cpu_cores >= 1);
    }
}
