//! Run Metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wavebench_core::Scale;

/// Current store document schema
pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Metadata written at the head of every Result Store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMeta {
    /// Store layout version
    pub schema_version: u32,
    /// Harness version
    pub version: String,
    /// Run start (UTC)
    pub timestamp: DateTime<Utc>,
    /// Commit of the working tree, if any
    pub git_commit: Option<String>,
    /// Branch of the working tree, if any
    pub git_branch: Option<String>,
    /// Host description
    pub system: SystemInfo,
    /// Policy in effect
    pub run: RunSettings,
}

/// Host description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system family
    pub os: String,
    /// Kernel or OS release
    pub os_version: String,
    /// CPU architecture
    pub arch: String,
    /// CPU model string, "unknown" when unavailable
    pub cpu: String,
    /// Logical cores
    pub cpu_cores: u32,
    /// Total physical memory
    pub memory_gb: f64,
}

/// Policy in effect for the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Scales selected for the run
    pub scales: Vec<Scale>,
    /// Untimed runs per entry
    pub warmup: u32,
    /// Concurrent entries
    pub jobs: usize,
    /// Per-scale repetitions and timeouts
    pub policies: Vec<ScalePolicy>,
}

/// Repetition and timeout for one scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalePolicy {
    /// Scale the policy applies to
    pub scale: Scale,
    /// Timed repetitions
    pub repetitions: u32,
    /// Per-entry deadline in seconds
    pub timeout_secs: f64,
}

impl StoreMeta {
    /// Metadata with unknown host details, for stores built outside a run
    pub fn detached(version: impl Into<String>) -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION,
            version: version.into(),
            timestamp: Utc::now(),
            git_commit: None,
            git_branch: None,
            system: SystemInfo {
                os: std::env::consts::OS.to_string(),
                os_version: String::new(),
                arch: std::env::consts::ARCH.to_string(),
                cpu: "Unknown".to_string(),
                cpu_cores: 0,
                memory_gb: 0.0,
            },
            run: RunSettings {
                scales: Vec::new(),
                warmup: 0,
                jobs: 1,
                policies: Vec::new(),
            },
        }
    }
}
