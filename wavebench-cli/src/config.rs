//! Configuration loading from wavebench.toml
//!
//! The configuration is discovered by walking up from the current directory,
//! or given explicitly with `--config`. Relative paths inside it resolve
//! against the directory holding the file.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wavebench_core::{AdapterDescriptor, Format, Scale};

/// File name looked up during discovery
pub const CONFIG_FILE_NAME: &str = "wavebench.toml";

/// Wavebench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WavebenchConfig {
    /// Test data location
    #[serde(default)]
    pub data: DataConfig,
    /// Repetition, timeout and parallelism policy
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Where results go
    #[serde(default)]
    pub output: OutputConfig,
    /// Libraries under test, in declaration order
    #[serde(default, rename = "adapter")]
    pub adapters: Vec<AdapterDescriptor>,
    /// Explicit input files; replaces the naming convention when present
    #[serde(default, rename = "input")]
    pub inputs: Vec<InputDeclaration>,
    /// Directory relative paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Test data configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Root directory holding `bench_<scale>.<ext>` files
    #[serde(default = "default_data_dir")]
    pub directory: PathBuf,
    /// Formats expected for every scale
    #[serde(default = "default_formats")]
    pub formats: Vec<Format>,
    /// Also pick up `*_<scale>.<ext>` files next to the generated ones
    #[serde(default = "default_discover")]
    pub discover: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            directory: default_data_dir(),
            formats: default_formats(),
            discover: default_discover(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_formats() -> Vec<Format> {
    Format::ALL.to_vec()
}
fn default_discover() -> bool {
    true
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Untimed executions before measurement
    #[serde(default = "default_warmup")]
    pub warmup: u32,
    /// Entries executed concurrently (default 1)
    #[serde(default)]
    pub jobs: Option<usize>,
    /// Per-scale overrides
    #[serde(default)]
    pub scale: ScaleOverrides,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            warmup: default_warmup(),
            jobs: None,
            scale: ScaleOverrides::default(),
        }
    }
}

fn default_warmup() -> u32 {
    1
}

/// `[runner.scale.<scale>]` tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaleOverrides {
    /// `[runner.scale.small]`
    #[serde(default)]
    pub small: ScaleOverride,
    /// `[runner.scale.medium]`
    #[serde(default)]
    pub medium: ScaleOverride,
    /// `[runner.scale.large]`
    #[serde(default)]
    pub large: ScaleOverride,
}

impl ScaleOverrides {
    /// Override table for a scale
    pub fn get(&self, scale: Scale) -> &ScaleOverride {
        match scale {
            Scale::Small => &self.small,
            Scale::Medium => &self.medium,
            Scale::Large => &self.large,
        }
    }
}

/// Repetition/timeout override for one scale
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaleOverride {
    /// Timed repetitions
    #[serde(default)]
    pub repetitions: Option<u32>,
    /// Per-entry ceiling (e.g. "90s", "5m")
    #[serde(default)]
    pub timeout: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for the result store
    #[serde(default = "default_output_dir")]
    pub directory: PathBuf,
    /// Terminal output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            format: default_format(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}
fn default_format() -> String {
    "human".to_string()
}

/// An explicitly listed input file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDeclaration {
    /// File path, relative to the config file
    pub path: PathBuf,
    /// Record identifier; defaults to the file name
    #[serde(default)]
    pub id: Option<String>,
    /// Inferred from the extension when absent
    #[serde(default)]
    pub format: Option<Format>,
    /// Inferred from a `_<scale>` stem suffix when absent
    #[serde(default)]
    pub scale: Option<Scale>,
}

/// Effective repetition and timeout for one scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryPolicy {
    /// Timed repetitions after warm-up
    pub repetitions: u32,
    /// Ceiling for the whole entry
    pub timeout: Duration,
}

impl WavebenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config: Self =
            toml::from_str(&content).map_err(|source| ConfigurationError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// Find `wavebench.toml` by walking up from the current directory.
    ///
    /// A file that exists but fails to parse is an error, not "no config".
    pub fn discover() -> Result<Option<(PathBuf, Self)>, ConfigurationError> {
        let Ok(mut dir) = std::env::current_dir() else {
            return Ok(None);
        };
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                let config = Self::load(&config_path)?;
                return Ok(Some((config_path, config)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Resolve a configured path against the configuration's directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || self.base_dir.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Data root after path resolution
    pub fn data_dir(&self) -> PathBuf {
        self.resolve_path(&self.data.directory)
    }

    /// Adapters with path-like commands and working directories resolved.
    ///
    /// Bare command names (`python3`) are left for `PATH` lookup; adapters
    /// without a working directory run in the configuration's directory.
    pub fn resolved_adapters(&self) -> Vec<AdapterDescriptor> {
        self.adapters
            .iter()
            .cloned()
            .map(|mut adapter| {
                let invocation = &mut adapter.invocation;
                if invocation.command.contains(std::path::MAIN_SEPARATOR) {
                    invocation.command = self
                        .resolve_path(Path::new(&invocation.command))
                        .to_string_lossy()
                        .into_owned();
                }
                invocation.working_dir = match invocation.working_dir.take() {
                    Some(dir) => Some(self.resolve_path(&dir)),
                    None if !self.base_dir.as_os_str().is_empty() => Some(self.base_dir.clone()),
                    None => None,
                };
                adapter
            })
            .collect()
    }

    /// Repetitions and timeout for a scale: config override, else scale default
    pub fn policy_for(&self, scale: Scale) -> Result<EntryPolicy, ConfigurationError> {
        let overrides = self.runner.scale.get(scale);
        let repetitions = overrides
            .repetitions
            .unwrap_or_else(|| scale.default_repetitions());
        if repetitions == 0 {
            return Err(ConfigurationError::InvalidValue(format!(
                "runner.scale.{}.repetitions must be at least 1",
                scale
            )));
        }
        let timeout = match overrides.timeout.as_deref() {
            Some(value) => Self::parse_duration(value)?,
            None => scale.default_timeout(),
        };
        if timeout.is_zero() {
            return Err(ConfigurationError::InvalidValue(format!(
                "runner.scale.{}.timeout must be positive",
                scale
            )));
        }
        Ok(EntryPolicy {
            repetitions,
            timeout,
        })
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# Wavebench Configuration

[data]
# Directory holding bench_<scale>.vcd / bench_<scale>.fst
# (files may also live in data/<scale>/)
directory = "data"
formats = ["vcd", "fst"]
# Also benchmark *_<scale>.vcd / *_<scale>.fst files found next to them
discover = true

[runner]
# Untimed executions before measurement
warmup = 1
# Entries run concurrently; values above 1 may contaminate measurements
# jobs = 1

[runner.scale.small]
repetitions = 5
timeout = "60s"

[runner.scale.medium]
repetitions = 3
timeout = "120s"

[runner.scale.large]
repetitions = 2
timeout = "300s"

[output]
# Result store location
directory = "results"
# Terminal output: human or json
format = "human"

# One table per library under test.
[[adapter]]
name = "vcd-scan"
language = "rust"
formats = ["vcd"]
command = "wavebench-vcd-scan"

# [[adapter]]
# name = "pywellen"
# language = "python"
# formats = ["vcd", "fst"]
# command = ".venv/bin/python"
# args = ["adapters/python/bench_pywellen.py"]
# shared_host = true
# enabled = false
# reason = "virtualenv not provisioned"

# Explicit inputs replace the bench_<scale> naming convention.
# [[input]]
# path = "data/captures/cpu_trace_medium.vcd"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "60s", "500ms", "2m")
    pub fn parse_duration(s: &str) -> Result<Duration, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidDuration {
            value: s.to_string(),
            reason,
        };
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty duration".to_string()));
        }

        // Unit is the trailing alphabetic suffix so "1e3s" keeps its exponent
        let split = trimmed.trim_end_matches(|c: char| c.is_alphabetic()).len();
        let (num_part, unit_part) = match trimmed.split_at(split) {
            (num, "") => (num, "s"),
            parts => parts,
        };

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| invalid(format!("invalid number '{}'", num_part)))?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid("must be a non-negative number".to_string()));
        }

        let seconds_per_unit = match unit_part.to_lowercase().as_str() {
            "ms" => 0.001,
            "s" | "sec" => 1.0,
            "m" | "min" => 60.0,
            "h" => 3600.0,
            other => return Err(invalid(format!("unknown unit '{}'", other))),
        };

        Duration::try_from_secs_f64(value * seconds_per_unit)
            .map_err(|_| invalid("duration out of range".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WavebenchConfig::default();
        assert_eq!(config.runner.warmup, 1);
        assert!(config.runner.jobs.is_none());
        assert_eq!(config.data.formats, vec![Format::Vcd, Format::Fst]);
        assert!(config.adapters.is_empty());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(
            WavebenchConfig::parse_duration("60s").unwrap(),
            Duration::from_secs(60)
        );
        assert_eq!(
            WavebenchConfig::parse_duration("500ms").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(
            WavebenchConfig::parse_duration("2m").unwrap(),
            Duration::from_secs(120)
        );
        assert_eq!(
            WavebenchConfig::parse_duration("1.5s").unwrap(),
            Duration::from_millis(1500)
        );
        assert_eq!(
            WavebenchConfig::parse_duration("90").unwrap(),
            Duration::from_secs(90)
        );
        assert!(WavebenchConfig::parse_duration("").is_err());
        assert!(WavebenchConfig::parse_duration("3 fortnights").is_err());
        assert!(WavebenchConfig::parse_duration("-1s").is_err());
    }

    #[test]
    fn test_parse_duration_exponent_and_overflow() {
        assert_eq!(
            WavebenchConfig::parse_duration("1e3s").unwrap(),
            Duration::from_secs(1000)
        );
        assert_eq!(
            WavebenchConfig::parse_duration("2.5e2ms").unwrap(),
            Duration::from_millis(250)
        );

        let err = WavebenchConfig::parse_duration("99999999999999999999999h").unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidDuration { .. }));
        assert!(err.to_string().contains("out of range"), "{}", err);

        let config: WavebenchConfig = toml::from_str(
            r#"
            [runner.scale.small]
            timeout = "99999999999999999999999h"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.policy_for(Scale::Small),
            Err(ConfigurationError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_policy_defaults_and_overrides() {
        let config: WavebenchConfig = toml::from_str(
            r#"
            [runner.scale.medium]
            repetitions = 7

            [runner.scale.large]
            timeout = "10m"
            "#,
        )
        .unwrap();

        let small = config.policy_for(Scale::Small).unwrap();
        assert_eq!(small.repetitions, 5);
        assert_eq!(small.timeout, Duration::from_secs(60));

        let medium = config.policy_for(Scale::Medium).unwrap();
        assert_eq!(medium.repetitions, 7);
        assert_eq!(medium.timeout, Duration::from_secs(120));

        let large = config.policy_for(Scale::Large).unwrap();
        assert_eq!(large.repetitions, 2);
        assert_eq!(large.timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        let config: WavebenchConfig = toml::from_str(
            r#"
            [runner.scale.small]
            repetitions = 0
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.policy_for(Scale::Small),
            Err(ConfigurationError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_parse_adapters_and_inputs() {
        let config: WavebenchConfig = toml::from_str(
            r#"
            [[adapter]]
            name = "wellen"
            language = "rust"
            formats = ["vcd", "fst"]
            command = "target/release/bench-wellen"

            [[adapter]]
            name = "vcdvcd"
            language = "python"
            formats = ["vcd"]
            command = "python3"
            args = ["bench_vcdvcd.py"]
            enabled = false
            reason = "virtualenv missing"

            [[input]]
            path = "captures/cpu_medium.vcd"
            "#,
        )
        .unwrap();

        assert_eq!(config.adapters.len(), 2);
        assert_eq!(config.adapters[0].name, "wellen");
        assert!(!config.adapters[1].enabled);
        assert_eq!(config.inputs.len(), 1);
        assert!(config.inputs[0].format.is_none());
        assert_eq!(config.output.format, "human");
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[data]\ndirectory = \"fixtures\"\n").unwrap();

        let config = WavebenchConfig::load(&path).unwrap();
        assert_eq!(config.data_dir(), dir.path().join("fixtures"));
        assert_eq!(
            config.resolve_path(Path::new("/abs/file.vcd")),
            PathBuf::from("/abs/file.vcd")
        );
    }

    #[test]
    fn test_adapter_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
[[adapter]]
name = "local"
language = "rust"
formats = ["vcd"]
command = "bin/bench-local"

[[adapter]]
name = "system"
language = "python"
formats = ["vcd"]
command = "python3"
working_dir = "adapters"
"#,
        )
        .unwrap();

        let config = WavebenchConfig::load(&path).unwrap();
        let adapters = config.resolved_adapters();
        assert_eq!(
            PathBuf::from(&adapters[0].invocation.command),
            dir.path().join("bin/bench-local")
        );
        assert_eq!(adapters[0].invocation.working_dir, Some(dir.path().to_path_buf()));
        assert_eq!(adapters[1].invocation.command, "python3");
        assert_eq!(
            adapters[1].invocation.working_dir,
            Some(dir.path().join("adapters"))
        );
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[runner]\nwarmup = \"many\"\n").unwrap();
        assert!(matches!(
            WavebenchConfig::load(&path),
            Err(ConfigurationError::Parse { .. })
        ));
    }

    #[test]
    fn test_default_toml_parses() {
        let config: WavebenchConfig = toml::from_str(&WavebenchConfig::default_toml()).unwrap();
        assert_eq!(config.runner.warmup, 1);
        assert_eq!(config.adapters.len(), 1);
        assert_eq!(config.adapters[0].name, "vcd-scan");
        assert_eq!(config.policy_for(Scale::Large).unwrap().repetitions, 2);
    }
}
