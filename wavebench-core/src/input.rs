//! Input Files and Scales
//!
//! Test data is produced outside the harness. Only the naming contract matters:
//! `bench_<scale>.<ext>` for generated files, `<anything>_<scale>.<ext>` for
//! extra (e.g. real-world) captures.

use crate::descriptor::Format;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Input-file size tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// ~50 signals, ~1k time steps
    Small,
    /// ~200 signals, ~10k time steps
    Medium,
    /// ~2000 signals, ~200k time steps
    Large,
}

impl Scale {
    /// All scales, smallest first
    pub const ALL: [Scale; 3] = [Scale::Small, Scale::Medium, Scale::Large];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Small => "small",
            Scale::Medium => "medium",
            Scale::Large => "large",
        }
    }

    /// Timed repetitions per entry when not configured.
    /// Larger files get fewer repetitions to bound suite duration.
    pub fn default_repetitions(&self) -> u32 {
        match self {
            Scale::Small => 5,
            Scale::Medium => 3,
            Scale::Large => 2,
        }
    }

    /// Per-entry timeout ceiling when not configured
    pub fn default_timeout(&self) -> Duration {
        match self {
            Scale::Small => Duration::from_secs(60),
            Scale::Medium => Duration::from_secs(120),
            Scale::Large => Duration::from_secs(300),
        }
    }

    /// Scale encoded as the `_<scale>` suffix of a file stem
    pub fn from_stem(stem: &str) -> Option<Scale> {
        Scale::ALL
            .into_iter()
            .find(|s| stem.strip_suffix(s.as_str()).is_some_and(|rest| rest.ends_with('_')))
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(Scale::Small),
            "medium" => Ok(Scale::Medium),
            "large" => Ok(Scale::Large),
            other => Err(format!("Unknown scale: {}", other)),
        }
    }
}

/// File name of the generated benchmark file for a scale and format
pub fn conventional_file_name(scale: Scale, format: Format) -> String {
    format!("bench_{}.{}", scale, format.as_str())
}

/// A declared input file; may not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    /// Identifier used in records (the file name unless overridden)
    pub id: String,
    /// Location on disk
    pub path: PathBuf,
    /// Encoding
    pub format: Format,
    /// Size tier
    pub scale: Scale,
}

impl InputSpec {
    /// Declare an input identified by its file name
    pub fn new(path: impl Into<PathBuf>, format: Format, scale: Scale) -> Self {
        let path = path.into();
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id,
            path,
            format,
            scale,
        }
    }

    /// Stat the file and capture its size
    pub fn probe(&self) -> std::io::Result<InputFile> {
        let metadata = std::fs::metadata(&self.path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", self.path.display()),
            ));
        }
        Ok(InputFile {
            id: self.id.clone(),
            path: self.path.clone(),
            format: self.format,
            scale: self.scale,
            size_bytes: metadata.len(),
        })
    }
}

/// An input file known to exist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    /// Identifier used in records
    pub id: String,
    /// Location on disk
    pub path: PathBuf,
    /// Encoding
    pub format: Format,
    /// Size tier
    pub scale: Scale,
    /// Size at plan time
    pub size_bytes: u64,
}

impl InputFile {
    /// Path handed to adapters; absolute so the adapter's working directory does not matter
    pub fn absolute_path(&self) -> PathBuf {
        std::path::absolute(&self.path).unwrap_or_else(|_| self.path.clone())
    }
}

/// Directory holding the files for one scale: `<root>/<scale>` when present, else `<root>`
pub fn scale_directory(root: &Path, scale: Scale) -> PathBuf {
    let nested = root.join(scale.as_str());
    if nested.is_dir() { nested } else { root.to_path_buf() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_from_stem() {
        assert_eq!(Scale::from_stem("bench_small"), Some(Scale::Small));
        assert_eq!(Scale::from_stem("real_world_medium"), Some(Scale::Medium));
        assert_eq!(Scale::from_stem("large"), None);
        assert_eq!(Scale::from_stem("bench_larger"), None);
        assert_eq!(Scale::from_stem("verylarge"), None);
    }

    #[test]
    fn test_repetitions_decrease_with_scale() {
        assert!(Scale::Small.default_repetitions() > Scale::Medium.default_repetitions());
        assert!(Scale::Medium.default_repetitions() > Scale::Large.default_repetitions());
        assert!(Scale::Large.default_repetitions() >= 1);
        assert!(Scale::Small.default_timeout() < Scale::Large.default_timeout());
    }

    #[test]
    fn test_conventional_name() {
        assert_eq!(
            conventional_file_name(Scale::Medium, Format::Fst),
            "bench_medium.fst"
        );
    }

    #[test]
    fn test_probe() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench_small.vcd");
        std::fs::write(&path, b"$enddefinitions $end\n").unwrap();

        let spec = InputSpec::new(&path, Format::Vcd, Scale::Small);
        assert_eq!(spec.id, "bench_small.vcd");
        let file = spec.probe().unwrap();
        assert_eq!(file.size_bytes, 21);

        let missing = InputSpec::new(dir.path().join("bench_small.fst"), Format::Fst, Scale::Small);
        assert!(missing.probe().is_err());

        let directory = InputSpec::new(dir.path(), Format::Vcd, Scale::Small);
        assert!(directory.probe().is_err());
    }

    #[test]
    fn test_scale_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(scale_directory(dir.path(), Scale::Large), dir.path());

        std::fs::create_dir(dir.path().join("large")).unwrap();
        assert_eq!(
            scale_directory(dir.path(), Scale::Large),
            dir.path().join("large")
        );
    }
}
