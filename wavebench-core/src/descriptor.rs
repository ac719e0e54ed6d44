//! Adapter Descriptors
//!
//! Static metadata for each library-under-test, loaded from `[[adapter]]`
//! tables at startup and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use wavebench_ipc::Operation;

/// Waveform file encoding
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Value Change Dump (text)
    Vcd,
    /// Fast Signal Trace (binary, compressed)
    Fst,
}

impl Format {
    /// All formats in canonical order
    pub const ALL: [Format; 2] = [Format::Vcd, Format::Fst];

    /// Lowercase name, also the file extension
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Vcd => "vcd",
            Format::Fst => "fst",
        }
    }

    /// Uppercase label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Format::Vcd => "VCD",
            Format::Fst => "FST",
        }
    }

    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Format::ALL.into_iter().find(|f| f.as_str() == ext)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vcd" => Ok(Format::Vcd),
            "fst" => Ok(Format::Fst),
            other => Err(format!("Unknown format: {}", other)),
        }
    }
}

/// Read/write support declared by an adapter
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Can load files
    Read,
    /// Can produce files
    Write,
}

/// Capability an operation needs from the adapter
pub fn required_capability(operation: Operation) -> Capability {
    match operation {
        Operation::FullParse
        | Operation::SignalList
        | Operation::TimeRange
        | Operation::ValueQuery
        | Operation::Pipeline => Capability::Read,
    }
}

/// How to start an adapter process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Executable (looked up on `PATH` when not a path)
    pub command: String,
    /// Extra arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Working directory for the process
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Errors found while validating a descriptor
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// `name` is blank
    #[error("adapter name must not be empty")]
    EmptyName,

    /// `command` is blank
    #[error("adapter '{0}' has an empty command")]
    EmptyCommand(String),

    /// `formats` is empty
    #[error("adapter '{0}' declares no formats")]
    NoFormats(String),

    /// `operations` is empty
    #[error("adapter '{0}' declares no operations")]
    NoOperations(String),

    /// Disabled adapters must say why
    #[error("adapter '{0}' is disabled without a reason")]
    MissingReason(String),
}

/// Static metadata for one library-under-test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterDescriptor {
    /// Library name, unique within a configuration
    pub name: String,
    /// Implementation language/runtime
    pub language: String,
    /// Supported file formats
    pub formats: BTreeSet<Format>,
    /// Read/write support
    #[serde(default = "default_capabilities")]
    pub capabilities: BTreeSet<Capability>,
    /// Operations the adapter implements
    #[serde(default = "default_operations")]
    pub operations: Vec<Operation>,
    /// Process to start
    #[serde(flatten)]
    pub invocation: Invocation,
    /// Disabled adapters are planned but recorded as skipped
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Why the adapter is disabled
    #[serde(default)]
    pub reason: Option<String>,
    /// The library shares a host runtime with other libraries, so its memory
    /// figures cannot be attributed and are recorded as unknown
    #[serde(default)]
    pub shared_host: bool,
}

fn default_capabilities() -> BTreeSet<Capability> {
    BTreeSet::from([Capability::Read])
}
fn default_operations() -> Vec<Operation> {
    Operation::ALL.to_vec()
}
fn default_enabled() -> bool {
    true
}

impl AdapterDescriptor {
    /// Create an enabled read-only descriptor for all operations
    pub fn new(
        name: impl Into<String>,
        language: impl Into<String>,
        formats: impl IntoIterator<Item = Format>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
            formats: formats.into_iter().collect(),
            capabilities: default_capabilities(),
            operations: default_operations(),
            invocation: Invocation {
                command: command.into(),
                args: Vec::new(),
                env: BTreeMap::new(),
                working_dir: None,
            },
            enabled: true,
            reason: None,
            shared_host: false,
        }
    }

    /// Builder: set process arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.invocation.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: restrict the implemented operations
    pub fn with_operations(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations = operations.into_iter().collect();
        self
    }

    /// Builder: mark the adapter as disabled
    pub fn disabled(mut self, reason: impl Into<String>) -> Self {
        self.enabled = false;
        self.reason = Some(reason.into());
        self
    }

    /// Whether the adapter reads this format
    pub fn supports_format(&self, format: Format) -> bool {
        self.formats.contains(&format)
    }

    /// Whether the adapter implements this operation and has the capability it needs
    pub fn supports_operation(&self, operation: Operation) -> bool {
        self.capabilities.contains(&required_capability(operation))
            && self.operations.contains(&operation)
    }

    /// Check that the descriptor can be planned
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.name.trim().is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        if self.invocation.command.trim().is_empty() {
            return Err(DescriptorError::EmptyCommand(self.name.clone()));
        }
        if self.formats.is_empty() {
            return Err(DescriptorError::NoFormats(self.name.clone()));
        }
        if self.operations.is_empty() {
            return Err(DescriptorError::NoOperations(self.name.clone()));
        }
        if !self.enabled && self.reason.as_deref().is_none_or(|r| r.trim().is_empty()) {
            return Err(DescriptorError::MissingReason(self.name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Doc {
        adapter: Vec<AdapterDescriptor>,
    }

    #[test]
    fn test_parse_descriptor_defaults() {
        let doc: Doc = toml::from_str(
            r#"
            [[adapter]]
            name = "vcdvcd"
            language = "python"
            formats = ["vcd"]
            command = "python3"
            args = ["adapters/python/bench_vcdvcd.py"]
            "#,
        )
        .unwrap();

        let adapter = &doc.adapter[0];
        assert_eq!(adapter.name, "vcdvcd");
        assert!(adapter.enabled);
        assert!(!adapter.shared_host);
        assert_eq!(adapter.operations, Operation::ALL.to_vec());
        assert!(adapter.capabilities.contains(&Capability::Read));
        assert_eq!(adapter.invocation.args.len(), 1);
        assert!(adapter.validate().is_ok());
    }

    #[test]
    fn test_format_support() {
        let adapter = AdapterDescriptor::new("rust-vcd", "rust", [Format::Vcd], "rust-vcd");
        assert!(adapter.supports_format(Format::Vcd));
        assert!(!adapter.supports_format(Format::Fst));
    }

    #[test]
    fn test_operation_support_needs_capability() {
        let mut writer_only = AdapterDescriptor::new("w", "rust", [Format::Fst], "w");
        writer_only.capabilities = BTreeSet::from([Capability::Write]);
        assert!(Operation::ALL.iter().all(|op| !writer_only.supports_operation(*op)));

        let partial = AdapterDescriptor::new("p", "rust", [Format::Vcd], "p")
            .with_operations([Operation::FullParse, Operation::SignalList]);
        assert!(partial.supports_operation(Operation::SignalList));
        assert!(!partial.supports_operation(Operation::TimeRange));
    }

    #[test]
    fn test_validation_errors() {
        let blank = AdapterDescriptor::new(" ", "rust", [Format::Vcd], "x");
        assert_eq!(blank.validate(), Err(DescriptorError::EmptyName));

        let no_cmd = AdapterDescriptor::new("a", "rust", [Format::Vcd], "");
        assert_eq!(
            no_cmd.validate(),
            Err(DescriptorError::EmptyCommand("a".to_string()))
        );

        let no_formats = AdapterDescriptor::new("b", "rust", [], "x");
        assert_eq!(
            no_formats.validate(),
            Err(DescriptorError::NoFormats("b".to_string()))
        );

        let mut silent = AdapterDescriptor::new("c", "rust", [Format::Vcd], "x");
        silent.enabled = false;
        assert_eq!(
            silent.validate(),
            Err(DescriptorError::MissingReason("c".to_string()))
        );
        assert!(silent.disabled("no venv").validate().is_ok());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a/bench_small.VCD")), Some(Format::Vcd));
        assert_eq!(Format::from_path(Path::new("x.fst")), Some(Format::Fst));
        assert_eq!(Format::from_path(Path::new("x.ghw")), None);
        assert_eq!(Format::from_path(Path::new("noext")), None);
    }
}
