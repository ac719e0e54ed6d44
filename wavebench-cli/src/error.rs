//! Fatal configuration errors
//!
//! Everything here is detected before any matrix entry executes and aborts the
//! run with exit code 2.

use std::path::PathBuf;
use thiserror::Error;
use wavebench_core::{DescriptorError, Format, Scale};

/// Invalid setup that prevents a run from starting
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Offending file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for the schema
    #[error("invalid configuration {path}: {source}")]
    Parse {
        /// Offending file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },

    /// Timeout string could not be parsed
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration {
        /// Input as written
        value: String,
        /// What is wrong with it
        reason: String,
    },

    /// Out-of-range setting
    #[error("{0}")]
    InvalidValue(String),

    /// No `[[adapter]]` table
    #[error("no adapters configured (add [[adapter]] tables to wavebench.toml)")]
    NoAdapters,

    /// `--adapter` filter matched nothing
    #[error("no adapter name matches '{0}'")]
    NoMatchingAdapters(String),

    /// Adapter declaration failed validation
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Two adapters share a name
    #[error("adapter '{0}' is declared more than once")]
    DuplicateAdapter(String),

    /// Two inputs share an id
    #[error("input file id '{0}' is declared more than once")]
    DuplicateInput(String),

    /// Declared or conventional input is absent or unreadable
    #[error("input file {path} ({scale}, {format}) is not available: {source}")]
    MissingInput {
        /// Offending file
        path: PathBuf,
        /// Declared scale
        scale: Scale,
        /// Declared format
        format: Format,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Format or scale of an input is unknown
    #[error("cannot infer the {what} of input {path}")]
    UnclassifiedInput {
        /// Offending file
        path: PathBuf,
        /// "format" or "scale"
        what: &'static str,
    },

    /// `--adapter` is not a valid regex
    #[error("invalid adapter filter '{pattern}': {source}")]
    InvalidFilter {
        /// Pattern as given
        pattern: String,
        /// Underlying error
        #[source]
        source: regex::Error,
    },
}
