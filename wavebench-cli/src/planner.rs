//! Test Matrix Builder
//!
//! Expands {adapter} × {input file} × {operation} into matrix entries.
//!
//! - Combinations an adapter does not declare (format, operation or
//!   capability) never become entries; they are only counted.
//! - Ordering is deterministic: adapter declaration order, then input order,
//!   then the canonical operation order.
//! - Any configuration problem (duplicate names, absent files, invalid
//!   descriptors) fails the whole plan before anything runs.

use crate::error::ConfigurationError;
use fxhash::FxHashSet;
use regex::Regex;
use std::sync::Arc;
use wavebench_core::{AdapterDescriptor, InputFile, InputSpec, Operation, Scale};
use wavebench_report::RecordKey;

/// One planned unit of work
#[derive(Debug, Clone)]
pub struct MatrixEntry {
    /// Adapter that runs the entry
    pub adapter: Arc<AdapterDescriptor>,
    /// Probed input file
    pub input: Arc<InputFile>,
    /// Operation to measure
    pub operation: Operation,
}

impl MatrixEntry {
    /// Scale of the input file
    pub fn scale(&self) -> Scale {
        self.input.scale
    }

    /// Identity of the record this entry produces
    pub fn key(&self) -> RecordKey {
        RecordKey {
            library: self.adapter.name.clone(),
            operation: self.operation,
            file: self.input.id.clone(),
        }
    }
}

/// Why a combination was left out of the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Adapter does not read the file's format
    Format,
    /// Adapter does not implement the operation
    Operation,
}

/// A combination removed by capability filtering; not an error
#[derive(Debug, Clone)]
pub struct SkippedCombination {
    /// Adapter name
    pub adapter: String,
    /// Input file id
    pub file: String,
    /// Operation left out
    pub operation: Operation,
    /// Which capability was missing
    pub reason: SkipReason,
}

/// Optional narrowing of the matrix
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    /// Operations to keep; empty means all
    pub operations: Vec<Operation>,
    /// Regex on adapter names
    pub adapter: Option<String>,
}

/// Ordered matrix plus what was filtered out
#[derive(Debug, Clone)]
pub struct MatrixPlan {
    /// Entries in execution order
    pub entries: Vec<MatrixEntry>,
    /// Adapters after name filtering, in declaration order
    pub adapters: Vec<Arc<AdapterDescriptor>>,
    /// Probed inputs in declaration order
    pub inputs: Vec<Arc<InputFile>>,
    /// Combinations removed by capability filtering
    pub skipped: Vec<SkippedCombination>,
}

impl MatrixPlan {
    /// Entries whose adapter is disabled; recorded as skipped, never spawned
    pub fn disabled_entries(&self) -> usize {
        self.entries.iter().filter(|e| !e.adapter.enabled).count()
    }
}

/// Build the test matrix
pub fn build_matrix(
    adapters: &[AdapterDescriptor],
    inputs: &[InputSpec],
    filter: &PlanFilter,
) -> Result<MatrixPlan, ConfigurationError> {
    if adapters.is_empty() {
        return Err(ConfigurationError::NoAdapters);
    }

    let mut names = FxHashSet::default();
    for adapter in adapters {
        adapter.validate()?;
        if !names.insert(adapter.name.as_str()) {
            return Err(ConfigurationError::DuplicateAdapter(adapter.name.clone()));
        }
    }

    let selected: Vec<Arc<AdapterDescriptor>> = match &filter.adapter {
        Some(pattern) => {
            let re = Regex::new(pattern).map_err(|source| ConfigurationError::InvalidFilter {
                pattern: pattern.clone(),
                source,
            })?;
            let matching: Vec<_> = adapters
                .iter()
                .filter(|a| re.is_match(&a.name))
                .cloned()
                .map(Arc::new)
                .collect();
            if matching.is_empty() {
                return Err(ConfigurationError::NoMatchingAdapters(pattern.clone()));
            }
            matching
        }
        None => adapters.iter().cloned().map(Arc::new).collect(),
    };

    let mut ids = FxHashSet::default();
    let mut files = Vec::with_capacity(inputs.len());
    for spec in inputs {
        if !ids.insert(spec.id.as_str()) {
            return Err(ConfigurationError::DuplicateInput(spec.id.clone()));
        }
        let file = spec
            .probe()
            .map_err(|source| ConfigurationError::MissingInput {
                path: spec.path.clone(),
                scale: spec.scale,
                format: spec.format,
                source,
            })?;
        files.push(Arc::new(file));
    }

    let operations: Vec<Operation> = Operation::ALL
        .into_iter()
        .filter(|op| filter.operations.is_empty() || filter.operations.contains(op))
        .collect();

    let mut entries = Vec::new();
    let mut skipped = Vec::new();
    for adapter in &selected {
        for input in &files {
            for &operation in &operations {
                let reason = if !adapter.supports_format(input.format) {
                    Some(SkipReason::Format)
                } else if !adapter.supports_operation(operation) {
                    Some(SkipReason::Operation)
                } else {
                    None
                };

                match reason {
                    Some(reason) => skipped.push(SkippedCombination {
                        adapter: adapter.name.clone(),
                        file: input.id.clone(),
                        operation,
                        reason,
                    }),
                    None => entries.push(MatrixEntry {
                        adapter: Arc::clone(adapter),
                        input: Arc::clone(input),
                        operation,
                    }),
                }
            }
        }
    }

    Ok(MatrixPlan {
        entries,
        adapters: selected,
        inputs: files,
        skipped,
    })
}
