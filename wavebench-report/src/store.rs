//! Result Store
//!
//! Append-only log of benchmark records plus the run metadata. The store is an
//! explicit value owned by the caller; nothing here is global. Uniqueness of
//! `(library, operation, file)` is enforced on every append and on load.

use crate::meta::StoreMeta;
use crate::record::{BenchmarkRecord, RecordKey, RecordStatus};
use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result Store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same identity is already present
    #[error("duplicate record for {0}")]
    Duplicate(RecordKey),

    /// Malformed document or invalid record
    #[error("invalid result store: {0}")]
    Json(#[from] serde_json::Error),

    /// Read or write failed
    #[error("{path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Outcome counts across a set of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    /// Records considered
    pub total: usize,
    /// `status = ok`
    pub measured: usize,
    /// `status = error`
    pub errored: usize,
    /// `status = skipped`
    pub skipped: usize,
}

impl Coverage {
    /// Count one record
    pub fn add(&mut self, status: RecordStatus) {
        self.total += 1;
        match status {
            RecordStatus::Ok => self.measured += 1,
            RecordStatus::Error => self.errored += 1,
            RecordStatus::Skipped => self.skipped += 1,
        }
    }
}

#[derive(Serialize)]
struct StoreDocumentRef<'a> {
    meta: &'a StoreMeta,
    records: &'a [BenchmarkRecord],
}

#[derive(Deserialize)]
struct StoreDocument {
    meta: StoreMeta,
    records: Vec<BenchmarkRecord>,
}

/// The append-only collection of benchmark records
#[derive(Debug, Clone)]
pub struct ResultStore {
    meta: StoreMeta,
    records: Vec<BenchmarkRecord>,
    keys: FxHashSet<RecordKey>,
}

impl ResultStore {
    /// Empty store
    pub fn new(meta: StoreMeta) -> Self {
        Self {
            meta,
            records: Vec::new(),
            keys: FxHashSet::default(),
        }
    }

    /// Append a record; rejects a second record for the same entry
    pub fn append(&mut self, record: BenchmarkRecord) -> Result<(), StoreError> {
        let key = record.key();
        if !self.keys.insert(key.clone()) {
            return Err(StoreError::Duplicate(key));
        }
        self.records.push(record);
        Ok(())
    }

    /// Records in append order
    pub fn records(&self) -> &[BenchmarkRecord] {
        &self.records
    }

    /// Run metadata
    pub fn meta(&self) -> &StoreMeta {
        &self.meta
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record was appended yet
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a record exists for this identity
    pub fn contains(&self, key: &RecordKey) -> bool {
        self.keys.contains(key)
    }

    /// Outcome counts over every record
    pub fn coverage(&self) -> Coverage {
        let mut coverage = Coverage::default();
        for record in &self.records {
            coverage.add(record.status());
        }
        coverage
    }

    /// Parse a store document, validating every record and the uniqueness invariant
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let document: StoreDocument = serde_json::from_str(json)?;
        let mut store = Self::new(document.meta);
        for record in document.records {
            store.append(record)?;
        }
        Ok(store)
    }

    /// Pretty-printed store document
    pub fn to_json(&self) -> Result<String, StoreError> {
        let document = StoreDocumentRef {
            meta: &self.meta,
            records: &self.records,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Load from disk
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Write to disk, creating parent directories.
    ///
    /// The document is written next to the target and renamed into place so an
    /// interrupted write never leaves a truncated store behind.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = self.to_json()?;
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        std::fs::write(&staging, json).map_err(io_err)?;
        std::fs::rename(&staging, path).map_err(io_err)
    }
}
