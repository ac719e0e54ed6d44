//! Benchmark Records
//!
//! One record per executed matrix entry. On disk a record is a flat JSON object
//! whose `status` field discriminates the shape; in memory it is a tagged
//! [`Outcome`], and the conversion between the two enforces the record
//! invariants so an invalid record can never be loaded.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use wavebench_core::{Format, Scale};
use wavebench_ipc::{Operation, TimedSample};

/// Record status discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Measured successfully
    Ok,
    /// Adapter failure or timeout
    Error,
    /// Planned but not executed (adapter disabled)
    Skipped,
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordStatus::Ok => "ok",
            RecordStatus::Error => "error",
            RecordStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Category of a per-entry error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// File-open failure, crash, malformed output, initialization failure
    AdapterFailure,
    /// The entry exceeded its time ceiling
    Timeout,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::AdapterFailure => f.write_str("adapter failure"),
            ErrorCategory::Timeout => f.write_str("timeout"),
        }
    }
}

/// One timed repetition as stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Elapsed wall-clock time in milliseconds
    pub time_ms: f64,
    /// Peak resident memory in kilobytes; `null` means unknown
    pub memory_kb: Option<u64>,
}

impl From<TimedSample> for SampleRecord {
    fn from(sample: TimedSample) -> Self {
        Self {
            time_ms: sample.time_ms,
            memory_kb: sample.memory_kb,
        }
    }
}

/// What happened to a matrix entry
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// At least one sample was recorded
    Measured(Vec<SampleRecord>),
    /// The entry failed; message is the adapter's raw diagnostic
    Failed {
        /// Failure category
        category: ErrorCategory,
        /// Diagnostic text
        message: String,
    },
    /// The entry was not executed
    Skipped {
        /// Why it was skipped
        reason: String,
    },
}

/// Identity of a record within one store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    /// Adapter name
    pub library: String,
    /// Operation
    pub operation: Operation,
    /// Input file id
    pub file: String,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.library, self.operation, self.file)
    }
}

/// The persisted outcome of one matrix entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord", into = "RawRecord")]
pub struct BenchmarkRecord {
    /// Adapter name
    pub library: String,
    /// Adapter language
    pub language: String,
    /// Input format
    pub format: Format,
    /// Operation
    pub operation: Operation,
    /// Input file id
    pub file: String,
    /// Input scale
    pub scale: Scale,
    /// Input size at plan time
    pub file_size_bytes: u64,
    /// Result
    pub outcome: Outcome,
}

impl BenchmarkRecord {
    /// Status discriminant
    pub fn status(&self) -> RecordStatus {
        match self.outcome {
            Outcome::Measured(_) => RecordStatus::Ok,
            Outcome::Failed { .. } => RecordStatus::Error,
            Outcome::Skipped { .. } => RecordStatus::Skipped,
        }
    }

    /// Uniqueness key
    pub fn key(&self) -> RecordKey {
        RecordKey {
            library: self.library.clone(),
            operation: self.operation,
            file: self.file.clone(),
        }
    }

    /// Samples; empty unless measured
    pub fn samples(&self) -> &[SampleRecord] {
        match &self.outcome {
            Outcome::Measured(samples) => samples,
            _ => &[],
        }
    }

    /// Sample times in milliseconds
    pub fn times_ms(&self) -> Vec<f64> {
        self.samples().iter().map(|s| s.time_ms).collect()
    }

    /// Largest known peak memory across samples
    pub fn peak_memory_kb(&self) -> Option<u64> {
        self.samples().iter().filter_map(|s| s.memory_kb).max()
    }

    /// Error or skip reason; `None` when measured
    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Measured(_) => None,
            Outcome::Failed { message, .. } => Some(message),
            Outcome::Skipped { reason } => Some(reason),
        }
    }

    /// Error category; `None` unless failed
    pub fn error_category(&self) -> Option<ErrorCategory> {
        match &self.outcome {
            Outcome::Failed { category, .. } => Some(*category),
            _ => None,
        }
    }
}

/// Invariant violations rejected at the store boundary
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    /// `status = ok` with no samples
    #[error("ok record for {0} has no samples")]
    OkWithoutSamples(String),

    /// `status = ok` carrying an error message
    #[error("ok record for {0} carries an error message")]
    OkWithError(String),

    /// `status = error|skipped` carrying samples
    #[error("{status} record for {key} carries {count} samples")]
    SamplesOnFailure {
        /// Record key
        key: String,
        /// Record status
        status: RecordStatus,
        /// Sample count
        count: usize,
    },

    /// `status = error|skipped` with a missing or blank message
    #[error("{status} record for {key} has no error message")]
    MissingMessage {
        /// Record key
        key: String,
        /// Record status
        status: RecordStatus,
    },

    /// Negative or non-finite sample time
    #[error("record for {key} has invalid sample time {time_ms}")]
    InvalidSample {
        /// Record key
        key: String,
        /// Offending value
        time_ms: f64,
    },
}

/// Flat on-disk shape
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRecord {
    library: String,
    language: String,
    format: Format,
    operation: Operation,
    file: String,
    scale: Scale,
    #[serde(default)]
    file_size_bytes: u64,
    status: RecordStatus,
    #[serde(default)]
    samples: Vec<SampleRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TryFrom<RawRecord> for BenchmarkRecord {
    type Error = RecordError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let key = format!("{}/{}/{}", raw.library, raw.operation, raw.file);
        let message = raw.error.filter(|m| !m.trim().is_empty());

        let outcome = match raw.status {
            RecordStatus::Ok => {
                if raw.samples.is_empty() {
                    return Err(RecordError::OkWithoutSamples(key));
                }
                if message.is_some() {
                    return Err(RecordError::OkWithError(key));
                }
                if let Some(bad) = raw
                    .samples
                    .iter()
                    .find(|s| !s.time_ms.is_finite() || s.time_ms < 0.0)
                {
                    return Err(RecordError::InvalidSample {
                        key,
                        time_ms: bad.time_ms,
                    });
                }
                Outcome::Measured(raw.samples)
            }
            status @ (RecordStatus::Error | RecordStatus::Skipped) => {
                if !raw.samples.is_empty() {
                    return Err(RecordError::SamplesOnFailure {
                        key,
                        status,
                        count: raw.samples.len(),
                    });
                }
                let Some(message) = message else {
                    return Err(RecordError::MissingMessage { key, status });
                };
                if status == RecordStatus::Error {
                    Outcome::Failed {
                        category: raw.error_kind.unwrap_or(ErrorCategory::AdapterFailure),
                        message,
                    }
                } else {
                    Outcome::Skipped { reason: message }
                }
            }
        };

        Ok(BenchmarkRecord {
            library: raw.library,
            language: raw.language,
            format: raw.format,
            operation: raw.operation,
            file: raw.file,
            scale: raw.scale,
            file_size_bytes: raw.file_size_bytes,
            outcome,
        })
    }
}

impl From<BenchmarkRecord> for RawRecord {
    fn from(record: BenchmarkRecord) -> Self {
        let status = record.status();
        let (samples, error_kind, error) = match record.outcome {
            Outcome::Measured(samples) => (samples, None, None),
            Outcome::Failed { category, message } => (Vec::new(), Some(category), Some(message)),
            Outcome::Skipped { reason } => (Vec::new(), None, Some(reason)),
        };
        RawRecord {
            library: record.library,
            language: record.language,
            format: record.format,
            operation: record.operation,
            file: record.file,
            scale: record.scale,
            file_size_bytes: record.file_size_bytes,
            status,
            samples,
            error_kind,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(outcome: Outcome) -> BenchmarkRecord {
        BenchmarkRecord {
            library: "wellen".to_string(),
            language: "rust".to_string(),
            format: Format::Vcd,
            operation: Operation::FullParse,
            file: "bench_small.vcd".to_string(),
            scale: Scale::Small,
            file_size_bytes: 512_000,
            outcome,
        }
    }

    #[test]
    fn test_measured_record_json_shape() {
        let rec = record(Outcome::Measured(vec![SampleRecord {
            time_ms: 2.0,
            memory_kb: None,
        }]));
        let value = serde_json::to_value(&rec).unwrap();

        assert_eq!(value["library"], "wellen");
        assert_eq!(value["format"], "vcd");
        assert_eq!(value["operation"], "full_parse");
        assert_eq!(value["scale"], "small");
        assert_eq!(value["status"], "ok");
        assert_eq!(value["samples"][0]["time_ms"], 2.0);
        assert!(value["samples"][0]["memory_kb"].is_null());
        assert!(value.get("error").is_none());
        assert!(value.get("error_kind").is_none());
    }

    #[test]
    fn test_failed_record_json_shape() {
        let rec = record(Outcome::Failed {
            category: ErrorCategory::Timeout,
            message: "timed out after 60.0s".to_string(),
        });
        let value = serde_json::to_value(&rec).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["error_kind"], "timeout");
        assert_eq!(value["samples"].as_array().map(|a| a.len()), Some(0));
        assert_eq!(value["error"], "timed out after 60.0s");
    }

    #[test]
    fn test_round_trip_preserves_outcome() {
        let rec = record(Outcome::Skipped {
            reason: "virtualenv missing".to_string(),
        });
        let json = serde_json::to_string(&rec).unwrap();
        let back: BenchmarkRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
        assert_eq!(back.status(), RecordStatus::Skipped);
        assert_eq!(back.error_message(), Some("virtualenv missing"));
    }

    #[test]
    fn test_rejects_ok_without_samples() {
        let json = r#"{"library":"a","language":"rust","format":"vcd","operation":"full_parse",
            "file":"f.vcd","scale":"small","status":"ok","samples":[]}"#;
        let err = serde_json::from_str::<BenchmarkRecord>(json).unwrap_err();
        assert!(err.to_string().contains("has no samples"));
    }

    #[test]
    fn test_rejects_error_with_samples() {
        let json = r#"{"library":"a","language":"rust","format":"vcd","operation":"full_parse",
            "file":"f.vcd","scale":"small","status":"error",
            "samples":[{"time_ms":1.0,"memory_kb":null}],"error":"boom"}"#;
        assert!(serde_json::from_str::<BenchmarkRecord>(json).is_err());
    }

    #[test]
    fn test_rejects_error_without_message() {
        let json = r#"{"library":"a","language":"rust","format":"vcd","operation":"full_parse",
            "file":"f.vcd","scale":"small","status":"error","error":"  "}"#;
        let err = serde_json::from_str::<BenchmarkRecord>(json).unwrap_err();
        assert!(err.to_string().contains("no error message"));
    }

    #[test]
    fn test_error_kind_defaults_to_adapter_failure() {
        let json = r#"{"library":"a","language":"python","format":"fst","operation":"signal_list",
            "file":"f.fst","scale":"medium","status":"error","error":"Traceback ..."}"#;
        let rec: BenchmarkRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.error_category(), Some(ErrorCategory::AdapterFailure));
        assert_eq!(rec.file_size_bytes, 0);
    }

    #[test]
    fn test_peak_memory_ignores_unknown() {
        let rec = record(Outcome::Measured(vec![
            SampleRecord {
                time_ms: 1.0,
                memory_kb: Some(100),
            },
            SampleRecord {
                time_ms: 1.0,
                memory_kb: None,
            },
            SampleRecord {
                time_ms: 1.0,
                memory_kb: Some(250),
            },
        ]));
        assert_eq!(rec.peak_memory_kb(), Some(250));

        let unknown = record(Outcome::Measured(vec![SampleRecord {
            time_ms: 1.0,
            memory_kb: None,
        }]));
        assert_eq!(unknown.peak_memory_kb(), None);
    }
}
