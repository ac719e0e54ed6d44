//! IPC Message Types
//!
//! Every message is an internally tagged JSON object (`{"type": "...", ...}`).
//! Field names are part of the contract with adapters in other languages, so
//! renames here are protocol changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One of the five standardized waveform operations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Load the complete file, including all value changes
    FullParse,
    /// Enumerate the signal hierarchy only
    SignalList,
    /// Report the first and last timestamps
    TimeRange,
    /// Load a handful of signals and query their values over time
    ValueQuery,
    /// Signal list, time range and value query on one loaded file
    Pipeline,
}

impl Operation {
    /// All operations in canonical matrix order
    pub const ALL: [Operation; 5] = [
        Operation::FullParse,
        Operation::SignalList,
        Operation::TimeRange,
        Operation::ValueQuery,
        Operation::Pipeline,
    ];

    /// Wire name (`full_parse`, `signal_list`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FullParse => "full_parse",
            Operation::SignalList => "signal_list",
            Operation::TimeRange => "time_range",
            Operation::ValueQuery => "value_query",
            Operation::Pipeline => "pipeline",
        }
    }

    /// Section title used in human-readable output
    pub fn title(&self) -> &'static str {
        match self {
            Operation::FullParse => "Full Parse",
            Operation::SignalList => "Signal List",
            Operation::TimeRange => "Time Range",
            Operation::ValueQuery => "Value Query",
            Operation::Pipeline => "Pipeline",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str() == normalized)
            .ok_or_else(|| {
                let valid: Vec<&str> = Operation::ALL.iter().map(|op| op.as_str()).collect();
                format!("Unknown operation '{}' (expected one of: {})", s, valid.join(", "))
            })
    }
}

/// Work order for one matrix entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Absolute path of the input file
    pub file: PathBuf,
    /// Operation to execute
    pub operation: Operation,
    /// Untimed executions before measurement
    pub warmup: u32,
    /// Timed executions; the adapter must report exactly this many samples
    pub repetitions: u32,
}

impl RunRequest {
    /// Validate request values
    pub fn validate(&self) -> Result<(), String> {
        if self.repetitions == 0 {
            return Err("repetitions must be > 0".to_string());
        }
        if self.file.as_os_str().is_empty() {
            return Err("file path must not be empty".to_string());
        }
        Ok(())
    }
}

/// Commands sent from the harness to an adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HarnessCommand {
    /// Execute warm-up and timed repetitions
    Run(RunRequest),
    /// Exit cleanly
    Shutdown,
}

/// Adapter identification sent once after startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterHello {
    /// Must equal [`crate::PROTOCOL_VERSION`]
    pub protocol_version: u32,
    /// Library name as the adapter knows it
    pub adapter: String,
    /// Implementation language/runtime
    pub language: String,
}

/// One timed execution as reported by an adapter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedSample {
    /// Wall-clock time around the operation, in milliseconds
    pub time_ms: f64,
    /// Peak resident memory in kilobytes, `None` when unknown
    pub memory_kb: Option<u64>,
}

impl TimedSample {
    /// Whether the timing value is usable (finite, non-negative)
    pub fn is_valid(&self) -> bool {
        self.time_ms.is_finite() && self.time_ms >= 0.0
    }
}

/// Failure categories an adapter can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The library could not open or decode the input file
    OpenFailed,
    /// The library rejected the operation at runtime
    Unsupported,
    /// Panic or uncaught exception inside the library
    Panic,
    /// Adapter or library initialization failed
    Init,
    /// Anything else
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::OpenFailed => "open failed",
            FailureKind::Unsupported => "unsupported",
            FailureKind::Panic => "panic",
            FailureKind::Init => "initialization failed",
            FailureKind::Other => "error",
        };
        f.write_str(s)
    }
}

/// Messages sent from an adapter to the harness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdapterMessage {
    /// Handshake
    Hello(AdapterHello),
    /// Warm-up execution finished (informational)
    WarmupComplete {
        /// Untimed run duration, for logging only
        time_ms: f64,
    },
    /// One timed repetition
    Sample(TimedSample),
    /// All repetitions reported
    Complete,
    /// The entry failed; no further samples follow
    Failure {
        /// Failure category
        kind: FailureKind,
        /// Raw diagnostic text, recorded verbatim
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parse() {
        assert_eq!("full_parse".parse::<Operation>(), Ok(Operation::FullParse));
        assert_eq!("value-query".parse::<Operation>(), Ok(Operation::ValueQuery));
        assert_eq!(" Pipeline ".parse::<Operation>(), Ok(Operation::Pipeline));
        assert!("decode".parse::<Operation>().is_err());
    }

    #[test]
    fn test_operation_wire_names_match_display() {
        for op in Operation::ALL {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op));
        }
    }

    #[test]
    fn test_adapter_message_shape() {
        let sample = AdapterMessage::Sample(TimedSample {
            time_ms: 1.5,
            memory_kb: None,
        });
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"type":"sample","time_ms":1.5,"memory_kb":null}"#);

        let parsed: AdapterMessage =
            serde_json::from_str(r#"{"type":"failure","kind":"open_failed","message":"nope"}"#)
                .unwrap();
        assert_eq!(
            parsed,
            AdapterMessage::Failure {
                kind: FailureKind::OpenFailed,
                message: "nope".to_string()
            }
        );

        let done: AdapterMessage = serde_json::from_str(r#"{"type":"complete"}"#).unwrap();
        assert_eq!(done, AdapterMessage::Complete);
    }

    #[test]
    fn test_run_command_shape() {
        let cmd = HarnessCommand::Run(RunRequest {
            file: PathBuf::from("/data/bench_small.vcd"),
            operation: Operation::TimeRange,
            warmup: 1,
            repetitions: 5,
        });
        let value: serde_json::Value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["type"], "run");
        assert_eq!(value["operation"], "time_range");
        assert_eq!(value["repetitions"], 5);
    }

    #[test]
    fn test_request_validation() {
        let mut request = RunRequest {
            file: PathBuf::from("a.vcd"),
            operation: Operation::FullParse,
            warmup: 0,
            repetitions: 1,
        };
        assert!(request.validate().is_ok());

        request.repetitions = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_sample_validity() {
        assert!(TimedSample { time_ms: 0.0, memory_kb: None }.is_valid());
        assert!(!TimedSample { time_ms: -1.0, memory_kb: None }.is_valid());
        assert!(!TimedSample { time_ms: f64::NAN, memory_kb: Some(1) }.is_valid());
    }
}
