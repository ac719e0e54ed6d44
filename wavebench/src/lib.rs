#![warn(missing_docs)]
//! # Wavebench
//!
//! Cross-language benchmarking harness for waveform (VCD/FST) parsing libraries.
//!
//! - **Test Matrix**: every declared adapter × input file × operation it supports,
//!   in a deterministic order
//! - **Process Isolation**: each entry runs in its own adapter process with a
//!   warm-up, N timed repetitions and a hard timeout
//! - **Result Store**: append-only JSON record log; failures are recorded, never fatal
//! - **Aggregation**: mean/stdev, MB/s, peak memory and "Nx slower" rankings,
//!   independent of record order
//!
//! ## Writing a Rust adapter
//!
//! ```ignore
//! use wavebench::{Adapter, AdapterError, AdapterMain, Operation};
//! use std::path::Path;
//!
//! struct MyParser;
//!
//! impl Adapter for MyParser {
//!     fn name(&self) -> &str {
//!         "my-parser"
//!     }
//!
//!     fn execute(&mut self, file: &Path, operation: Operation) -> Result<(), AdapterError> {
//!         my_parser::open(file).map_err(|e| AdapterError::open_failed(e.to_string()))?;
//!         Ok(())
//!     }
//! }
//!
//! fn main() {
//!     AdapterMain::new(MyParser).run().unwrap();
//! }
//! ```

// Re-export adapter runtime and shared vocabulary
pub use wavebench_core::{
    Adapter, AdapterDescriptor, AdapterError, AdapterMain, Capability, FailureKind, Format,
    InputFile, InputSpec, Operation, Scale, shutdown_requested,
};

// Re-export the harness
pub use wavebench_cli::{
    ConfigurationError, ExecutionConfig, MatrixPlan, PlanFilter, Runner, WavebenchConfig,
    build_aggregate, build_matrix, exit_code, format_human_output, resolve_inputs,
};

// Re-export result schemas
pub use wavebench_report::{
    AggregateFilter, AggregateReport, BenchmarkRecord, Coverage, RecordStatus, ResultStore,
};

// Re-export stats
pub use wavebench_stats::{SummaryStatistics, compute_summary, rank_ascending};

/// Wire protocol types for adapters in other languages
pub mod protocol {
    pub use wavebench_ipc::{
        AdapterHello, AdapterMessage, HarnessCommand, IPC_FD_ENV, PROTOCOL_VERSION, RunRequest,
        TimedSample,
    };
}

/// Run the Wavebench CLI.
///
/// ```ignore
/// fn main() -> std::process::ExitCode {
///     match wavebench::run() {
///         Ok(()) => std::process::ExitCode::SUCCESS,
///         Err(e) => std::process::ExitCode::from(wavebench::exit_code(&e)),
///     }
/// }
/// ```
pub use wavebench_cli::run;
