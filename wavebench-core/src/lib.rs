#![warn(missing_docs)]
//! Wavebench Core
//!
//! Shared vocabulary of the harness and the runtime for Rust adapters:
//! - `AdapterDescriptor`, `Format`, `Capability` describing libraries-under-test
//! - `Scale`, `InputSpec`, `InputFile` describing test data
//! - `Adapter` + `AdapterMain` for writing adapter binaries
//! - Wall-clock timer and peak-RSS probes used inside adapters

mod adapter;
mod descriptor;
mod input;
mod measure;

pub use adapter::{Adapter, AdapterError, AdapterMain, shutdown_requested};
pub use descriptor::{
    AdapterDescriptor, Capability, DescriptorError, Format, Invocation, required_capability,
};
pub use input::{InputFile, InputSpec, Scale, conventional_file_name, scale_directory};
pub use measure::{Timer, peak_rss_kb, reset_peak_rss};
pub use wavebench_ipc::{FailureKind, Operation};
