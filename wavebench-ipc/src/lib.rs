#![warn(missing_docs)]
//! Wavebench IPC Protocol
//!
//! Request/response contract between the harness and adapter processes.
//! Frames are length-prefixed JSON so adapters in any language can take part.
//!
//! ```text
//!  harness                                adapter
//!     │ ◄──────────── hello ───────────────── │
//!     │ ──────────── run {file, op} ────────► │
//!     │ ◄──────── warmup_complete ─────────── │
//!     │ ◄──────────── sample × N ──────────── │
//!     │ ◄────────── complete | failure ────── │
//!     │ ──────────── shutdown ──────────────► │
//! ```

mod framing;
mod messages;

pub use framing::{FrameError, FrameReader, FrameWriter, MAX_FRAME_SIZE, read_frame, write_frame};
pub use messages::{
    AdapterHello, AdapterMessage, FailureKind, HarnessCommand, Operation, RunRequest, TimedSample,
};

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Environment variable naming the inherited `<read_fd>,<write_fd>` pair
pub const IPC_FD_ENV: &str = "WAVEBENCH_IPC_FD";

/// File descriptor the adapter reads commands from
pub const COMMAND_FD: i32 = 3;

/// File descriptor the adapter writes messages to
pub const MESSAGE_FD: i32 = 4;
