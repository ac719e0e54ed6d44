//! Adapter Process Entry Point
//!
//! The adapter side of the harness/adapter contract for libraries written in
//! Rust. An adapter binary implements [`Adapter`] and hands it to
//! [`AdapterMain`], which speaks the wire protocol, runs the warm-up and timed
//! repetitions, and turns panics into structured failures.
//!
//! On Unix, uses fd 3/4 for IPC (set via `WAVEBENCH_IPC_FD`) so that libraries
//! printing to stdout cannot corrupt the frame stream, and installs a SIGTERM
//! handler so a timed-out adapter stops between repetitions. Without the
//! variable it falls back to stdin/stdout.

use crate::measure::{Timer, peak_rss_kb, reset_peak_rss};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use wavebench_ipc::{
    AdapterHello, AdapterMessage, FailureKind, FrameError, FrameReader, FrameWriter,
    HarnessCommand, IPC_FD_ENV, Operation, PROTOCOL_VERSION, RunRequest, TimedSample,
};

#[cfg(unix)]
use std::os::unix::io::FromRawFd;

/// Failure raised by an adapter for one operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct AdapterError {
    /// Category reported to the harness
    pub kind: FailureKind,
    /// Diagnostic text, forwarded verbatim
    pub message: String,
}

impl AdapterError {
    /// Build an error of any kind
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The library could not open or decode the file
    pub fn open_failed(message: impl Into<String>) -> Self {
        Self::new(FailureKind::OpenFailed, message)
    }

    /// The library cannot perform this operation
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unsupported, message)
    }
}

/// A library driver exposing the standardized operations
pub trait Adapter {
    /// Library name
    fn name(&self) -> &str;

    /// Implementation language reported in the handshake
    fn language(&self) -> &str {
        "rust"
    }

    /// Untimed setup before the warm-up (path checks, lookup tables)
    fn prepare(&mut self, _file: &Path, _operation: Operation) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Perform the operation once; this call is what gets timed
    fn execute(&mut self, file: &Path, operation: Operation) -> Result<(), AdapterError>;
}

/// Global flag set by SIGTERM handler to request graceful shutdown.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check if a graceful shutdown has been requested via SIGTERM.
pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::Relaxed)
}

#[cfg(unix)]
fn install_sigterm_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigterm_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut sa.sa_mask);
        libc::sigaction(libc::SIGTERM, &sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigterm_handler(_sig: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigterm_handler() {}

enum IpcTransport {
    #[cfg(unix)]
    Fds { read_fd: i32, write_fd: i32 },
    Stdio,
}

fn detect_transport() -> IpcTransport {
    #[cfg(unix)]
    if let Ok(val) = std::env::var(IPC_FD_ENV) {
        if let Some((r, w)) = val.split_once(',') {
            if let (Ok(read_fd), Ok(write_fd)) = (r.trim().parse(), w.trim().parse()) {
                return IpcTransport::Fds { read_fd, write_fd };
            }
        }
        eprintln!(
            "wavebench: warning: invalid {IPC_FD_ENV}={val:?} (expected <read_fd>,<write_fd>), falling back to stdio"
        );
    }
    IpcTransport::Stdio
}

/// Run a closure, converting panics into [`FailureKind::Panic`]
fn guarded<F>(f: F) -> Result<(), AdapterError>
where
    F: FnOnce() -> Result<(), AdapterError>,
{
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic) => {
            let message = if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            Err(AdapterError::new(FailureKind::Panic, message))
        }
    }
}

/// Adapter main loop
pub struct AdapterMain<A: Adapter> {
    adapter: A,
    reader: FrameReader<Box<dyn std::io::Read>>,
    writer: FrameWriter<Box<dyn std::io::Write>>,
}

impl<A: Adapter> AdapterMain<A> {
    /// Attach to the harness, using fd 3/4 if `WAVEBENCH_IPC_FD` is set, otherwise stdin/stdout.
    pub fn new(adapter: A) -> Self {
        match detect_transport() {
            #[cfg(unix)]
            IpcTransport::Fds { read_fd, write_fd } => {
                let read_file = unsafe { std::fs::File::from_raw_fd(read_fd) };
                let write_file = unsafe { std::fs::File::from_raw_fd(write_fd) };
                Self::with_streams(adapter, Box::new(read_file), Box::new(write_file))
            }
            IpcTransport::Stdio => Self::with_streams(
                adapter,
                Box::new(std::io::stdin()),
                Box::new(std::io::stdout()),
            ),
        }
    }

    /// Attach to explicit streams
    pub fn with_streams(
        adapter: A,
        reader: Box<dyn std::io::Read>,
        writer: Box<dyn std::io::Write>,
    ) -> Self {
        Self {
            adapter,
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }

    /// Serve commands until `shutdown`, end of stream, or SIGTERM
    pub fn run(&mut self) -> Result<(), FrameError> {
        install_sigterm_handler();

        self.writer.write(&AdapterMessage::Hello(AdapterHello {
            protocol_version: PROTOCOL_VERSION,
            adapter: self.adapter.name().to_string(),
            language: self.adapter.language().to_string(),
        }))?;

        loop {
            if shutdown_requested() {
                break;
            }

            let command: HarnessCommand = match self.reader.read() {
                Ok(command) => command,
                Err(FrameError::EndOfStream) => break,
                Err(e) => return Err(e),
            };

            match command {
                HarnessCommand::Run(request) => self.serve(&request)?,
                HarnessCommand::Shutdown => break,
            }
        }

        Ok(())
    }

    /// Warm-up, then timed repetitions, one `sample` frame each
    fn serve(&mut self, request: &RunRequest) -> Result<(), FrameError> {
        if let Err(message) = request.validate() {
            return self.fail(AdapterError::new(FailureKind::Other, message));
        }

        let file = request.file.as_path();
        let operation = request.operation;

        if let Err(e) = guarded(|| self.adapter.prepare(file, operation)) {
            return self.fail(e);
        }

        for _ in 0..request.warmup {
            let timer = Timer::start();
            if let Err(e) = guarded(|| self.adapter.execute(file, operation)) {
                return self.fail(e);
            }
            self.writer.write(&AdapterMessage::WarmupComplete {
                time_ms: timer.elapsed_ms(),
            })?;
        }

        for _ in 0..request.repetitions {
            // A pending SIGTERM means the harness already gave up on this entry
            if shutdown_requested() {
                return Ok(());
            }

            reset_peak_rss();
            let timer = Timer::start();
            let outcome = guarded(|| self.adapter.execute(file, operation));
            let time_ms = timer.elapsed_ms();

            if let Err(e) = outcome {
                return self.fail(e);
            }

            self.writer.write(&AdapterMessage::Sample(TimedSample {
                time_ms,
                memory_kb: peak_rss_kb(),
            }))?;
        }

        self.writer.write(&AdapterMessage::Complete)
    }

    fn fail(&mut self, error: AdapterError) -> Result<(), FrameError> {
        self.writer.write(&AdapterMessage::Failure {
            kind: error.kind,
            message: error.message,
        })
    }
}
