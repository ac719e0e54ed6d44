//! Adapter Supervisor
//!
//! Runs every matrix entry in its own adapter process and turns whatever the
//! process does into samples or a classified error.
//!
//! - Commands go out on the child's fd 3, messages come back on fd 4; stdout
//!   is discarded and the tail of stderr is kept for crash reports.
//! - One deadline covers spawn, handshake, warm-up and all repetitions. On
//!   expiry the adapter's process group gets SIGTERM, a 500 ms grace period,
//!   then SIGKILL. Partial samples are discarded.
//! - The adapter runs in its own process group so wrapper scripts and
//!   interpreters are terminated together with whatever they started.

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use std::fs::File;
use std::io::Read;
use std::os::unix::io::{FromRawFd, RawFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use wavebench_core::AdapterDescriptor;
use wavebench_ipc::{
    AdapterHello, AdapterMessage, COMMAND_FD, FailureKind, FrameError, FrameReader, FrameWriter,
    HarnessCommand, IPC_FD_ENV, MESSAGE_FD, PROTOCOL_VERSION, RunRequest, TimedSample,
};
use wavebench_report::ErrorCategory;

/// Time between SIGTERM and SIGKILL
const TERMINATION_GRACE: Duration = Duration::from_millis(500);

/// How much of the adapter's stderr is kept
const STDERR_TAIL_BYTES: usize = 8 * 1024;

/// Why an entry produced no samples
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Adapter process could not be started
    #[error("failed to start adapter `{command}`: {source}")]
    SpawnFailed {
        /// Command as configured
        command: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Adapter exited or closed its pipe unexpectedly; carries the stderr tail
    #[error("adapter crashed: {0}")]
    AdapterCrashed(String),

    /// Entry exceeded its ceiling
    #[error("timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Out-of-order or incompatible message
    #[error("protocol error: expected {expected}, got {got}")]
    ProtocolError {
        /// Message the harness waited for
        expected: String,
        /// Message it received
        got: String,
    },

    /// Undecodable frame or inconsistent sample count
    #[error("malformed adapter output: {0}")]
    MalformedOutput(String),

    /// Failure reported by the adapter itself
    #[error("{kind}: {message}")]
    AdapterFailed {
        /// Category chosen by the adapter
        kind: FailureKind,
        /// Adapter text, verbatim
        message: String,
    },

    /// Rayon pool construction failed
    #[error("failed to build worker pool: {0}")]
    Pool(String),
}

impl SupervisorError {
    /// Record category for this failure
    pub fn category(&self) -> ErrorCategory {
        match self {
            SupervisorError::Timeout(_) => ErrorCategory::Timeout,
            _ => ErrorCategory::AdapterFailure,
        }
    }

    /// Text stored in the record; adapter-reported failures are kept verbatim
    pub fn record_message(&self) -> String {
        match self {
            SupervisorError::AdapterFailed { message, .. } if !message.trim().is_empty() => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Create a pipe pair, returning (read_fd, write_fd), both close-on-exec.
fn create_pipe() -> Result<(RawFd, RawFd), std::io::Error> {
    let mut fds = [0 as RawFd; 2];
    let ret = unsafe { libc::pipe(fds.as_mut_ptr()) };
    if ret != 0 {
        return Err(std::io::Error::last_os_error());
    }
    for &fd in &fds {
        unsafe {
            let flags = libc::fcntl(fd, libc::F_GETFD);
            libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC);
        }
    }
    Ok((fds[0], fds[1]))
}

fn close_fd(fd: RawFd) {
    unsafe {
        libc::close(fd);
    }
}

/// Duplicate `fd` above the range used for the adapter's IPC descriptors.
/// Runs between fork and exec, so only async-signal-safe calls are allowed.
fn dup_above_ipc_range(fd: RawFd) -> std::io::Result<RawFd> {
    let high = unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, 10) };
    if high < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(high)
    }
}

/// `dup2` clears close-on-exec on the target, so it survives the exec.
fn dup_onto(fd: RawFd, target: RawFd) -> std::io::Result<()> {
    if unsafe { libc::dup2(fd, target) } < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Signal every process in the adapter's group
fn signal_group(pid: u32, signal: libc::c_int) {
    unsafe {
        libc::kill(-(pid as libc::pid_t), signal);
    }
}

/// Background drain of the adapter's stderr, keeping only the tail
struct StderrTail {
    buffer: Arc<Mutex<Vec<u8>>>,
    finished: Receiver<()>,
}

impl StderrTail {
    fn capture(mut stderr: ChildStderr) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let (done, finished) = mpsc::channel();

        std::thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            loop {
                match stderr.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => {
                        if let Ok(mut tail) = sink.lock() {
                            tail.extend_from_slice(&chunk[..n]);
                            if tail.len() > STDERR_TAIL_BYTES {
                                let excess = tail.len() - STDERR_TAIL_BYTES;
                                tail.drain(..excess);
                            }
                        }
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
            let _ = done.send(());
        });

        Self { buffer, finished }
    }

    /// Captured text, waiting up to `wait` for the stream to close
    fn text(&self, wait: Duration) -> String {
        let _ = self.finished.recv_timeout(wait);
        self.buffer
            .lock()
            .map(|tail| String::from_utf8_lossy(&tail).trim().to_string())
            .unwrap_or_default()
    }
}

/// Decode adapter messages on a dedicated thread so a stalled or partial frame
/// never blocks the deadline check.
fn spawn_message_reader(file: File) -> Receiver<Result<AdapterMessage, FrameError>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut reader = FrameReader::new(file);
        loop {
            let message = reader.read::<AdapterMessage>();
            let done = message.is_err();
            if tx.send(message).is_err() || done {
                break;
            }
        }
    });
    rx
}

fn describe(message: &AdapterMessage) -> &'static str {
    match message {
        AdapterMessage::Hello(_) => "hello",
        AdapterMessage::WarmupComplete { .. } => "warmup_complete",
        AdapterMessage::Sample(_) => "sample",
        AdapterMessage::Complete => "complete",
        AdapterMessage::Failure { .. } => "failure",
    }
}

/// Upper bound on a deadline; larger timeouts are clamped to it
const MAX_DEADLINE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout.min(MAX_DEADLINE))
        .or_else(|| now.checked_add(Duration::from_secs(24 * 3600)))
        .unwrap_or(now)
}

/// One running adapter process
pub struct AdapterHandle {
    name: String,
    child: Child,
    writer: FrameWriter<File>,
    messages: Receiver<Result<AdapterMessage, FrameError>>,
    stderr: Option<StderrTail>,
    timeout: Duration,
    deadline: Instant,
}

impl AdapterHandle {
    /// Start the adapter described by `descriptor`; `timeout` starts now
    pub fn spawn(descriptor: &AdapterDescriptor, timeout: Duration) -> Result<Self, SupervisorError> {
        let deadline = deadline_after(timeout);
        let invocation = &descriptor.invocation;
        let spawn_failed = |source| SupervisorError::SpawnFailed {
            command: invocation.command.clone(),
            source,
        };

        // cmd pipe: harness writes → adapter reads fd 3
        let (cmd_read, cmd_write) = create_pipe().map_err(spawn_failed)?;
        // msg pipe: adapter writes fd 4 → harness reads
        let (msg_read, msg_write) = match create_pipe() {
            Ok(fds) => fds,
            Err(e) => {
                close_fd(cmd_read);
                close_fd(cmd_write);
                return Err(spawn_failed(e));
            }
        };

        let mut command = Command::new(&invocation.command);
        command
            .args(&invocation.args)
            .envs(&invocation.env)
            .env(IPC_FD_ENV, format!("{},{}", COMMAND_FD, MESSAGE_FD))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .process_group(0);
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }

        unsafe {
            command.pre_exec(move || {
                // Both ends move out of the way before either lands on 3/4,
                // otherwise one mapping could overwrite the other's source.
                let cmd_high = dup_above_ipc_range(cmd_read)?;
                let msg_high = dup_above_ipc_range(msg_write)?;
                dup_onto(cmd_high, COMMAND_FD)?;
                dup_onto(msg_high, MESSAGE_FD)?;
                Ok(())
            });
        }

        let mut child = match command.spawn() {
            Ok(c) => c,
            Err(e) => {
                close_fd(cmd_read);
                close_fd(cmd_write);
                close_fd(msg_read);
                close_fd(msg_write);
                return Err(spawn_failed(e));
            }
        };

        // Child-side ends belong to the child now
        close_fd(cmd_read);
        close_fd(msg_write);

        let writer_file = unsafe { File::from_raw_fd(cmd_write) };
        let reader_file = unsafe { File::from_raw_fd(msg_read) };
        let stderr = child.stderr.take().map(StderrTail::capture);

        debug!(adapter = %descriptor.name, pid = child.id(), "adapter started");

        Ok(Self {
            name: descriptor.name.clone(),
            child,
            writer: FrameWriter::new(writer_file),
            messages: spawn_message_reader(reader_file),
            stderr,
            timeout,
            deadline,
        })
    }

    /// Wait for the handshake and check the protocol version
    pub fn expect_hello(&mut self) -> Result<AdapterHello, SupervisorError> {
        match self.next_message()? {
            AdapterMessage::Hello(hello) if hello.protocol_version == PROTOCOL_VERSION => {
                if hello.adapter != self.name {
                    debug!(
                        adapter = %self.name,
                        reported = %hello.adapter,
                        "adapter reports a different name"
                    );
                }
                Ok(hello)
            }
            AdapterMessage::Hello(hello) => Err(SupervisorError::ProtocolError {
                expected: format!("protocol version {}", PROTOCOL_VERSION),
                got: format!("protocol version {}", hello.protocol_version),
            }),
            AdapterMessage::Failure { kind, message } => {
                Err(SupervisorError::AdapterFailed { kind, message })
            }
            other => Err(SupervisorError::ProtocolError {
                expected: "hello".to_string(),
                got: describe(&other).to_string(),
            }),
        }
    }

    /// Execute one entry and collect exactly `request.repetitions` samples
    pub fn run(&mut self, request: &RunRequest) -> Result<Vec<TimedSample>, SupervisorError> {
        // A failed write means the adapter is gone; reading reports why.
        if let Err(e) = self.writer.write(&HarnessCommand::Run(request.clone())) {
            debug!(adapter = %self.name, error = %e, "failed to send run command");
        }

        let expected = request.repetitions as usize;
        let mut samples = Vec::with_capacity(expected);
        loop {
            match self.next_message()? {
                AdapterMessage::WarmupComplete { time_ms } => {
                    debug!(adapter = %self.name, time_ms, "warm-up complete");
                }
                AdapterMessage::Sample(sample) => {
                    if !sample.is_valid() {
                        return Err(SupervisorError::MalformedOutput(format!(
                            "invalid sample time {}",
                            sample.time_ms
                        )));
                    }
                    samples.push(sample);
                    if samples.len() > expected {
                        return Err(SupervisorError::MalformedOutput(format!(
                            "more than the {} requested samples",
                            expected
                        )));
                    }
                }
                AdapterMessage::Complete => {
                    if samples.len() != expected {
                        return Err(SupervisorError::MalformedOutput(format!(
                            "expected {} samples, got {}",
                            expected,
                            samples.len()
                        )));
                    }
                    return Ok(samples);
                }
                AdapterMessage::Failure { kind, message } => {
                    return Err(SupervisorError::AdapterFailed { kind, message });
                }
                AdapterMessage::Hello(_) => {
                    return Err(SupervisorError::ProtocolError {
                        expected: "sample/complete/failure".to_string(),
                        got: "hello".to_string(),
                    });
                }
            }
        }
    }

    /// Ask the adapter to exit and require a clean exit status
    pub fn finish(mut self) -> Result<(), SupervisorError> {
        if let Err(e) = self.writer.write(&HarnessCommand::Shutdown) {
            debug!(adapter = %self.name, error = %e, "failed to send shutdown");
        }

        loop {
            match self.child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(SupervisorError::AdapterCrashed(
                        self.with_stderr(format!("exited with {} after completing", status)),
                    ));
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(SupervisorError::AdapterCrashed(format!(
                        "failed to wait for adapter: {}",
                        e
                    )));
                }
            }
            if Instant::now() >= self.deadline {
                return Err(self.handle_timeout());
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn next_message(&mut self) -> Result<AdapterMessage, SupervisorError> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(self.handle_timeout());
        }

        match self.messages.recv_timeout(remaining) {
            Ok(Ok(message)) => {
                debug!(adapter = %self.name, message = describe(&message), "adapter message");
                Ok(message)
            }
            Ok(Err(FrameError::EndOfStream)) | Err(RecvTimeoutError::Disconnected) => {
                Err(self.crashed("closed its message channel"))
            }
            Ok(Err(FrameError::Io(e))) => {
                Err(self.crashed(&format!("message channel failed ({})", e)))
            }
            Ok(Err(e)) => Err(SupervisorError::MalformedOutput(e.to_string())),
            Err(RecvTimeoutError::Timeout) => Err(self.handle_timeout()),
        }
    }

    /// Classify an unexpected end of the conversation
    fn crashed(&mut self, what: &str) -> SupervisorError {
        let status = self.wait_for_exit(Duration::from_secs(1));
        let detail = match status {
            Some(status) => format!("adapter {} ({})", what, status),
            None => {
                self.kill();
                format!("adapter {} but kept running", what)
            }
        };
        SupervisorError::AdapterCrashed(self.with_stderr(detail))
    }

    /// Timeout: SIGTERM, 500 ms grace, SIGKILL. Samples already sent are dropped.
    fn handle_timeout(&mut self) -> SupervisorError {
        warn!(
            adapter = %self.name,
            timeout_secs = self.timeout.as_secs_f64(),
            "entry timed out, terminating adapter"
        );
        signal_group(self.child.id(), libc::SIGTERM);

        let grace_end = Instant::now() + TERMINATION_GRACE;
        while Instant::now() < grace_end && self.is_alive() {
            while self.messages.try_recv().is_ok() {}
            std::thread::sleep(Duration::from_millis(10));
        }

        self.kill();
        SupervisorError::Timeout(self.timeout)
    }

    fn wait_for_exit(&mut self, wait: Duration) -> Option<ExitStatus> {
        let until = Instant::now() + wait;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) if Instant::now() < until => {
                    std::thread::sleep(Duration::from_millis(5));
                }
                _ => return None,
            }
        }
    }

    fn with_stderr(&self, detail: String) -> String {
        let tail = self
            .stderr
            .as_ref()
            .map(|s| s.text(Duration::from_millis(200)))
            .unwrap_or_default();
        if tail.is_empty() {
            detail
        } else {
            format!("{}\n--- stderr ---\n{}", detail, tail)
        }
    }

    /// Check if the adapter process is still running
    pub fn is_alive(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    fn kill(&mut self) {
        if self.is_alive() {
            signal_group(self.child.id(), libc::SIGKILL);
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

impl Drop for AdapterHandle {
    fn drop(&mut self) {
        if self.is_alive() {
            signal_group(self.child.id(), libc::SIGTERM);
            std::thread::sleep(Duration::from_millis(50));
            self.kill();
        }
    }
}

/// Work order for one enabled matrix entry
#[derive(Debug, Clone)]
pub struct AdapterJob {
    /// Adapter to launch
    pub adapter: Arc<AdapterDescriptor>,
    /// Request sent once the adapter has said hello
    pub request: RunRequest,
    /// Hard deadline for warm-up plus all repetitions
    pub timeout: Duration,
}

/// Outcome of one job
pub type JobResult = Result<Vec<TimedSample>, SupervisorError>;

/// Runs jobs with process isolation, optionally several at a time
pub struct Supervisor {
    jobs: usize,
}

impl Supervisor {
    /// `jobs` is clamped to at least one
    pub fn new(jobs: usize) -> Self {
        Self { jobs: jobs.max(1) }
    }

    /// Spawn, handshake, run and shut down one adapter process
    pub fn run_job(&self, job: &AdapterJob) -> JobResult {
        let mut handle = AdapterHandle::spawn(&job.adapter, job.timeout)?;
        handle.expect_hello()?;
        let samples = handle.run(&job.request)?;
        handle.finish()?;
        Ok(samples)
    }

    /// Run all jobs; results are returned in job order.
    ///
    /// `on_finished` is called as each job completes, in completion order.
    pub fn run_all<F>(&self, jobs: &[AdapterJob], on_finished: F) -> Result<Vec<JobResult>, SupervisorError>
    where
        F: Fn(usize, &JobResult) + Sync,
    {
        if self.jobs == 1 || jobs.len() <= 1 {
            return Ok(jobs
                .iter()
                .enumerate()
                .map(|(index, job)| {
                    let result = self.run_job(job);
                    on_finished(index, &result);
                    result
                })
                .collect());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.jobs.min(jobs.len()))
            .build()
            .map_err(|e| SupervisorError::Pool(e.to_string()))?;

        Ok(pool.install(|| {
            jobs.par_iter()
                .enumerate()
                .map(|(index, job)| {
                    let result = self.run_job(job);
                    on_finished(index, &result);
                    result
                })
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use wavebench_core::Format;
    use wavebench_ipc::Operation;

    fn shell_adapter(name: &str, script: &str) -> Arc<AdapterDescriptor> {
        Arc::new(
            AdapterDescriptor::new(name, "sh", [Format::Vcd], "/bin/sh").with_args(["-c", script]),
        )
    }

    fn request(repetitions: u32) -> RunRequest {
        RunRequest {
            file: PathBuf::from("/tmp/bench_small.vcd"),
            operation: Operation::FullParse,
            warmup: 1,
            repetitions,
        }
    }

    fn job(adapter: Arc<AdapterDescriptor>, repetitions: u32, timeout: Duration) -> AdapterJob {
        AdapterJob {
            adapter,
            request: request(repetitions),
            timeout,
        }
    }

    /// Pre-recorded adapter output, replayed by a shell script
    fn record_frames(dir: &Path, messages: &[AdapterMessage]) -> PathBuf {
        let mut bytes = Vec::new();
        for message in messages {
            let json = serde_json::to_vec(message).unwrap();
            bytes.extend_from_slice(&(json.len() as u32).to_le_bytes());
            bytes.extend_from_slice(&json);
        }
        let path = dir.join("frames.bin");
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn hello() -> AdapterMessage {
        AdapterMessage::Hello(AdapterHello {
            protocol_version: PROTOCOL_VERSION,
            adapter: "replay".to_string(),
            language: "sh".to_string(),
        })
    }

    fn sample(ms: f64) -> AdapterMessage {
        AdapterMessage::Sample(TimedSample {
            time_ms: ms,
            memory_kb: None,
        })
    }

    #[test]
    fn test_spawn_failure_is_adapter_failure() {
        let adapter = Arc::new(AdapterDescriptor::new(
            "missing",
            "rust",
            [Format::Vcd],
            "/nonexistent/wavebench-adapter",
        ));
        let err = Supervisor::new(1)
            .run_job(&job(adapter, 1, Duration::from_secs(5)))
            .unwrap_err();

        assert!(matches!(err, SupervisorError::SpawnFailed { .. }));
        assert_eq!(err.category(), ErrorCategory::AdapterFailure);
        assert!(err.record_message().contains("/nonexistent/wavebench-adapter"));
    }

    #[test]
    fn test_hanging_adapter_times_out() {
        let adapter = shell_adapter("hang", "sleep 30");
        let start = Instant::now();
        let err = Supervisor::new(1)
            .run_job(&job(adapter, 1, Duration::from_millis(300)))
            .unwrap_err();

        assert!(matches!(err, SupervisorError::Timeout(_)));
        assert_eq!(err.category(), ErrorCategory::Timeout);
        assert!(err.record_message().contains("timed out"));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_crash_captures_stderr() {
        let adapter = shell_adapter("crash", "echo 'segfault in parser' >&2; exit 3");
        let err = Supervisor::new(1)
            .run_job(&job(adapter, 1, Duration::from_secs(10)))
            .unwrap_err();

        assert!(matches!(err, SupervisorError::AdapterCrashed(_)));
        let message = err.record_message();
        assert!(message.contains("segfault in parser"), "{}", message);
        assert!(message.contains('3'), "{}", message);
    }

    #[test]
    fn test_garbage_output_is_malformed() {
        let adapter = shell_adapter("garbage", "printf 'garbage output' >&4; sleep 5");
        let err = Supervisor::new(1)
            .run_job(&job(adapter, 1, Duration::from_secs(10)))
            .unwrap_err();

        assert!(matches!(err, SupervisorError::MalformedOutput(_)), "{}", err);
        assert_eq!(err.category(), ErrorCategory::AdapterFailure);
    }

    #[test]
    fn test_replayed_run_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let frames = record_frames(
            dir.path(),
            &[
                hello(),
                AdapterMessage::WarmupComplete { time_ms: 4.0 },
                sample(2.0),
                sample(2.0),
                sample(3.0),
                AdapterMessage::Complete,
            ],
        );
        let script = format!("cat '{}' >&4; exit 0", frames.display());
        let samples = Supervisor::new(1)
            .run_job(&job(
                shell_adapter("replay", &script),
                3,
                Duration::from_secs(10),
            ))
            .unwrap();

        let times: Vec<f64> = samples.iter().map(|s| s.time_ms).collect();
        assert_eq!(times, vec![2.0, 2.0, 3.0]);
    }

    #[test]
    fn test_unbounded_timeout_still_runs() {
        assert!(deadline_after(Duration::MAX) > Instant::now());

        let dir = tempfile::tempdir().unwrap();
        let frames = record_frames(dir.path(), &[hello(), sample(1.5), AdapterMessage::Complete]);
        let script = format!("cat '{}' >&4; exit 0", frames.display());
        let samples = Supervisor::new(1)
            .run_job(&job(shell_adapter("replay", &script), 1, Duration::MAX))
            .unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_sample_count_mismatch_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let frames = record_frames(dir.path(), &[hello(), sample(1.0), AdapterMessage::Complete]);
        let script = format!("cat '{}' >&4; sleep 5", frames.display());
        let err = Supervisor::new(1)
            .run_job(&job(shell_adapter("short", &script), 2, Duration::from_secs(10)))
            .unwrap_err();

        assert!(err.to_string().contains("expected 2 samples, got 1"), "{}", err);
    }

    #[test]
    fn test_reported_failure_is_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let frames = record_frames(
            dir.path(),
            &[
                hello(),
                AdapterMessage::Failure {
                    kind: FailureKind::OpenFailed,
                    message: "unexpected token at line 12".to_string(),
                },
            ],
        );
        let script = format!("cat '{}' >&4; sleep 5", frames.display());
        let err = Supervisor::new(1)
            .run_job(&job(shell_adapter("fails", &script), 1, Duration::from_secs(10)))
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::AdapterFailure);
        assert_eq!(err.record_message(), "unexpected token at line 12");
    }

    #[test]
    fn test_nonzero_exit_after_complete_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let frames = record_frames(dir.path(), &[hello(), sample(1.0), AdapterMessage::Complete]);
        let script = format!("cat '{}' >&4; sleep 1; exit 7", frames.display());
        let err = Supervisor::new(1)
            .run_job(&job(shell_adapter("exit7", &script), 1, Duration::from_secs(10)))
            .unwrap_err();

        assert!(matches!(err, SupervisorError::AdapterCrashed(_)));
        assert!(err.to_string().contains("after completing"));
    }

    #[test]
    fn test_protocol_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let frames = record_frames(
            dir.path(),
            &[AdapterMessage::Hello(AdapterHello {
                protocol_version: PROTOCOL_VERSION + 1,
                adapter: "future".to_string(),
                language: "sh".to_string(),
            })],
        );
        let script = format!("cat '{}' >&4; sleep 5", frames.display());
        let err = Supervisor::new(1)
            .run_job(&job(shell_adapter("future", &script), 1, Duration::from_secs(10)))
            .unwrap_err();

        assert!(matches!(err, SupervisorError::ProtocolError { .. }));
    }

    #[test]
    fn test_run_all_keeps_job_order_and_continues_after_failures() {
        let jobs = vec![
            job(shell_adapter("hang", "sleep 30"), 1, Duration::from_millis(200)),
            job(shell_adapter("crash", "exit 1"), 1, Duration::from_secs(10)),
        ];
        let finished = Mutex::new(Vec::new());

        let results = Supervisor::new(2)
            .run_all(&jobs, |index, _| finished.lock().unwrap().push(index))
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(SupervisorError::Timeout(_))));
        assert!(matches!(results[1], Err(SupervisorError::AdapterCrashed(_))));
        let mut seen = finished.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, vec![0, 1]);
    }
}
