//! Benchmark Execution
//!
//! Drives every matrix entry through the supervisor and turns each outcome
//! into exactly one record in the Result Store.
//!
//! ## Data Flow
//!
//! ```text
//! MatrixEntry ──(disabled adapter)──────────────► skipped record
//!      │
//!      ▼
//!  AdapterJob (file, operation, warm-up, N, timeout)
//!      │
//!      ▼
//! ┌──────────────┐
//! │  Supervisor  │  spawn → hello → run → samples/failure → shutdown
//! └──────┬───────┘
//!        │
//!        ▼
//!  ok record (N samples) | error record (adapter_failure / timeout)
//! ```

use crate::config::EntryPolicy;
use crate::planner::{MatrixEntry, MatrixPlan};
use crate::supervisor::{AdapterJob, JobResult, Supervisor, SupervisorError};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use wavebench_core::Scale;
use wavebench_ipc::RunRequest;
use wavebench_report::{
    BenchmarkRecord, Coverage, Outcome, ResultStore, SampleRecord, StoreError,
};

/// Configuration for benchmark execution
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Untimed executions per entry
    pub warmup: u32,
    /// Entries run concurrently
    pub jobs: usize,
    /// Repetitions and timeout per scale; scale defaults fill the gaps
    pub policies: BTreeMap<Scale, EntryPolicy>,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl ExecutionConfig {
    /// Effective policy for a scale
    pub fn policy(&self, scale: Scale) -> EntryPolicy {
        self.policies
            .get(&scale)
            .copied()
            .unwrap_or_else(|| EntryPolicy {
                repetitions: scale.default_repetitions(),
                timeout: scale.default_timeout(),
            })
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            warmup: 1,
            jobs: 1,
            policies: BTreeMap::new(),
            show_progress: false,
        }
    }
}

/// What a run produced
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Record counts by status
    pub coverage: Coverage,
    /// Wall-clock time of the whole run
    pub duration: Duration,
}

/// Executes a matrix plan into a Result Store
pub struct Runner {
    config: ExecutionConfig,
}

impl Runner {
    /// Create a runner with the given policy
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    /// Execute every entry once, appending one record per entry in plan order.
    ///
    /// Entry failures never abort the run; only a store invariant violation does.
    pub fn execute(
        &self,
        plan: &MatrixPlan,
        store: &mut ResultStore,
    ) -> Result<RunSummary, StoreError> {
        let start = Instant::now();
        if self.config.jobs > 1 {
            warn!(
                jobs = self.config.jobs,
                "running entries in parallel; timings and memory may be contaminated"
            );
        }

        let pb = self.progress_bar(plan.entries.len());
        let mut outcomes: Vec<Option<Outcome>> = vec![None; plan.entries.len()];

        let mut enabled: Vec<usize> = Vec::new();
        for (index, entry) in plan.entries.iter().enumerate() {
            if entry.adapter.enabled {
                enabled.push(index);
                continue;
            }
            let reason = entry
                .adapter
                .reason
                .clone()
                .unwrap_or_else(|| "adapter disabled".to_string());
            info!(
                adapter = %entry.adapter.name,
                operation = %entry.operation,
                file = %entry.input.id,
                reason = %reason,
                "skipped"
            );
            outcomes[index] = Some(Outcome::Skipped { reason });
            pb.inc(1);
        }

        let jobs: Vec<AdapterJob> = enabled
            .iter()
            .map(|&index| self.job_for(&plan.entries[index]))
            .collect();

        let supervisor = Supervisor::new(self.config.jobs);
        let results = supervisor.run_all(&jobs, |job_index, result| {
            let entry = &plan.entries[enabled[job_index]];
            log_outcome(entry, result);
            pb.set_message(format!("{}/{}", entry.adapter.name, entry.input.id));
            pb.inc(1);
        });

        let results: Vec<JobResult> = match results {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "supervisor failed; recording every entry as failed");
                let message = e.to_string();
                jobs.iter()
                    .map(|_| Err(SupervisorError::Pool(message.clone())))
                    .collect()
            }
        };

        for (&index, result) in enabled.iter().zip(results) {
            outcomes[index] = Some(outcome_for(&plan.entries[index], result));
        }

        let mut coverage = Coverage::default();
        for (entry, outcome) in plan.entries.iter().zip(outcomes) {
            let Some(outcome) = outcome else { continue };
            let record = record_for(entry, outcome);
            coverage.add(record.status());
            store.append(record)?;
        }

        pb.finish_with_message("Complete");
        Ok(RunSummary {
            coverage,
            duration: start.elapsed(),
        })
    }

    fn job_for(&self, entry: &MatrixEntry) -> AdapterJob {
        let policy = self.config.policy(entry.scale());
        AdapterJob {
            adapter: entry.adapter.clone(),
            request: RunRequest {
                file: entry.input.absolute_path(),
                operation: entry.operation,
                warmup: self.config.warmup,
                repetitions: policy.repetitions,
            },
            timeout: policy.timeout,
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

fn log_outcome(entry: &MatrixEntry, result: &JobResult) {
    match result {
        Ok(samples) => {
            let mean_ms =
                samples.iter().map(|s| s.time_ms).sum::<f64>() / samples.len().max(1) as f64;
            info!(
                adapter = %entry.adapter.name,
                operation = %entry.operation,
                file = %entry.input.id,
                samples = samples.len(),
                mean_ms,
                "measured"
            );
        }
        Err(e) => warn!(
            adapter = %entry.adapter.name,
            operation = %entry.operation,
            file = %entry.input.id,
            category = %e.category(),
            error = %e,
            "entry failed"
        ),
    }
}

/// Shared-host adapters cannot attribute memory, so theirs is recorded as unknown
fn outcome_for(entry: &MatrixEntry, result: JobResult) -> Outcome {
    match result {
        Ok(samples) => Outcome::Measured(
            samples
                .into_iter()
                .map(|sample| SampleRecord {
                    time_ms: sample.time_ms,
                    memory_kb: if entry.adapter.shared_host {
                        None
                    } else {
                        sample.memory_kb
                    },
                })
                .collect(),
        ),
        Err(e) => Outcome::Failed {
            category: e.category(),
            message: e.record_message(),
        },
    }
}

fn record_for(entry: &MatrixEntry, outcome: Outcome) -> BenchmarkRecord {
    BenchmarkRecord {
        library: entry.adapter.name.clone(),
        language: entry.adapter.language.clone(),
        format: entry.input.format,
        operation: entry.operation,
        file: entry.input.id.clone(),
        scale: entry.input.scale,
        file_size_bytes: entry.input.size_bytes,
        outcome,
    }
}
