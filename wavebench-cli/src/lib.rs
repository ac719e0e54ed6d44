#![warn(missing_docs)]
//! Wavebench CLI Library
//!
//! Harness side of wavebench: configuration, the test matrix, the adapter
//! supervisor, execution into a Result Store and aggregation into reports.
//! The `wavebench` binary calls [`run`]; everything else is public so tests
//! and other front ends can drive the pipeline directly.
//!
//! ```ignore
//! fn main() -> std::process::ExitCode {
//!     match wavebench_cli::run() {
//!         Ok(()) => std::process::ExitCode::SUCCESS,
//!         Err(e) => std::process::ExitCode::from(wavebench_cli::exit_code(&e)),
//!     }
//! }
//! ```

mod config;
mod error;
mod executor;
mod inputs;
mod planner;
mod supervisor;

pub use config::*;
pub use error::ConfigurationError;
pub use executor::{
    ExecutionConfig, RunSummary, Runner, build_aggregate, build_store_meta, compute_statistics,
    format_human_output,
};
pub use inputs::resolve_inputs;
pub use planner::*;
pub use supervisor::*;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use wavebench_core::{Format, Operation, Scale};
use wavebench_report::{
    AggregateFilter, AggregateReport, OutputFormat, ResultStore, generate_json_report,
};

/// Exit code for configuration errors
pub const EXIT_CONFIGURATION: u8 = 2;
/// Exit code for any other fatal error
pub const EXIT_FATAL: u8 = 1;

/// Result store file name inside the output directory
pub const STORE_FILE_NAME: &str = "results.json";

/// Wavebench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "wavebench")]
#[command(
    author,
    version,
    about = "Wavebench - benchmark waveform (VCD/FST) parsing libraries across languages"
)]
pub struct Cli {
    /// Optional subcommand (Run, Aggregate, List, Init); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments for the default run
    #[command(flatten)]
    pub run: RunArgs,

    /// Configuration file (default: wavebench.toml found from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: human, json
    #[arg(long, global = true)]
    pub format: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the benchmark matrix (default)
    Run(RunArgs),
    /// Aggregate an existing result store
    Aggregate(AggregateArgs),
    /// Show the planned matrix without executing it
    List(SelectionArgs),
    /// Write a default wavebench.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Which part of the matrix to plan
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Scale to run: small, medium, large, all
    #[arg(long, default_value = "small")]
    pub scale: String,

    /// Operation(s) to run; repeatable, default all
    #[arg(long = "operation", value_name = "OPERATION")]
    pub operations: Vec<Operation>,

    /// Regex on adapter names
    #[arg(long)]
    pub adapter: Option<String>,

    /// Test data directory (overrides [data].directory)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

/// Arguments for a benchmark run
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Which entries to run
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Result store path (default: <output.directory>/results.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Timed repetitions per entry (overrides every scale)
    #[arg(short = 'n', long)]
    pub repetitions: Option<u32>,

    /// Per-entry timeout, e.g. "90s" (overrides every scale)
    #[arg(long)]
    pub timeout: Option<String>,

    /// Untimed executions before measurement
    #[arg(long)]
    pub warmup: Option<u32>,

    /// Entries run concurrently
    #[arg(long)]
    pub jobs: Option<usize>,
}

/// Arguments for `aggregate`
#[derive(Args, Debug, Clone)]
pub struct AggregateArgs {
    /// Result store to read
    pub store: PathBuf,

    /// Only records of this scale: small, medium, large, all
    #[arg(long, default_value = "all")]
    pub scale: String,

    /// Only records of this file format: vcd, fst
    #[arg(long)]
    pub file_format: Option<Format>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Exit code for an error returned by [`run`]
pub fn exit_code(error: &anyhow::Error) -> u8 {
    if error.downcast_ref::<ConfigurationError>().is_some() {
        EXIT_CONFIGURATION
    } else {
        EXIT_FATAL
    }
}

/// Run the Wavebench CLI with process arguments
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the Wavebench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Init { force }) => init_config(cli.config.as_deref(), force),
        Some(Commands::Aggregate(ref args)) => {
            let config = load_config(cli.config.as_deref())?;
            let format = output_format(cli.format.as_deref(), &config)?;
            aggregate_store(args, format)
        }
        Some(Commands::List(ref args)) => {
            let config = load_config(cli.config.as_deref())?;
            list_matrix(args, config)
        }
        Some(Commands::Run(ref args)) => {
            let config = load_config(cli.config.as_deref())?;
            let format = output_format(cli.format.as_deref(), &config)?;
            run_benchmarks(args, config, format)
        }
        None => {
            let config = load_config(cli.config.as_deref())?;
            let format = output_format(cli.format.as_deref(), &config)?;
            run_benchmarks(&cli.run, config, format)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        "wavebench=debug"
    } else {
        "wavebench=info"
    };
    // A subscriber may already be installed when called repeatedly in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Explicit path, else discovery, else an empty configuration rooted at the
/// current directory
fn load_config(path: Option<&Path>) -> Result<WavebenchConfig, ConfigurationError> {
    if let Some(path) = path {
        return WavebenchConfig::load(path);
    }
    match WavebenchConfig::discover()? {
        Some((path, config)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(WavebenchConfig::default()),
    }
}

fn output_format(
    flag: Option<&str>,
    config: &WavebenchConfig,
) -> Result<OutputFormat, ConfigurationError> {
    flag.unwrap_or(&config.output.format)
        .parse()
        .map_err(ConfigurationError::InvalidValue)
}

/// `small`, `medium`, `large` or `all`
pub fn parse_scales(value: &str) -> Result<Vec<Scale>, ConfigurationError> {
    if value.trim().eq_ignore_ascii_case("all") {
        return Ok(Scale::ALL.to_vec());
    }
    value
        .parse::<Scale>()
        .map(|scale| vec![scale])
        .map_err(ConfigurationError::InvalidValue)
}

/// Layer CLI overrides over the configuration's runner settings
pub fn build_execution_config(
    args: &RunArgs,
    config: &WavebenchConfig,
    scales: &[Scale],
) -> Result<ExecutionConfig, ConfigurationError> {
    let timeout = args
        .timeout
        .as_deref()
        .map(WavebenchConfig::parse_duration)
        .transpose()?;
    if timeout.is_some_and(|t| t.is_zero()) {
        return Err(ConfigurationError::InvalidValue(
            "--timeout must be positive".to_string(),
        ));
    }
    if args.repetitions == Some(0) {
        return Err(ConfigurationError::InvalidValue(
            "--repetitions must be at least 1".to_string(),
        ));
    }

    let mut exec = ExecutionConfig {
        warmup: args.warmup.unwrap_or(config.runner.warmup),
        jobs: args.jobs.or(config.runner.jobs).unwrap_or(1).max(1),
        show_progress: std::io::stderr().is_terminal(),
        ..ExecutionConfig::default()
    };
    for &scale in scales {
        let mut policy = config.policy_for(scale)?;
        if let Some(repetitions) = args.repetitions {
            policy.repetitions = repetitions;
        }
        if let Some(timeout) = timeout {
            policy.timeout = timeout;
        }
        exec.policies.insert(scale, policy);
    }
    Ok(exec)
}

fn plan_matrix(
    args: &SelectionArgs,
    mut config: WavebenchConfig,
) -> anyhow::Result<(Vec<Scale>, WavebenchConfig, MatrixPlan)> {
    let scales = parse_scales(&args.scale)?;
    if let Some(dir) = &args.data_dir {
        config.data.directory = std::env::current_dir()
            .context("cannot determine the current directory")?
            .join(dir);
    }
    let inputs = resolve_inputs(&config, &scales)?;
    let filter = PlanFilter {
        operations: args.operations.clone(),
        adapter: args.adapter.clone(),
    };
    let plan = build_matrix(&config.resolved_adapters(), &inputs, &filter)?;
    Ok((scales, config, plan))
}

fn run_benchmarks(
    args: &RunArgs,
    config: WavebenchConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let (scales, config, plan) = plan_matrix(&args.selection, config)?;
    let exec_config = build_execution_config(args, &config, &scales)?;

    let store_path = match &args.output {
        Some(path) => path.clone(),
        None => config
            .resolve_path(&config.output.directory)
            .join(STORE_FILE_NAME),
    };
    if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create output directory {}", parent.display()))?;
    }

    eprintln!(
        "Running {} entries ({} adapters, {} files, {} skipped combinations), {} job(s)...\n",
        plan.entries.len(),
        plan.adapters.len(),
        plan.inputs.len(),
        plan.skipped.len(),
        exec_config.jobs
    );

    let mut store = ResultStore::new(build_store_meta(&scales, &exec_config));
    let summary = Runner::new(exec_config).execute(&plan, &mut store)?;
    store.save(&store_path)?;

    tracing::info!(
        measured = summary.coverage.measured,
        errored = summary.coverage.errored,
        skipped = summary.coverage.skipped,
        duration_s = summary.duration.as_secs_f64(),
        "run complete"
    );

    let report = build_aggregate(store.records(), &AggregateFilter::default());
    emit(&report, format, None)?;
    eprintln!("Result store written to: {}", store_path.display());
    Ok(())
}

fn aggregate_store(args: &AggregateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let scales = parse_scales(&args.scale)?;
    let filter = AggregateFilter {
        scale: (scales.len() == 1).then(|| scales[0]),
        format: args.file_format,
    };
    let store = ResultStore::load(&args.store)?;
    let report = build_aggregate(store.records(), &filter);
    emit(&report, format, args.output.as_deref())
}

fn emit(report: &AggregateReport, format: OutputFormat, path: Option<&Path>) -> anyhow::Result<()> {
    let output = match format {
        OutputFormat::Json => generate_json_report(report)?,
        OutputFormat::Human => format_human_output(report),
    };

    if let Some(path) = path {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("cannot write report to {}", path.display()))?;
        file.write_all(output.as_bytes())?;
        eprintln!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }
    Ok(())
}

fn list_matrix(args: &SelectionArgs, config: WavebenchConfig) -> anyhow::Result<()> {
    let (_, _, plan) = plan_matrix(args, config)?;

    println!("Wavebench Plan:");
    for adapter in &plan.adapters {
        let formats: Vec<&str> = adapter.formats.iter().map(|f| f.as_str()).collect();
        let state = match (&adapter.enabled, &adapter.reason) {
            (true, _) => String::new(),
            (false, Some(reason)) => format!(" [disabled: {}]", reason),
            (false, None) => " [disabled]".to_string(),
        };
        println!(
            "├── adapter: {} ({}, {}){}",
            adapter.name,
            adapter.language,
            formats.join("/"),
            state
        );
        for entry in plan
            .entries
            .iter()
            .filter(|e| e.adapter.name == adapter.name)
        {
            println!("│   ├── {} {}", entry.operation, entry.input.id);
        }
    }

    println!(
        "{} entries planned ({} skipped at run time), {} combinations not supported.",
        plan.entries.len(),
        plan.disabled_entries(),
        plan.skipped.len()
    );
    Ok(())
}

fn init_config(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    std::fs::write(&path, WavebenchConfig::default_toml())
        .with_context(|| format!("cannot write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
