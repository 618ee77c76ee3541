//! mlcache CLI entry point.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use eyre::{Result, WrapErr, eyre};
use mlcache_engine::{Engine, EngineArgs, EngineStatus, StatusSurface};
use mlcache_observability::{LogArgs, init_logging};

use crate::sim::{self, Workload};

/// mlcache - feedback-driven cache scoring engine
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct MlCacheCli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Drive a simulated cache host and report engine counters.
    Simulate(SimulateArgs),
    /// Print the status text of an idle engine.
    Status(StatusArgs),
}

/// Arguments for the `simulate` command.
#[derive(Debug, Args)]
pub(crate) struct SimulateArgs {
    #[command(flatten)]
    pub(crate) engine: EngineArgs,

    #[command(flatten)]
    pub(crate) workload: WorkloadArgs,

    /// Print the report as JSON.
    #[arg(long = "json")]
    pub(crate) json_report: bool,
}

/// Workload shape.
#[derive(Debug, Args)]
#[command(next_help_heading = "Workload")]
pub(crate) struct WorkloadArgs {
    /// Distinct item keys.
    #[arg(long, default_value_t = 1024)]
    pub(crate) items: u64,

    /// Resident items per namespace.
    #[arg(long, default_value_t = 128)]
    pub(crate) capacity: usize,

    /// Total lookups across all workers.
    #[arg(long, default_value_t = 100_000)]
    pub(crate) lookups: u64,

    /// Worker threads.
    #[arg(long, default_value_t = 4)]
    pub(crate) threads: usize,

    /// Key skew; 1.0 is uniform, larger values favour low keys.
    #[arg(long, default_value_t = 2.0)]
    pub(crate) skew: f64,

    /// Namespaces keys are spread across.
    #[arg(long, default_value_t = 1)]
    pub(crate) namespaces: u64,

    /// RNG seed.
    #[arg(long, default_value_t = 0)]
    pub(crate) seed: u64,
}

impl WorkloadArgs {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.items == 0 {
            return Err("--items must be greater than zero".to_string());
        }
        if self.capacity == 0 {
            return Err("--capacity must be greater than zero".to_string());
        }
        if self.threads == 0 {
            return Err("--threads must be greater than zero".to_string());
        }
        if self.namespaces == 0 {
            return Err("--namespaces must be greater than zero".to_string());
        }
        if !self.skew.is_finite() || self.skew <= 0.0 {
            return Err("--skew must be a positive number".to_string());
        }
        Ok(())
    }

    pub(crate) fn workload(&self) -> Workload {
        Workload {
            items: self.items,
            capacity: self.capacity,
            lookups: self.lookups,
            threads: self.threads,
            skew: self.skew,
            namespaces: self.namespaces,
            seed: self.seed,
        }
    }
}

/// Arguments for the `status` command.
#[derive(Debug, Args)]
pub(crate) struct StatusArgs {
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
}

/// Parse the command line, set up logging and run the selected command.
pub(crate) fn run() -> Result<()> {
    let cli = MlCacheCli::parse();
    init_logging(&cli.logs)?;

    match cli.command {
        Commands::Simulate(args) => simulate(&args),
        Commands::Status(args) => status(&args),
    }
}

fn simulate(args: &SimulateArgs) -> Result<()> {
    args.engine.validate().map_err(|e| eyre!(e))?;
    args.workload.validate().map_err(|e| eyre!(e))?;

    let report = sim::simulate(args.workload.workload(), args.engine.config())?;

    if args.json_report {
        let json = serde_json::to_string_pretty(&report).wrap_err("failed to encode report")?;
        println!("{json}");
    } else {
        print!("{}", report.status);
        println!(
            "lookups={} evictions={} hit_ratio={:.4} round={} weighted_average={}",
            report.lookups,
            report.evictions,
            report.hit_ratio,
            report.engine.round,
            report.engine.weighted_average,
        );
    }
    Ok(())
}

fn status(args: &StatusArgs) -> Result<()> {
    args.engine.validate().map_err(|e| eyre!(e))?;
    let engine = Arc::new(Engine::new(args.engine.config()));
    print!("{}", EngineStatus::new(engine).read());
    Ok(())
}
