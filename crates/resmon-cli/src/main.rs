//! resmon - Task Manager resource utilization sampler

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use resmon_sampler::{create_surface, Phase, TaskManagerSession, UiBackend};
use std::path::PathBuf;
use tracing::{debug, info};

mod commands;
mod config;
mod output;

use commands::{Operation, OperationContext};
use config::CliConfig;
use output::{OutputFormat, OutputFormatter};

/// Samples CPU, memory and NPU utilization from Windows Task Manager
#[derive(Debug, Parser)]
#[command(name = "resmon")]
#[command(about = "Samples CPU, memory and NPU utilization from Windows Task Manager")]
#[command(version)]
pub struct Cli {
    /// Operation to run
    #[arg(value_enum)]
    operation: Operation,

    /// Folder receiving the log, the before-stats record and workbooks
    log_folder: PathBuf,

    /// Scenario label written into every section header
    scenario: Option<String>,

    /// Sampling duration in seconds
    duration: Option<u64>,

    /// Which side of the tested operation this run measures
    #[arg(value_enum)]
    phase: Option<PhaseArg>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// UI backend (uia, mock)
    #[arg(short, long)]
    backend: Option<UiBackend>,

    /// Sampling interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON output (overrides --output)
    #[arg(long)]
    json: bool,
}

/// Phase argument; `auto` decides from the state of the log folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PhaseArg {
    Before,
    After,
    Auto,
}

impl PhaseArg {
    fn resolve(self) -> Option<Phase> {
        match self {
            PhaseArg::Before => Some(Phase::Before),
            PhaseArg::After => Some(Phase::After),
            PhaseArg::Auto => None,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "resmon_cli={},resmon_sampler={}",
            log_level, log_level
        ))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    debug!("Starting resmon with arguments: {:?}", cli);

    // Load configuration
    let mut config = CliConfig::load(cli.config.as_deref())?;
    info!("Loaded configuration from {:?}", config.source());
    config.apply_overrides(cli.backend, cli.interval_ms);
    config.validate().context("Invalid configuration")?;

    // Determine output format
    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        cli.output
    };
    let formatter = OutputFormatter::new(output_format);

    let context = OperationContext {
        log_folder: cli.log_folder.clone(),
        scenario: cli
            .scenario
            .clone()
            .unwrap_or_else(|| config.default_scenario.clone()),
        duration_secs: cli.duration.unwrap_or(config.default_duration_secs),
        phase: cli.phase.and_then(PhaseArg::resolve),
    };

    let monitor_config = config.monitor_config();
    let surface = create_surface(&monitor_config).context("Failed to create UI surface")?;
    let mut session = TaskManagerSession::new(surface, monitor_config);

    commands::dispatch(cli.operation, &mut session, &context, &formatter)
}
