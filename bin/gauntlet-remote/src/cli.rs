//! Contains the CLI for the remote delegation runner.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use gauntlet_cluster::ProcessDriver;
use gauntlet_config::{RunConfig, SystemClock};
use gauntlet_harness::{run_remote, DEFAULT_SYNC_BLOCKS};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CLI arguments for the remote delegation runner.
#[derive(Parser, Debug)]
#[command(name = "gauntlet-remote")]
#[command(about = "Launch a ledger cluster and delegate verification to an external command")]
pub(crate) struct Cli {
    /// Path to the run configuration file (TOML or JSON).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Shell command to run once the cluster has stabilized.
    #[arg(long, value_name = "CMD")]
    pub test_cmd: String,

    /// Head height every node must reach before the command runs.
    #[arg(long, value_name = "BLOCKS", default_value_t = DEFAULT_SYNC_BLOCKS)]
    pub sync_blocks: u64,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Dump staged configuration and node stderr when the command fails.
    #[arg(long)]
    pub dump_error_details: bool,

    /// Use the pre-rename wire conventions for pushed payloads.
    #[arg(long)]
    pub legacy_wire: bool,

    /// Leave the cluster and wallet running when the run finishes.
    #[arg(long)]
    pub dont_kill: bool,
}

impl Cli {
    /// Initialize the tracing subscriber.
    pub(crate) fn init_tracing(&self) {
        let filter = if self.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        };
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .init();
    }

    /// Load the run configuration, applying CLI overrides.
    pub(crate) fn load_config(&self) -> eyre::Result<RunConfig> {
        let mut config = RunConfig::load(self.config.as_deref())?;

        // Apply CLI overrides
        config.dump_error_details |= self.dump_error_details;
        config.legacy_wire |= self.legacy_wire;
        if self.dont_kill {
            config.teardown = false;
        }

        Ok(config)
    }

    /// Launch the cluster and run the external command against it.
    pub(crate) async fn run(self) -> eyre::Result<i32> {
        let config = self.load_config()?;
        tracing::debug!(?config, "Full configuration");

        let driver = ProcessDriver::new(config.clone(), Arc::new(SystemClock));
        let clock = SystemClock;

        let code =
            run_remote(&config, &driver, &clock, &self.test_cmd, self.sync_blocks).await?;
        Ok(code)
    }
}
