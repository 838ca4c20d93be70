//! Contains the CLI for the scenario runner.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use gauntlet_cluster::ProcessDriver;
use gauntlet_config::{RunConfig, SystemClock};
use gauntlet_harness::run_all;
use gauntlet_scenario::ScenarioKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CLI arguments for the scenario runner.
#[derive(Parser, Debug)]
#[command(name = "gauntlet")]
#[command(about = "Adversarial consensus-validation scenarios against a ledger node cluster")]
pub(crate) struct Cli {
    /// Path to the run configuration file (TOML or JSON).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Scenarios to run: 1 (none malicious), 2 (minority), 3 (majority).
    /// Defaults to all three, in order.
    #[arg(short, long, value_name = "LIST", value_delimiter = ',', value_parser = parse_kind)]
    pub tests: Vec<ScenarioKind>,

    /// Override the total wait for startup and propagation polls, in seconds.
    #[arg(short, long, value_name = "SECS")]
    pub wait_timeout: Option<u64>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Dump staged configuration and node stderr when a scenario fails.
    #[arg(long)]
    pub dump_error_details: bool,

    /// Keep per-node data directories after a successful run.
    #[arg(long)]
    pub keep_logs: bool,

    /// Use the pre-rename wire conventions for pushed payloads.
    #[arg(long)]
    pub legacy_wire: bool,

    /// Leave the cluster and wallet running when the run finishes.
    #[arg(long)]
    pub dont_kill: bool,
}

fn parse_kind(s: &str) -> Result<ScenarioKind, String> {
    s.parse().map_err(|e| format!("{e}"))
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
        if let Some(wait_timeout) = self.wait_timeout {
            config.wait_timeout_secs = wait_timeout;
        }
        config.dump_error_details |= self.dump_error_details;
        config.keep_logs |= self.keep_logs;
        config.legacy_wire |= self.legacy_wire;
        if self.dont_kill {
            config.teardown = false;
        }

        Ok(config)
    }

    /// Run the selected scenarios and fail if any of them fails.
    pub(crate) async fn run(self) -> eyre::Result<()> {
        let config = self.load_config()?;
        tracing::debug!(?config, "Full configuration");

        let kinds = if self.tests.is_empty() { ScenarioKind::all().to_vec() } else { self.tests };
        let driver = ProcessDriver::new(config.clone(), Arc::new(SystemClock));
        let clock = SystemClock;

        let report = run_all(&kinds, &config, &driver, &clock).await;
        for scenario in &report.scenarios {
            match &scenario.result {
                Ok(verdict) => println!("{}: {verdict}", scenario.kind),
                Err(e) => println!("{}: FAILURE: {e}", scenario.kind),
            }
        }

        if report.all_passed() {
            Ok(())
        } else {
            let attempted = report.scenarios.len();
            let passed = report.scenarios.iter().filter(|s| s.passed()).count();
            Err(eyre::eyre!(
                "{} of {attempted} attempted scenarios failed",
                attempted - passed
            ))
        }
    }
}
