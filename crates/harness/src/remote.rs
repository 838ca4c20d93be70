//! Delegation to an external verification command.
//!
//! Brings up an honest cluster, waits for block production to
//! stabilize, hands control to an operator-supplied shell command, and
//! tears everything down once the command exits. The command's exit
//! code is the run's result.

use std::time::Duration;

use gauntlet_cluster::{dump_error_details, ClusterDriver, ClusterError, LaunchOpts, Topology};
use gauntlet_config::{Clock, RetryPolicy, RunConfig, DEFAULT_POLL_INTERVAL};
use gauntlet_probe::wait_for_block_height;
use gauntlet_scenario::{build_scenario, ScenarioKind, Staging, StagingLayout};
use tracing::{info, warn};

use crate::{HarnessError, Stage};

/// Head height every node must reach before the external command runs.
pub const DEFAULT_SYNC_BLOCKS: u64 = 3;

/// Launch an honest cluster, run `test_cmd` through the shell against
/// it, and return the command's exit code.
///
/// Teardown mirrors [`crate::run_scenario`]: processes are killed and
/// runtime state removed whatever the command's outcome, and the
/// staging tree is always cleaned. A non-zero exit code is returned to
/// the caller rather than raised, so the binary can propagate it.
pub async fn run_remote(
    config: &RunConfig,
    driver: &dyn ClusterDriver,
    clock: &dyn Clock,
    test_cmd: &str,
    sync_blocks: u64,
) -> Result<i32, HarnessError> {
    let spec = build_scenario(ScenarioKind::NoMalicious);

    let staging = Staging::new(&config.staging_dir);
    staging.clean().map_err(|e| HarnessError::at(Stage::Init, e))?;
    let layout = staging.stage(&spec).map_err(|e| HarnessError::at(Stage::Init, e))?;

    let result = delegate(&layout, spec.nodes.len(), config, driver, clock, test_cmd, sync_blocks)
        .await;

    if !matches!(result, Ok(0)) && config.dump_error_details {
        dump_error_details(&layout, &config.data_dir);
    }
    if config.teardown {
        driver.killall().await;
        if matches!(result, Ok(0)) && !config.keep_logs {
            driver.cleanup().await;
        }
    } else {
        info!("leaving the cluster running as requested");
    }
    if let Err(e) = staging.clean() {
        warn!(error = %e, "staging cleanup incomplete");
    }

    result
}

async fn delegate(
    layout: &StagingLayout,
    nodes: usize,
    config: &RunConfig,
    driver: &dyn ClusterDriver,
    clock: &dyn Clock,
    test_cmd: &str,
    sync_blocks: u64,
) -> Result<i32, HarnessError> {
    driver.killall().await;
    driver.cleanup().await;

    let opts = LaunchOpts {
        nodes,
        producers: nodes,
        topology: Topology::Mesh,
        start_delay: Duration::from_secs(1),
    };
    let cluster =
        driver.launch(layout, &opts).await.map_err(|e| HarnessError::at(Stage::Staged, e))?;

    let policy = RetryPolicy::deadline(config.wait_timeout(), DEFAULT_POLL_INTERVAL);
    if !wait_for_block_height(&cluster.nodes, sync_blocks, policy, clock).await {
        return Err(HarnessError::at(
            Stage::ClusterUp,
            ClusterError::Launch {
                detail: format!("cluster never stabilized at block {sync_blocks}"),
            },
        ));
    }
    info!(sync_blocks, "cluster stabilized, delegating to the external command");

    let status = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(test_cmd)
        .status()
        .await
        .map_err(|e| HarnessError::at(Stage::ClusterUp, ClusterError::Io(e)))?;
    // A signal-terminated command carries no code; report it as failure.
    let code = status.code().unwrap_or(1);
    info!(code, "external command finished");
    Ok(code)
}
