//! The driver seam between the scenario pipeline and process control.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use gauntlet_scenario::StagingLayout;

use crate::{Account, ClusterError, NodeApi, WalletApi};

/// Network topology for a launched cluster.
///
/// Peering itself is fixed by the staged per-node configuration; the
/// topology is carried on the launch options for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// Every node peers with every other node.
    Mesh,
}

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mesh => f.write_str("mesh"),
        }
    }
}

/// Parameters for a cluster launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOpts {
    /// Total nodes to launch.
    pub nodes: usize,
    /// Producing nodes among them.
    pub producers: usize,
    /// Peer topology.
    pub topology: Topology,
    /// Delay between consecutive node launches.
    pub start_delay: Duration,
}

impl LaunchOpts {
    /// Options for a fully producing mesh with no inter-launch delay.
    pub const fn mesh(nodes: usize) -> Self {
        Self { nodes, producers: nodes, topology: Topology::Mesh, start_delay: Duration::ZERO }
    }
}

/// Handle to one running node.
#[derive(Clone)]
pub struct NodeHandle {
    /// Node index within the cluster.
    pub index: usize,
    /// Collaborator interface for this node.
    pub api: Arc<dyn NodeApi>,
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle").field("index", &self.index).finish_non_exhaustive()
    }
}

/// Handle to a running cluster.
///
/// The driver that produced the handle owns the underlying processes;
/// the handle stays valid until the driver's `killall`.
#[derive(Debug, Clone)]
pub struct ClusterHandle {
    /// Per-node handles, in node-index order.
    pub nodes: Vec<NodeHandle>,
}

impl ClusterHandle {
    /// The node at `index`, if launched.
    pub fn node(&self, index: usize) -> Option<&NodeHandle> {
        self.nodes.get(index)
    }
}

/// Handle to the running wallet daemon.
#[derive(Clone)]
pub struct WalletHandle {
    /// Collaborator interface for the wallet daemon.
    pub api: Arc<dyn WalletApi>,
}

impl std::fmt::Debug for WalletHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletHandle").finish_non_exhaustive()
    }
}

/// Cluster lifecycle capability.
///
/// Implemented by [`crate::ProcessDriver`] for real external processes
/// and by [`crate::mock::MockDriver`] for deterministic tests. `killall`
/// and `cleanup` must tolerate being called when nothing is running.
#[async_trait]
pub trait ClusterDriver: Send + Sync {
    /// Launch the staged nodes and wait for each to come live within its
    /// startup window.
    async fn launch(
        &self,
        layout: &StagingLayout,
        opts: &LaunchOpts,
    ) -> Result<ClusterHandle, ClusterError>;

    /// Launch the wallet daemon and wait for it to come live.
    async fn launch_wallet(&self) -> Result<WalletHandle, ClusterError>;

    /// Create `count` unnamed accounts with fresh owner and active key
    /// pairs. The caller names them before registration.
    async fn create_account_keys(&self, count: usize) -> Result<Vec<Account>, ClusterError>;

    /// Terminate every process this driver started. Tolerates being
    /// called with nothing running.
    async fn killall(&self);

    /// Remove runtime state (data directories, wallet state). Tolerates
    /// missing state.
    async fn cleanup(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_opts_make_every_node_produce() {
        let opts = LaunchOpts::mesh(2);
        assert_eq!(opts.nodes, 2);
        assert_eq!(opts.producers, 2);
        assert_eq!(opts.topology.to_string(), "mesh");
        assert!(opts.start_delay.is_zero());
    }
}
