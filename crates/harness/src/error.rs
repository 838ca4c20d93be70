//! Stage-tagged failure reporting.

use gauntlet_cluster::ClusterError;
use gauntlet_probe::ProbeError;
use gauntlet_scenario::ScenarioError;
use thiserror::Error;

/// Scenario run states, in execution order.
///
/// A failure is reported against the last stage the run reached, which
/// tells an operator how far the scenario got before going wrong. After
/// `TxSubmitted` the run branches: the transaction either entered the
/// chain or stayed out, and both branches flow through verification into
/// teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing done yet; cleaning and staging configuration.
    Init,
    /// Configuration staged; launching the cluster.
    Staged,
    /// Cluster live; bringing up the wallet and keys.
    ClusterUp,
    /// Wallet live; importing keys and registering accounts.
    WalletUp,
    /// Accounts registered; publishing the contract.
    AccountsReady,
    /// Contract published; pushing the probe transaction.
    ContractPublished,
    /// Transaction pushed; probing propagation and inclusion.
    TxSubmitted,
    /// The probe found the transaction committed into the chain.
    EnteredChain,
    /// The probe found the transaction absent from the chain.
    NotEntered,
    /// Verdict computed.
    Verified,
    /// Processes killed and state cleaned.
    TornDown,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Staged => "staged",
            Self::ClusterUp => "cluster up",
            Self::WalletUp => "wallet up",
            Self::AccountsReady => "accounts ready",
            Self::ContractPublished => "contract published",
            Self::TxSubmitted => "transaction submitted",
            Self::EnteredChain => "entered chain",
            Self::NotEntered => "not entered",
            Self::Verified => "verified",
            Self::TornDown => "torn down",
        };
        f.write_str(name)
    }
}

/// A scenario failure tagged with the stage it occurred in.
#[derive(Debug, Error)]
#[error("scenario failed at stage '{stage}': {failure}")]
pub struct HarnessError {
    /// Last stage the run reached.
    pub stage: Stage,
    /// What went wrong there.
    #[source]
    pub failure: Failure,
}

impl HarnessError {
    pub(crate) fn at(stage: Stage, failure: impl Into<Failure>) -> Self {
        Self { stage, failure: failure.into() }
    }
}

/// The underlying fault behind a [`HarnessError`].
#[derive(Debug, Error)]
pub enum Failure {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("failed to import the key for account '{account}'")]
    KeyImport { account: String },

    #[error("transaction {tx_id} never became visible on the probe node")]
    PropagationTimeout { tx_id: String },

    #[error("{0}")]
    OutcomeMismatch(String),
}
