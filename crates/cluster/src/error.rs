//! Cluster error types.

/// Errors from cluster lifecycle and collaborator calls.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// A node failed to start within its startup window.
    #[error("cluster failed to launch: {detail}")]
    Launch {
        /// What went wrong.
        detail: String,
    },

    /// The wallet daemon failed to start within its startup window.
    #[error("wallet failed to launch: {detail}")]
    WalletLaunch {
        /// What went wrong.
        detail: String,
    },

    /// Account creation was rejected or never confirmed.
    #[error("failed to create account {account}: {detail}")]
    AccountCreation {
        /// The account that was being created.
        account: String,
        /// What went wrong.
        detail: String,
    },

    /// Contract publication was rejected or never confirmed.
    #[error("failed to publish contract for {account}: {detail}")]
    ContractPublish {
        /// The account the contract was being set on.
        account: String,
        /// What went wrong.
        detail: String,
    },

    /// A transaction submission failed in a way that is not the expected
    /// malicious-producer rejection.
    #[error("unexpected submission failure: {detail}")]
    Submission {
        /// The failure detail from the node or client.
        detail: String,
    },

    /// A queried entity does not exist on the node.
    #[error("{what} not found")]
    NotFound {
        /// Description of the missing entity.
        what: String,
    },

    /// HTTP transport failure against a node or the wallet daemon.
    #[error("api request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A collaborator returned a payload that could not be decoded.
    #[error("api returned malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Process or filesystem failure while driving external binaries.
    #[error("process io: {0}")]
    Io(#[from] std::io::Error),
}
