//! Collaborator interfaces consumed from the node and wallet processes.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Account, ClusterError, Wallet};

/// The rejection detail a node emits when its execution-time limit is
/// zero. Submission failures carrying this text are the expected
/// malicious-producer signal, not a harness fault.
pub const EXPECTED_REJECTION: &str = "allocated processing time was exceeded";

/// Summary returned by a node's info endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    /// Number of the current head block.
    pub head_block_num: u64,
}

/// Result of a message push: whether the node accepted it, plus the
/// node's JSON response (on acceptance) or failure detail (on rejection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    /// Whether the node accepted the transaction.
    pub accepted: bool,
    /// Node response body or failure detail.
    pub detail: String,
}

impl PushOutcome {
    /// Whether a rejected push carries the expected malicious-producer
    /// rejection rather than an unexpected fault.
    pub fn is_expected_rejection(&self) -> bool {
        !self.accepted && self.detail.contains(EXPECTED_REJECTION)
    }

    /// The transaction id from an accepted push's response body.
    pub fn transaction_id(&self) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(&self.detail).ok()?;
        value.get("transaction_id").and_then(|id| id.as_str()).map(str::to_string)
    }
}

/// Operations the harness issues against one node.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Fetch the node's chain summary.
    async fn get_info(&self) -> Result<ChainInfo, ClusterError>;

    /// Fetch a block by number, as the node's raw JSON envelope.
    async fn get_block(&self, block_num: u64) -> Result<serde_json::Value, ClusterError>;

    /// Fetch a transaction by id, as the node's raw JSON envelope.
    ///
    /// Returns [`ClusterError::NotFound`] while the transaction has not
    /// propagated to this node.
    async fn get_transaction(&self, id: &str) -> Result<serde_json::Value, ClusterError>;

    /// Push a contract action to this node.
    ///
    /// A rejected push is returned as `accepted = false` rather than an
    /// error; the caller decides whether the rejection was expected.
    async fn push_message(
        &self,
        contract: &str,
        action: &str,
        payload: &str,
        opts: &str,
    ) -> Result<PushOutcome, ClusterError>;

    /// Create `account`, funded by `creator` with the given stake.
    ///
    /// Returns the creating transaction's id. When `wait_for_block` is
    /// set, does not return until the head block has advanced past the
    /// submission.
    async fn create_account(
        &self,
        account: &Account,
        creator: &Account,
        stake: u64,
        wait_for_block: bool,
    ) -> Result<String, ClusterError>;

    /// Publish contract code and ABI under `account`.
    async fn publish_contract(
        &self,
        account: &str,
        code: &Path,
        abi: &Path,
        wait_for_block: bool,
    ) -> Result<serde_json::Value, ClusterError>;
}

/// Operations the harness issues against the wallet daemon.
#[async_trait]
pub trait WalletApi: Send + Sync {
    /// Create a named wallet, returning it with its unlock password.
    async fn create(&self, name: &str) -> Result<Wallet, ClusterError>;

    /// Import an account's active key into the wallet.
    async fn import_key(&self, account: &Account, wallet: &Wallet) -> Result<bool, ClusterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_rejection_match() {
        let outcome = PushOutcome {
            accepted: false,
            detail: format!("transaction rejected: {EXPECTED_REJECTION}"),
        };
        assert!(outcome.is_expected_rejection());
    }

    #[test]
    fn test_accepted_push_is_not_a_rejection() {
        let outcome =
            PushOutcome { accepted: true, detail: format!("ok but {EXPECTED_REJECTION}") };
        assert!(!outcome.is_expected_rejection());
    }

    #[test]
    fn test_unexpected_failure_is_not_expected() {
        let outcome =
            PushOutcome { accepted: false, detail: "connection refused".to_string() };
        assert!(!outcome.is_expected_rejection());
    }

    #[test]
    fn test_transaction_id_from_response() {
        let outcome = PushOutcome {
            accepted: true,
            detail: r#"{"transaction_id":"abc123","processed":{}}"#.to_string(),
        };
        assert_eq!(outcome.transaction_id().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_transaction_id_missing() {
        let outcome = PushOutcome { accepted: true, detail: "{}".to_string() };
        assert!(outcome.transaction_id().is_none());
    }
}
