//! Bounded polls and the inclusion check.

use gauntlet_cluster::{ClusterError, NodeApi, NodeHandle};
use gauntlet_config::{Clock, RetryPolicy};
use tracing::debug;

use crate::{BlockRecord, ProbeError, TransactionRecord};

/// What the probe observed about a transaction's inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InclusionEvidence {
    /// The block the transaction was expected to commit into.
    pub target_block: u64,
    /// Whether the target block's first entry carries the transaction's
    /// signature.
    pub included: bool,
}

/// Fetch a transaction from a node as a typed record.
pub async fn transaction(
    node: &dyn NodeApi,
    tx_id: &str,
) -> Result<TransactionRecord, ProbeError> {
    TransactionRecord::from_value(node.get_transaction(tx_id).await?)
}

/// Poll a node until it has seen the transaction.
///
/// Bounded by the policy; returns `false` on timeout without raising.
pub async fn wait_for_transaction(
    node: &dyn NodeApi,
    tx_id: &str,
    policy: RetryPolicy,
    clock: &dyn Clock,
) -> bool {
    for attempt in 0..policy.max_attempts {
        match node.get_transaction(tx_id).await {
            Ok(_) => return true,
            Err(e) => debug!(tx_id, attempt, error = %e, "transaction not yet visible"),
        }
        clock.sleep(policy.interval).await;
    }
    false
}

/// Poll until every node reports a head block at or past `target`.
///
/// Used to confirm block-production stabilization across a freshly
/// launched cluster. Returns `false` on timeout.
pub async fn wait_for_block_height(
    nodes: &[NodeHandle],
    target: u64,
    policy: RetryPolicy,
    clock: &dyn Clock,
) -> bool {
    for attempt in 0..policy.max_attempts {
        let mut lowest = u64::MAX;
        for node in nodes {
            let head = match node.api.get_info().await {
                Ok(info) => info.head_block_num,
                Err(e) => {
                    debug!(node = node.index, attempt, error = %e, "info poll failed");
                    0
                }
            };
            lowest = lowest.min(head);
        }
        if !nodes.is_empty() && lowest >= target {
            return true;
        }
        clock.sleep(policy.interval).await;
    }
    false
}

/// Check whether the transaction was committed into the chain.
///
/// The target is the block after the transaction's reference block. The
/// transaction counts as included iff that block has at least one cycle
/// and the first entry's first signature matches the transaction's. A
/// missing target block, an empty block, or a signature mismatch are all
/// normal negative evidence.
pub async fn find_in_chain(
    node: &dyn NodeApi,
    tx: &TransactionRecord,
) -> Result<InclusionEvidence, ProbeError> {
    let target_block = tx.ref_block_num + 1;
    let block = match node.get_block(target_block).await {
        Ok(value) => BlockRecord::from_value(value)?,
        Err(ClusterError::NotFound { .. }) => {
            return Ok(InclusionEvidence { target_block, included: false });
        }
        Err(e) => return Err(e.into()),
    };

    let included = match (block.first_signature(), tx.first_signature()) {
        (Some(in_block), Some(submitted)) => in_block == submitted,
        _ => false,
    };
    Ok(InclusionEvidence { target_block, included })
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        sync::{
            atomic::{AtomicU64, Ordering},
            Arc,
        },
    };

    use async_trait::async_trait;
    use gauntlet_cluster::{Account, ChainInfo, PushOutcome};
    use gauntlet_config::InstantClock;
    use serde_json::{json, Value};

    use super::*;

    /// A node stub that knows one transaction and one block.
    struct StubNode {
        tx: Option<Value>,
        block: Option<Value>,
        info_calls: AtomicU64,
        /// Transaction becomes visible after this many lookups.
        visible_after: u64,
        lookups: AtomicU64,
    }

    impl StubNode {
        fn new(tx: Option<Value>, block: Option<Value>) -> Self {
            Self {
                tx,
                block,
                info_calls: AtomicU64::new(0),
                visible_after: 0,
                lookups: AtomicU64::new(0),
            }
        }
    }

    #[async_trait]
    impl NodeApi for StubNode {
        async fn get_info(&self) -> Result<ChainInfo, ClusterError> {
            let calls = self.info_calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ChainInfo { head_block_num: calls })
        }

        async fn get_block(&self, block_num: u64) -> Result<Value, ClusterError> {
            self.block
                .clone()
                .ok_or(ClusterError::NotFound { what: format!("block {block_num}") })
        }

        async fn get_transaction(&self, id: &str) -> Result<Value, ClusterError> {
            let lookups = self.lookups.fetch_add(1, Ordering::SeqCst) + 1;
            if lookups <= self.visible_after {
                return Err(ClusterError::NotFound { what: format!("transaction {id}") });
            }
            self.tx
                .clone()
                .ok_or(ClusterError::NotFound { what: format!("transaction {id}") })
        }

        async fn push_message(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<PushOutcome, ClusterError> {
            unimplemented!("not exercised by probe tests")
        }

        async fn create_account(
            &self,
            _: &Account,
            _: &Account,
            _: u64,
            _: bool,
        ) -> Result<String, ClusterError> {
            unimplemented!("not exercised by probe tests")
        }

        async fn publish_contract(
            &self,
            _: &str,
            _: &Path,
            _: &Path,
            _: bool,
        ) -> Result<Value, ClusterError> {
            unimplemented!("not exercised by probe tests")
        }
    }

    fn tx_record() -> TransactionRecord {
        TransactionRecord {
            id: "abc".to_string(),
            ref_block_num: 7,
            signatures: vec!["SIG_1".to_string()],
        }
    }

    fn block_with(signature: &str) -> Value {
        json!({
            "block_num": 8,
            "cycles": [[{ "user_input": [{ "signatures": [signature] }] }]]
        })
    }

    #[tokio::test]
    async fn test_find_in_chain_matching_signature() {
        let node = StubNode::new(None, Some(block_with("SIG_1")));
        let evidence = find_in_chain(&node, &tx_record()).await.unwrap();
        assert_eq!(evidence.target_block, 8);
        assert!(evidence.included);
    }

    #[tokio::test]
    async fn test_find_in_chain_signature_mismatch() {
        let node = StubNode::new(None, Some(block_with("SIG_other")));
        let evidence = find_in_chain(&node, &tx_record()).await.unwrap();
        assert!(!evidence.included);
    }

    #[tokio::test]
    async fn test_find_in_chain_empty_block_is_negative() {
        let node = StubNode::new(None, Some(json!({ "block_num": 8, "cycles": [] })));
        let evidence = find_in_chain(&node, &tx_record()).await.unwrap();
        assert!(!evidence.included);
    }

    #[tokio::test]
    async fn test_find_in_chain_missing_block_is_negative() {
        let node = StubNode::new(None, None);
        let evidence = find_in_chain(&node, &tx_record()).await.unwrap();
        assert!(!evidence.included);
    }

    #[tokio::test]
    async fn test_wait_for_transaction_times_out_without_delay() {
        let node = StubNode::new(None, None);
        let clock = InstantClock::new();
        let policy = RetryPolicy::new(5, std::time::Duration::from_secs(1));
        assert!(!wait_for_transaction(&node, "abc", policy, &clock).await);
        assert_eq!(clock.sleep_count(), 5);
    }

    #[tokio::test]
    async fn test_wait_for_transaction_finds_late_arrival() {
        let tx = json!({
            "transaction_id": "abc",
            "transaction": { "ref_block_num": 7, "signatures": ["SIG_1"] }
        });
        let mut node = StubNode::new(Some(tx), None);
        node.visible_after = 2;
        let clock = InstantClock::new();
        let policy = RetryPolicy::new(5, std::time::Duration::from_secs(1));
        assert!(wait_for_transaction(&node, "abc", policy, &clock).await);
        assert_eq!(clock.sleep_count(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_block_height_reaches_target() {
        let nodes = vec![
            NodeHandle { index: 0, api: Arc::new(StubNode::new(None, None)) },
            NodeHandle { index: 1, api: Arc::new(StubNode::new(None, None)) },
        ];
        let clock = InstantClock::new();
        let policy = RetryPolicy::new(10, std::time::Duration::from_secs(1));
        assert!(wait_for_block_height(&nodes, 3, policy, &clock).await);
    }

    #[tokio::test]
    async fn test_wait_for_block_height_empty_cluster_times_out() {
        let clock = InstantClock::new();
        let policy = RetryPolicy::new(2, std::time::Duration::from_secs(1));
        assert!(!wait_for_block_height(&[], 1, policy, &clock).await);
    }
}
