//! Deterministic in-memory cluster driver.
//!
//! Implements the same [`ClusterDriver`] seam as the real-process driver
//! against a single shared in-memory chain, so the full scenario pipeline
//! runs in unit tests without external binaries. Behavior is derived from
//! the staged configuration files, exercising the same artifacts the real
//! node would read: a node staged with a zero execution-time limit
//! rejects pushes with the expected processing-time detail, and a pushed
//! transaction is committed into block `ref_block_num + 1` only while
//! malicious producers hold less than a third of the staged roster.

use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use gauntlet_scenario::{KeyPair, StagingLayout};
use serde_json::{json, Value};

use crate::{
    Account, ChainInfo, ClusterDriver, ClusterError, ClusterHandle, LaunchOpts, NodeApi,
    NodeHandle, PushOutcome, Wallet, WalletApi, WalletHandle, EXPECTED_REJECTION,
};

#[derive(Debug, Default)]
struct MockState {
    launched: bool,
    head: u64,
    tx_counter: u64,
    key_counter: u64,
    // Derived from staged config at launch.
    malicious: Vec<bool>,
    producer_counts: Vec<usize>,
    transactions: HashMap<String, Value>,
    blocks: HashMap<u64, Value>,
    accounts: Vec<String>,
    contracts: Vec<String>,
    wallets: Vec<String>,
    imported_keys: usize,
    killall_calls: usize,
    cleanup_calls: usize,
    fail_wallet: bool,
}

impl MockState {
    /// Whether the staged roster keeps malicious producers under a third.
    fn honest_majority(&self) -> bool {
        let total: usize = self.producer_counts.iter().sum();
        let malicious: usize = self
            .producer_counts
            .iter()
            .zip(&self.malicious)
            .filter(|(_, m)| **m)
            .map(|(c, _)| *c)
            .sum();
        malicious * 3 < total
    }
}

/// In-memory stand-in for a real node cluster.
#[derive(Debug, Default, Clone)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    /// A fresh driver with no running cluster.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }

    /// Whether a launch is active (not yet killed).
    pub fn is_running(&self) -> bool {
        self.state().launched
    }

    /// Number of `killall` calls observed.
    pub fn killall_calls(&self) -> usize {
        self.state().killall_calls
    }

    /// Number of `cleanup` calls observed.
    pub fn cleanup_calls(&self) -> usize {
        self.state().cleanup_calls
    }

    /// Number of keys imported into wallets.
    pub fn imported_keys(&self) -> usize {
        self.state().imported_keys
    }

    /// Make the next wallet launch fail, for teardown-path tests.
    pub fn fail_wallet(&self, fail: bool) {
        self.state().fail_wallet = fail;
    }
}

#[async_trait]
impl ClusterDriver for MockDriver {
    async fn launch(
        &self,
        layout: &StagingLayout,
        opts: &LaunchOpts,
    ) -> Result<ClusterHandle, ClusterError> {
        if opts.nodes > layout.node_count() {
            return Err(ClusterError::Launch {
                detail: format!(
                    "requested {} nodes but only {} are staged",
                    opts.nodes,
                    layout.node_count()
                ),
            });
        }

        let mut malicious = Vec::with_capacity(opts.nodes);
        let mut producer_counts = Vec::with_capacity(opts.nodes);
        for index in 0..opts.nodes {
            let config = layout.config_file(index).ok_or_else(|| ClusterError::Launch {
                detail: format!("node {index} has no staged configuration"),
            })?;
            let (producers, is_malicious) = read_staged_config(&config)?;
            malicious.push(is_malicious);
            producer_counts.push(producers);
        }

        let mut state = self.state();
        state.launched = true;
        state.malicious = malicious;
        state.producer_counts = producer_counts;

        let nodes = (0..opts.nodes)
            .map(|index| NodeHandle {
                index,
                api: Arc::new(MockNode { index, state: self.state.clone() }) as Arc<dyn NodeApi>,
            })
            .collect();
        Ok(ClusterHandle { nodes })
    }

    async fn launch_wallet(&self) -> Result<WalletHandle, ClusterError> {
        let state = self.state();
        if !state.launched {
            return Err(ClusterError::WalletLaunch {
                detail: "no cluster is running".to_string(),
            });
        }
        if state.fail_wallet {
            return Err(ClusterError::WalletLaunch {
                detail: "injected wallet launch failure".to_string(),
            });
        }
        drop(state);
        Ok(WalletHandle { api: Arc::new(MockWallet { state: self.state.clone() }) })
    }

    async fn create_account_keys(&self, count: usize) -> Result<Vec<Account>, ClusterError> {
        let mut state = self.state();
        let mut accounts = Vec::with_capacity(count);
        for _ in 0..count {
            let owner = next_key(&mut state);
            let active = next_key(&mut state);
            accounts.push(Account::from_keys(owner, active));
        }
        Ok(accounts)
    }

    async fn killall(&self) {
        let mut state = self.state();
        state.killall_calls += 1;
        state.launched = false;
    }

    async fn cleanup(&self) {
        let mut state = self.state();
        state.cleanup_calls += 1;
        state.head = 0;
        state.transactions.clear();
        state.blocks.clear();
        state.accounts.clear();
        state.contracts.clear();
        state.wallets.clear();
        state.imported_keys = 0;
    }
}

fn next_key(state: &mut MockState) -> KeyPair {
    state.key_counter += 1;
    KeyPair {
        public: format!("PUB_mock_{:04}", state.key_counter),
        private: format!("PVT_mock_{:04}", state.key_counter),
    }
}

/// Producer count and malice marker from one staged config file.
fn read_staged_config(path: &Path) -> Result<(usize, bool), ClusterError> {
    let contents = fs::read_to_string(path)?;
    let producers = contents.lines().filter(|l| l.starts_with("producer-name = ")).count();
    let malicious = contents.lines().any(|l| l.trim() == "trans-execution-time = 0");
    Ok((producers, malicious))
}

struct MockNode {
    index: usize,
    state: Arc<Mutex<MockState>>,
}

impl MockNode {
    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state poisoned")
    }
}

#[async_trait]
impl NodeApi for MockNode {
    async fn get_info(&self) -> Result<ChainInfo, ClusterError> {
        let mut state = self.state();
        // The mock chain produces one (possibly empty) block per poll.
        state.head += 1;
        Ok(ChainInfo { head_block_num: state.head })
    }

    async fn get_block(&self, block_num: u64) -> Result<Value, ClusterError> {
        let state = self.state();
        if let Some(block) = state.blocks.get(&block_num) {
            return Ok(block.clone());
        }
        if block_num <= state.head {
            return Ok(json!({ "block_num": block_num, "cycles": [] }));
        }
        Err(ClusterError::NotFound { what: format!("block {block_num}") })
    }

    async fn get_transaction(&self, id: &str) -> Result<Value, ClusterError> {
        // The chain is shared, so a transaction accepted anywhere is
        // visible from every node, matching gossip propagation.
        self.state()
            .transactions
            .get(id)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound { what: format!("transaction {id}") })
    }

    async fn push_message(
        &self,
        contract: &str,
        _action: &str,
        _payload: &str,
        _opts: &str,
    ) -> Result<PushOutcome, ClusterError> {
        let mut state = self.state();
        if *state.malicious.get(self.index).unwrap_or(&false) {
            return Ok(PushOutcome {
                accepted: false,
                detail: format!("transaction rejected: {EXPECTED_REJECTION}"),
            });
        }
        if !state.contracts.iter().any(|c| c == contract) {
            return Ok(PushOutcome {
                accepted: false,
                detail: format!("no contract published for account {contract}"),
            });
        }

        state.tx_counter += 1;
        let id = format!("{:016x}", state.tx_counter);
        let signature = format!("SIG_mock_{:04}", state.tx_counter);
        let ref_block = state.head;

        state.transactions.insert(
            id.clone(),
            json!({
                "transaction_id": id,
                "transaction": {
                    "ref_block_num": ref_block,
                    "signatures": [signature],
                }
            }),
        );

        // Safety holds only with an honest two-thirds majority: the
        // transaction lands in the block after its reference block, or
        // that block stays empty.
        let target = ref_block + 1;
        let cycles = if state.honest_majority() {
            json!([[{ "user_input": [{ "signatures": [signature] }] }]])
        } else {
            json!([])
        };
        state.blocks.insert(target, json!({ "block_num": target, "cycles": cycles }));
        state.head = state.head.max(target);

        Ok(PushOutcome { accepted: true, detail: json!({ "transaction_id": id }).to_string() })
    }

    async fn create_account(
        &self,
        account: &Account,
        creator: &Account,
        _stake: u64,
        _wait_for_block: bool,
    ) -> Result<String, ClusterError> {
        let mut state = self.state();
        if account.name.is_empty() {
            return Err(ClusterError::AccountCreation {
                account: account.name.clone(),
                detail: "account has no name".to_string(),
            });
        }
        if state.accounts.iter().any(|a| a == &account.name) {
            return Err(ClusterError::AccountCreation {
                account: account.name.clone(),
                detail: format!("account already exists (creator {})", creator.name),
            });
        }
        state.accounts.push(account.name.clone());
        state.head += 1;
        Ok(format!("acct-{}", account.name))
    }

    async fn publish_contract(
        &self,
        account: &str,
        _code: &Path,
        _abi: &Path,
        _wait_for_block: bool,
    ) -> Result<Value, ClusterError> {
        let mut state = self.state();
        if !state.accounts.iter().any(|a| a == account) {
            return Err(ClusterError::ContractPublish {
                account: account.to_string(),
                detail: "account does not exist".to_string(),
            });
        }
        state.contracts.push(account.to_string());
        state.head += 1;
        Ok(json!({ "transaction_id": format!("pub-{account}") }))
    }
}

struct MockWallet {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl WalletApi for MockWallet {
    async fn create(&self, name: &str) -> Result<Wallet, ClusterError> {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.wallets.push(name.to_string());
        Ok(Wallet { name: name.to_string(), password: format!("PW_{name}") })
    }

    async fn import_key(&self, _account: &Account, _wallet: &Wallet) -> Result<bool, ClusterError> {
        self.state.lock().expect("mock state poisoned").imported_keys += 1;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_scenario::{build_scenario, ScenarioKind, Staging};

    fn staged(kind: ScenarioKind) -> (tempfile::TempDir, StagingLayout) {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path().join("staging"));
        let layout = staging.stage(&build_scenario(kind)).unwrap();
        (dir, layout)
    }

    async fn push_and_probe(kind: ScenarioKind) -> (PushOutcome, Option<Value>, Value) {
        let (_dir, layout) = staged(kind);
        let driver = MockDriver::new();
        let handle = driver.launch(&layout, &LaunchOpts::mesh(2)).await.unwrap();
        let node0 = &handle.nodes[0].api;
        let node1 = &handle.nodes[1].api;

        let mut currency =
            driver.create_account_keys(1).await.unwrap().into_iter().next().unwrap();
        currency.name = "currency".to_string();
        node0.create_account(&currency, &Account::funded(), 5000, true).await.unwrap();
        node0
            .publish_contract("currency", Path::new("code.wast"), Path::new("code.abi"), true)
            .await
            .unwrap();

        let push = node0.push_message("currency", "transfer", "{}", "").await.unwrap();
        let tx = match push.transaction_id() {
            Some(id) => Some(node1.get_transaction(&id).await.unwrap()),
            None => None,
        };
        let ref_block =
            tx.as_ref().map_or(0, |t| t["transaction"]["ref_block_num"].as_u64().unwrap());
        let block = node1.get_block(ref_block + 1).await.unwrap();
        (push, tx, block)
    }

    #[tokio::test]
    async fn test_honest_cluster_commits_transaction() {
        let (push, tx, block) = push_and_probe(ScenarioKind::NoMalicious).await;
        assert!(push.accepted);
        let tx = tx.unwrap();
        let signature = &tx["transaction"]["signatures"][0];
        assert_eq!(&block["cycles"][0][0]["user_input"][0]["signatures"][0], signature);
    }

    #[tokio::test]
    async fn test_minority_malicious_still_commits() {
        let (push, tx, block) = push_and_probe(ScenarioKind::MinorityMalicious).await;
        assert!(push.accepted);
        assert!(tx.is_some());
        assert!(block["cycles"].as_array().is_some_and(|c| !c.is_empty()));
    }

    #[tokio::test]
    async fn test_majority_malicious_leaves_block_empty() {
        let (push, tx, block) = push_and_probe(ScenarioKind::MajorityMalicious).await;
        // The serving node is honest, so the push is accepted and the
        // transaction propagates, but it never reaches a block.
        assert!(push.accepted);
        assert!(tx.is_some());
        assert!(block["cycles"].as_array().is_some_and(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_malicious_serving_node_rejects_push() {
        let (_dir, layout) = staged(ScenarioKind::MinorityMalicious);
        let driver = MockDriver::new();
        let handle = driver.launch(&layout, &LaunchOpts::mesh(2)).await.unwrap();

        // Node 1 is the malicious one in the minority scenario.
        let push = handle.nodes[1].api.push_message("currency", "transfer", "{}", "").await.unwrap();
        assert!(!push.accepted);
        assert!(push.is_expected_rejection());
    }

    #[tokio::test]
    async fn test_killall_and_cleanup_are_tolerant() {
        let driver = MockDriver::new();
        driver.killall().await;
        driver.cleanup().await;
        assert!(!driver.is_running());
        assert_eq!(driver.killall_calls(), 1);
        assert_eq!(driver.cleanup_calls(), 1);
    }
}
