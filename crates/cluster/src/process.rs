//! Real-process cluster driver.
//!
//! Spawns the external node and wallet binaries against the staged
//! configuration, polls their HTTP endpoints to liveness, and shells out
//! to the signing client for transactional calls. Retry loops follow the
//! bounded [`RetryPolicy`] and the injectable [`Clock`], never unbounded
//! waits.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use gauntlet_config::{Clock, RetryPolicy, RunConfig};
use gauntlet_scenario::{KeyPair, StagingLayout};
use serde_json::json;
use tokio::{process::Command, sync::Mutex};
use tracing::{debug, info, warn};

use crate::{
    Account, ChainInfo, ClusterDriver, ClusterError, ClusterHandle, LaunchOpts, NodeApi,
    NodeHandle, PushOutcome, Wallet, WalletApi, WalletHandle,
};

/// Listen address for the wallet daemon.
const WALLET_HOST: &str = "127.0.0.1:8899";

/// A child process tracked for teardown.
#[derive(Debug)]
struct Tracked {
    label: String,
    child: tokio::process::Child,
}

/// Drives real external processes: the ledger node per staged config
/// directory, the wallet daemon, and the signing client.
pub struct ProcessDriver {
    config: RunConfig,
    http: reqwest::Client,
    clock: Arc<dyn Clock>,
    startup: RetryPolicy,
    children: Mutex<Vec<Tracked>>,
}

impl std::fmt::Debug for ProcessDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessDriver").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ProcessDriver {
    /// A driver for the given run configuration.
    ///
    /// The startup window for each launched process is derived from the
    /// run's wait timeout.
    pub fn new(config: RunConfig, clock: Arc<dyn Clock>) -> Self {
        let startup = RetryPolicy::deadline(config.wait_timeout(), std::time::Duration::from_secs(1));
        Self { config, http: reqwest::Client::new(), clock, startup, children: Mutex::new(Vec::new()) }
    }

    fn node_data_dir(&self, index: usize) -> PathBuf {
        self.config.data_dir.join(format!("node_{index:02}"))
    }

    async fn spawn_logged(
        &self,
        label: String,
        bin: &Path,
        args: &[&str],
        data_dir: &Path,
    ) -> Result<(), ClusterError> {
        fs::create_dir_all(data_dir)?;
        let stdout = fs::File::create(data_dir.join("stdout.log"))?;
        let stderr = fs::File::create(data_dir.join("stderr.log"))?;

        debug!(%label, bin = %bin.display(), ?args, "spawning");
        let child = Command::new(bin)
            .args(args)
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()?;
        self.children.lock().await.push(Tracked { label, child });
        Ok(())
    }

    /// Poll `probe` until it succeeds within the startup window.
    async fn await_live<F, Fut>(&self, what: &str, probe: F) -> Result<(), ClusterError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for attempt in 0..self.startup.max_attempts {
            if probe().await {
                debug!(what, attempt, "live");
                return Ok(());
            }
            self.clock.sleep(self.startup.interval).await;
        }
        Err(ClusterError::Launch {
            detail: format!("{what} did not come live within the startup window"),
        })
    }

    async fn create_key(&self) -> Result<KeyPair, ClusterError> {
        let output =
            Command::new(&self.config.client_bin).args(["create", "key"]).output().await?;
        if !output.status.success() {
            return Err(ClusterError::Launch {
                detail: format!(
                    "key creation failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                ),
            });
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// Captured output of one signing-client invocation.
#[derive(Debug)]
struct ClientOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

impl ClientOutput {
    fn detail(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            self.stderr.clone()
        }
    }
}

#[async_trait]
impl ClusterDriver for ProcessDriver {
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
        info!(
            nodes = opts.nodes,
            producers = opts.producers,
            topology = %opts.topology,
            "standing up cluster"
        );

        let mut nodes = Vec::with_capacity(opts.nodes);
        for index in 0..opts.nodes {
            let node_dir = layout.node_dir(index).ok_or_else(|| ClusterError::Launch {
                detail: format!("node {index} has no staged configuration"),
            })?;
            let host = read_config_value(&node_dir.join("config.ini"), "http-server-address")?
                .ok_or_else(|| ClusterError::Launch {
                    detail: format!("node {index} staging has no http-server-address"),
                })?;
            let data_dir = self.node_data_dir(index);

            let config_arg = node_dir.display().to_string();
            let data_arg = data_dir.display().to_string();
            self.spawn_logged(
                format!("node_{index:02}"),
                &self.config.node_bin,
                &["--config-dir", &config_arg, "--data-dir", &data_arg],
                &data_dir,
            )
            .await?;

            nodes.push(NodeHandle {
                index,
                api: Arc::new(HttpNode {
                    host,
                    http: self.http.clone(),
                    client_bin: self.config.client_bin.clone(),
                    clock: self.clock.clone(),
                    confirm: self.startup,
                }),
            });

            if !opts.start_delay.is_zero() && index + 1 < opts.nodes {
                self.clock.sleep(opts.start_delay).await;
            }
        }

        // Every node must answer get_info within the startup window.
        for handle in &nodes {
            let api = handle.api.clone();
            self.await_live(&format!("node {}", handle.index), || {
                let api = api.clone();
                async move { api.get_info().await.is_ok() }
            })
            .await?;
        }

        Ok(ClusterHandle { nodes })
    }

    async fn launch_wallet(&self) -> Result<WalletHandle, ClusterError> {
        let data_dir = self.config.data_dir.join("wallet");
        let wallet_dir = data_dir.display().to_string();
        self.spawn_logged(
            "wallet".to_string(),
            &self.config.wallet_bin,
            &["--http-server-address", WALLET_HOST, "--wallet-dir", &wallet_dir],
            &data_dir,
        )
        .await?;

        let wallet =
            HttpWallet { host: WALLET_HOST.to_string(), http: self.http.clone() };
        let probe_wallet = wallet.clone();
        self.await_live("wallet", || {
            let wallet = probe_wallet.clone();
            async move { wallet.list().await }
        })
        .await
        .map_err(|_| ClusterError::WalletLaunch {
            detail: "wallet daemon did not come live within the startup window".to_string(),
        })?;

        Ok(WalletHandle { api: Arc::new(wallet) })
    }

    async fn create_account_keys(&self, count: usize) -> Result<Vec<Account>, ClusterError> {
        let mut accounts = Vec::with_capacity(count);
        for _ in 0..count {
            let owner = self.create_key().await?;
            let active = self.create_key().await?;
            accounts.push(Account::from_keys(owner, active));
        }
        Ok(accounts)
    }

    async fn killall(&self) {
        let mut children = self.children.lock().await;
        for tracked in children.iter_mut() {
            if let Err(e) = tracked.child.start_kill() {
                // Already dead is fine; teardown is best effort.
                debug!(label = %tracked.label, error = %e, "kill skipped");
            }
        }
        for tracked in children.iter_mut() {
            let _ = tracked.child.wait().await;
        }
        if !children.is_empty() {
            info!(count = children.len(), "cluster processes terminated");
        }
        children.clear();
    }

    async fn cleanup(&self) {
        let data_dir = &self.config.data_dir;
        if data_dir.exists() {
            if let Err(e) = fs::remove_dir_all(data_dir) {
                warn!(path = %data_dir.display(), error = %e, "cleanup incomplete");
            }
        }
    }
}

/// HTTP + signing-client interface to one running node.
struct HttpNode {
    host: String,
    http: reqwest::Client,
    client_bin: PathBuf,
    clock: Arc<dyn Clock>,
    confirm: RetryPolicy,
}

impl HttpNode {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.host)
    }

    async fn run_client(&self, args: &[&str]) -> Result<ClientOutput, ClusterError> {
        let (addr, port) = split_host(&self.host);
        let output = Command::new(&self.client_bin)
            .arg("--host")
            .arg(addr)
            .arg("--port")
            .arg(port)
            .args(args)
            .output()
            .await?;
        Ok(ClientOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Wait until the head block advances past `from`.
    async fn wait_for_block_past(&self, from: u64) -> bool {
        for _ in 0..self.confirm.max_attempts {
            if let Ok(info) = self.get_info().await {
                if info.head_block_num > from {
                    return true;
                }
            }
            self.clock.sleep(self.confirm.interval).await;
        }
        false
    }
}

#[async_trait]
impl NodeApi for HttpNode {
    async fn get_info(&self) -> Result<ChainInfo, ClusterError> {
        let resp = self.http.get(self.url("/v1/chain/get_info")).send().await?;
        Ok(resp.error_for_status()?.json().await?)
    }

    async fn get_block(&self, block_num: u64) -> Result<serde_json::Value, ClusterError> {
        let resp = self
            .http
            .post(self.url("/v1/chain/get_block"))
            .json(&json!({ "block_num_or_id": block_num }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClusterError::NotFound { what: format!("block {block_num}") });
        }
        Ok(resp.json().await?)
    }

    async fn get_transaction(&self, id: &str) -> Result<serde_json::Value, ClusterError> {
        let resp = self
            .http
            .post(self.url("/v1/account_history/get_transaction"))
            .json(&json!({ "transaction_id": id }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClusterError::NotFound { what: format!("transaction {id}") });
        }
        Ok(resp.json().await?)
    }

    async fn push_message(
        &self,
        contract: &str,
        action: &str,
        payload: &str,
        opts: &str,
    ) -> Result<PushOutcome, ClusterError> {
        let mut args = vec!["push", "message", contract, action, payload];
        args.extend(opts.split_whitespace());
        let output = self.run_client(&args).await?;
        if output.success {
            Ok(PushOutcome { accepted: true, detail: output.stdout })
        } else {
            Ok(PushOutcome { accepted: false, detail: output.detail() })
        }
    }

    async fn create_account(
        &self,
        account: &Account,
        creator: &Account,
        stake: u64,
        wait_for_block: bool,
    ) -> Result<String, ClusterError> {
        let stake_arg = stake.to_string();
        let output = self
            .run_client(&[
                "create",
                "account",
                &creator.name,
                &account.name,
                &account.owner.public,
                &account.active.public,
                "--stake",
                &stake_arg,
            ])
            .await?;
        if !output.success {
            return Err(ClusterError::AccountCreation {
                account: account.name.clone(),
                detail: output.detail(),
            });
        }

        let response: serde_json::Value = serde_json::from_str(&output.stdout)?;
        let tx_id = response
            .get("transaction_id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| ClusterError::AccountCreation {
                account: account.name.clone(),
                detail: "response carries no transaction id".to_string(),
            })?
            .to_string();

        if wait_for_block {
            let head = self.get_info().await?.head_block_num;
            if !self.wait_for_block_past(head).await {
                return Err(ClusterError::AccountCreation {
                    account: account.name.clone(),
                    detail: "creation was never confirmed in a block".to_string(),
                });
            }
        }
        Ok(tx_id)
    }

    async fn publish_contract(
        &self,
        account: &str,
        code: &Path,
        abi: &Path,
        wait_for_block: bool,
    ) -> Result<serde_json::Value, ClusterError> {
        let code_arg = code.display().to_string();
        let abi_arg = abi.display().to_string();
        let output = self.run_client(&["set", "contract", account, &code_arg, &abi_arg]).await?;
        if !output.success {
            return Err(ClusterError::ContractPublish {
                account: account.to_string(),
                detail: output.detail(),
            });
        }

        let response: serde_json::Value = serde_json::from_str(&output.stdout)?;
        if wait_for_block {
            let head = self.get_info().await?.head_block_num;
            if !self.wait_for_block_past(head).await {
                return Err(ClusterError::ContractPublish {
                    account: account.to_string(),
                    detail: "publication was never confirmed in a block".to_string(),
                });
            }
        }
        Ok(response)
    }
}

/// HTTP interface to the wallet daemon.
#[derive(Clone)]
struct HttpWallet {
    host: String,
    http: reqwest::Client,
}

impl HttpWallet {
    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.host)
    }

    async fn list(&self) -> bool {
        self.http
            .post(self.url("/v1/wallet/list_wallets"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl WalletApi for HttpWallet {
    async fn create(&self, name: &str) -> Result<Wallet, ClusterError> {
        let resp = self
            .http
            .post(self.url("/v1/wallet/create"))
            .json(&json!(name))
            .send()
            .await?
            .error_for_status()?;
        let password: String = resp.json().await?;
        Ok(Wallet { name: name.to_string(), password })
    }

    async fn import_key(&self, account: &Account, wallet: &Wallet) -> Result<bool, ClusterError> {
        let resp = self
            .http
            .post(self.url("/v1/wallet/import_key"))
            .json(&json!([wallet.name, account.active.private]))
            .send()
            .await?;
        if !resp.status().is_success() {
            warn!(account = %account.name, wallet = %wallet.name, "key import rejected");
            return Ok(false);
        }
        Ok(true)
    }
}

/// Read a single-valued key from a staged `key = value` config file.
fn read_config_value(path: &Path, key: &str) -> Result<Option<String>, ClusterError> {
    let contents = fs::read_to_string(path)?;
    let prefix = format!("{key} = ");
    Ok(contents
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .map(|v| v.trim().to_string()))
}

fn split_host(host: &str) -> (&str, &str) {
    host.rsplit_once(':').unwrap_or((host, "80"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_host() {
        assert_eq!(split_host("127.0.0.1:8888"), ("127.0.0.1", "8888"));
        assert_eq!(split_host("localhost"), ("localhost", "80"));
    }

    #[test]
    fn test_read_config_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "a = 1\nhttp-server-address = 127.0.0.1:8888\nb = 2\n").unwrap();
        assert_eq!(
            read_config_value(&path, "http-server-address").unwrap().as_deref(),
            Some("127.0.0.1:8888")
        );
        assert_eq!(read_config_value(&path, "missing").unwrap(), None);
    }
}
