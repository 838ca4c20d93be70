//! Typed per-node settings and their line-oriented rendering.

use serde::{Deserialize, Serialize};

/// A signing key pair as the node expects it: public key first, private
/// key second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    /// Public key.
    pub public: String,
    /// Private key.
    pub private: String,
}

impl KeyPair {
    /// The well-known development key pair shared by the genesis producers.
    pub fn genesis() -> Self {
        Self {
            public: "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV".to_string(),
            private: "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3".to_string(),
        }
    }
}

/// Settings for one node, rendered to the line-oriented `key = value`
/// configuration file the node binary consumes.
///
/// `producer-name` and `plugin` are repeatable keys; everything else
/// appears exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Path to the genesis document, relative to the node's config dir.
    pub genesis: String,
    /// Block log directory.
    pub block_log_dir: String,
    /// Read-only mode.
    pub readonly: bool,
    /// Forward whole blocks rather than summaries.
    pub send_whole_blocks: bool,
    /// Shared-memory file directory.
    pub shared_file_dir: String,
    /// Shared-memory file size in megabytes.
    pub shared_file_size: u64,
    /// HTTP API listen address.
    pub http_address: String,
    /// Peer-to-peer listen endpoint.
    pub p2p_listen: String,
    /// Peer-to-peer advertised address.
    pub p2p_server: String,
    /// Allowed-connection policy.
    pub allowed_connection: String,
    /// Peer addresses to dial.
    pub peers: Vec<String>,
    /// Require configured producer participation before producing.
    pub required_participation: bool,
    /// Signing key pairs.
    pub keys: Vec<KeyPair>,
    /// Producer names this node signs for (repeatable).
    pub producers: Vec<String>,
    /// Plugins to enable (repeatable).
    pub plugins: Vec<String>,
    /// Override for per-transaction execution time, in milliseconds.
    ///
    /// Zero simulates a malicious producer: the node accepts nothing.
    pub max_transaction_exec_time: Option<u64>,
}

impl NodeSettings {
    /// Whether these settings describe a malicious producer.
    pub fn is_malicious(&self) -> bool {
        self.max_transaction_exec_time == Some(0)
    }

    /// Render the settings as the node's `key = value` configuration file.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut line = |k: &str, v: String| {
            out.push_str(k);
            out.push_str(" = ");
            out.push_str(&v);
            out.push('\n');
        };

        line("genesis-json", self.genesis.clone());
        line("block-log-dir", self.block_log_dir.clone());
        line("readonly", u8::from(self.readonly).to_string());
        line("send-whole-blocks", self.send_whole_blocks.to_string());
        line("shared-file-dir", self.shared_file_dir.clone());
        line("shared-file-size", self.shared_file_size.to_string());
        line("http-server-address", self.http_address.clone());
        line("p2p-listen-endpoint", self.p2p_listen.clone());
        line("p2p-server-address", self.p2p_server.clone());
        line("allowed-connection", self.allowed_connection.clone());
        for peer in &self.peers {
            line("p2p-peer-address", peer.clone());
        }
        line("required-participation", self.required_participation.to_string());
        for key in &self.keys {
            line("private-key", format!("[\"{}\",\"{}\"]", key.public, key.private));
        }
        for producer in &self.producers {
            line("producer-name", producer.clone());
        }
        for plugin in &self.plugins {
            line("plugin", plugin.clone());
        }
        if let Some(limit) = self.max_transaction_exec_time {
            line("trans-execution-time", limit.to_string());
        }
        out
    }
}
