//! Top-level run configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default total wait for propagation and startup polls, in seconds.
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 90;

/// Default staging root for generated node configuration.
pub const DEFAULT_STAGING_DIR: &str = "staging";

/// Default data root for per-node runtime state and logs.
pub const DEFAULT_DATA_DIR: &str = "var/lib";

/// Complete configuration for one harness run.
///
/// Built once by the CLI (file plus flag overrides) and never mutated
/// afterwards; every component receives it by reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunConfig {
    /// Path to the external ledger node binary.
    #[serde(default = "default_node_bin")]
    pub node_bin: PathBuf,

    /// Path to the external wallet daemon binary.
    #[serde(default = "default_wallet_bin")]
    pub wallet_bin: PathBuf,

    /// Path to the signing client binary used for transactional calls.
    #[serde(default = "default_client_bin")]
    pub client_bin: PathBuf,

    /// Root directory for staged per-node configuration.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Root directory for per-node runtime data and log capture.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Contract code published during the scenario.
    #[serde(default = "default_contract_code")]
    pub contract_code: PathBuf,

    /// ABI for the published contract.
    #[serde(default = "default_contract_abi")]
    pub contract_abi: PathBuf,

    /// Total wait allowed for startup and propagation polls, in seconds.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,

    /// Use the pre-rename wire conventions for pushed payloads.
    #[serde(default)]
    pub legacy_wire: bool,

    /// Keep per-node data directories after a successful run.
    #[serde(default)]
    pub keep_logs: bool,

    /// Dump staged configuration and node stderr on failure.
    #[serde(default)]
    pub dump_error_details: bool,

    /// Tear the cluster down when the run finishes.
    #[serde(default = "default_teardown")]
    pub teardown: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            node_bin: default_node_bin(),
            wallet_bin: default_wallet_bin(),
            client_bin: default_client_bin(),
            staging_dir: default_staging_dir(),
            data_dir: default_data_dir(),
            contract_code: default_contract_code(),
            contract_abi: default_contract_abi(),
            wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
            legacy_wire: false,
            keep_logs: false,
            dump_error_details: false,
            teardown: true,
        }
    }
}

impl RunConfig {
    /// Build a configuration from an optional file path.
    ///
    /// With no path the defaults apply. A `.json` extension selects the
    /// JSON format; any other path is read as TOML. Fields absent from
    /// the file keep their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else { return Ok(Self::default()) };
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Total wait allowed for polls, as a [`std::time::Duration`].
    pub const fn wait_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.wait_timeout_secs)
    }
}

fn default_node_bin() -> PathBuf {
    PathBuf::from("ledgerd")
}

fn default_wallet_bin() -> PathBuf {
    PathBuf::from("walletd")
}

fn default_client_bin() -> PathBuf {
    PathBuf::from("ledger-cli")
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STAGING_DIR)
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_contract_code() -> PathBuf {
    PathBuf::from("contracts/currency/currency.wast")
}

fn default_contract_abi() -> PathBuf {
    PathBuf::from("contracts/currency/currency.abi")
}

const fn default_wait_timeout() -> u64 {
    DEFAULT_WAIT_TIMEOUT_SECS
}

const fn default_teardown() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_external_binaries() {
        let config = RunConfig::default();
        assert_eq!(config.node_bin, PathBuf::from("ledgerd"));
        assert_eq!(config.wallet_bin, PathBuf::from("walletd"));
        assert_eq!(config.client_bin, PathBuf::from("ledger-cli"));
        assert_eq!(config.wait_timeout_secs, DEFAULT_WAIT_TIMEOUT_SECS);
        assert!(config.teardown);
        assert!(!config.legacy_wire);
    }

    #[test]
    fn test_no_path_yields_defaults() {
        assert_eq!(RunConfig::load(None).unwrap(), RunConfig::default());
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gauntlet.toml");
        std::fs::write(&path, "wait_timeout_secs = 30\nkeep_logs = true\n").unwrap();

        let config = RunConfig::load(Some(&path)).unwrap();
        assert_eq!(config.wait_timeout_secs, 30);
        assert!(config.keep_logs);
        // Everything the file leaves out stays at its default.
        assert_eq!(config.staging_dir, PathBuf::from(DEFAULT_STAGING_DIR));
    }

    #[test]
    fn test_json_extension_selects_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gauntlet.json");
        std::fs::write(&path, r#"{"legacy_wire": true}"#).unwrap();

        let config = RunConfig::load(Some(&path)).unwrap();
        assert!(config.legacy_wire);
    }

    #[test]
    fn test_unreadable_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = RunConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { path: p, .. } if p == path));
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gauntlet.toml");
        std::fs::write(&path, "wait_timeout_secs = [").unwrap();
        assert!(matches!(RunConfig::load(Some(&path)).unwrap_err(), ConfigError::Toml(_)));
    }

    #[test]
    fn test_toml_render_round_trips() {
        let config = RunConfig { wait_timeout_secs: 7, ..Default::default() };
        let rendered = config.to_toml().unwrap();
        assert_eq!(toml::from_str::<RunConfig>(&rendered).unwrap(), config);
    }
}
