//! On-disk staging of a scenario's per-node configuration.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{ScenarioError, ScenarioSpec};

/// Name of the rendered node configuration file.
const CONFIG_FILE: &str = "config.ini";

/// Name of the rendered logging descriptor file.
const LOGGING_FILE: &str = "logging.json";

/// Stages scenario configuration under a root directory and owns its
/// removal.
///
/// The layout is scenario-scoped: it must not exist when [`Staging::stage`]
/// runs and is removed by [`Staging::clean`] when the scenario finishes,
/// success or failure.
#[derive(Debug, Clone)]
pub struct Staging {
    root: PathBuf,
}

impl Staging {
    /// A staging manager rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The staging root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Materialize the spec into `<root>/etc/node_NN/{config.ini,logging.json}`.
    ///
    /// Fails with [`ScenarioError::StagingConflict`] if the root already
    /// exists; callers run [`Staging::clean`] first. The must-be-clean
    /// contract is deliberate: a half-removed layout from an earlier run
    /// should fail loudly rather than be silently overwritten.
    pub fn stage(&self, spec: &ScenarioSpec) -> Result<StagingLayout, ScenarioError> {
        if self.root.exists() {
            return Err(ScenarioError::StagingConflict { path: self.root.clone() });
        }

        let mut node_dirs = Vec::with_capacity(spec.nodes.len());
        for (index, node) in spec.nodes.iter().enumerate() {
            let dir = self.root.join("etc").join(format!("node_{index:02}"));
            fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

            let config = dir.join(CONFIG_FILE);
            fs::write(&config, node.settings.render()).map_err(|e| io_err(&config, e))?;

            let logging = dir.join(LOGGING_FILE);
            fs::write(&logging, node.logging.to_json()?).map_err(|e| io_err(&logging, e))?;

            node_dirs.push(dir);
        }

        Ok(StagingLayout { root: self.root.clone(), node_dirs })
    }

    /// Remove the staging root. Idempotent: a missing root is a no-op.
    pub fn clean(&self) -> Result<(), ScenarioError> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|e| io_err(&self.root, e))?;
        }
        Ok(())
    }
}

/// The directory tree produced by one staging pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingLayout {
    root: PathBuf,
    node_dirs: Vec<PathBuf>,
}

impl StagingLayout {
    /// The staging root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of staged nodes.
    pub fn node_count(&self) -> usize {
        self.node_dirs.len()
    }

    /// Configuration directory for the given node index.
    pub fn node_dir(&self, index: usize) -> Option<&Path> {
        self.node_dirs.get(index).map(PathBuf::as_path)
    }

    /// Path to the rendered configuration file for the given node index.
    pub fn config_file(&self, index: usize) -> Option<PathBuf> {
        self.node_dirs.get(index).map(|d| d.join(CONFIG_FILE))
    }

    /// Iterate over staged node configuration directories.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.node_dirs.iter().map(PathBuf::as_path)
    }
}

fn io_err(path: &Path, source: std::io::Error) -> ScenarioError {
    ScenarioError::Io { path: path.to_path_buf(), source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_scenario, ScenarioKind};

    #[test]
    fn test_stage_writes_config_and_logging_per_node() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path().join("staging"));
        let spec = build_scenario(ScenarioKind::NoMalicious);

        let layout = staging.stage(&spec).unwrap();
        assert_eq!(layout.node_count(), 2);
        for (index, node_dir) in layout.iter().enumerate() {
            assert!(node_dir.ends_with(format!("etc/node_{index:02}")));
            assert!(node_dir.join(CONFIG_FILE).is_file());
            assert!(node_dir.join(LOGGING_FILE).is_file());
        }

        let config = std::fs::read_to_string(layout.config_file(1).unwrap()).unwrap();
        assert!(config.contains("http-server-address = 127.0.0.1:8889"));
    }

    #[test]
    fn test_stage_conflicts_on_existing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("staging");
        std::fs::create_dir_all(&root).unwrap();

        let staging = Staging::new(&root);
        let spec = build_scenario(ScenarioKind::NoMalicious);
        assert!(matches!(
            staging.stage(&spec),
            Err(ScenarioError::StagingConflict { path }) if path == root
        ));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path().join("staging"));

        // Nothing staged yet: still a no-op success.
        staging.clean().unwrap();

        let spec = build_scenario(ScenarioKind::MinorityMalicious);
        staging.stage(&spec).unwrap();
        assert!(staging.root().exists());

        staging.clean().unwrap();
        assert!(!staging.root().exists());
        staging.clean().unwrap();
    }

    #[test]
    fn test_clean_then_stage_succeeds_again() {
        let dir = tempfile::tempdir().unwrap();
        let staging = Staging::new(dir.path().join("staging"));
        let spec = build_scenario(ScenarioKind::MajorityMalicious);

        staging.stage(&spec).unwrap();
        staging.clean().unwrap();
        staging.stage(&spec).unwrap();
    }
}
