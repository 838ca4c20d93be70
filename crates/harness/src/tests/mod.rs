//! Full-pipeline tests against the in-memory driver.

mod scenarios;

use std::path::Path;

use gauntlet_config::RunConfig;

/// A run configuration rooted in a temporary directory so parallel tests
/// never share staging or data trees.
fn test_config(root: &Path) -> RunConfig {
    RunConfig {
        staging_dir: root.join("staging"),
        data_dir: root.join("var"),
        ..Default::default()
    }
}
