//! Scenario and staging error types.

use std::path::PathBuf;

/// Errors from scenario construction and staging.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The scenario selector did not name a known scenario.
    #[error("unrecognized scenario selector {0:?} (expected 1, 2, or 3)")]
    InvalidKind(String),

    /// The staging root already exists.
    ///
    /// `stage()` requires a clean root; callers run `clean()` first.
    #[error("staging root {path} already exists; run clean() before stage()")]
    StagingConflict {
        /// The conflicting staging root.
        path: PathBuf,
    },

    /// Filesystem failure while staging or cleaning.
    #[error("staging io at {path}: {source}")]
    Io {
        /// The path being written or removed.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to encode the logging descriptor.
    #[error("failed to encode logging descriptor: {0}")]
    Json(#[from] serde_json::Error),
}
