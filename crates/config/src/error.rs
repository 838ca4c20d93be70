//! Error type for run-configuration loading.

use std::path::PathBuf;

/// Failure while building or rendering a [`crate::RunConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("unable to read run configuration {path}: {source}")]
    Read {
        /// Path given on the command line.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The file did not parse as TOML.
    #[error("run configuration is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file did not parse as JSON.
    #[error("run configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration could not be rendered back to TOML.
    #[error("unable to render run configuration: {0}")]
    Render(#[from] toml::ser::Error),
}
