//! Probe error types.

use gauntlet_cluster::ClusterError;

/// Errors from probing nodes for transactions and blocks.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// A node returned a payload that does not match the expected shape.
    #[error("malformed {what} payload: {source}")]
    Malformed {
        /// Which record failed to decode.
        what: &'static str,
        /// The decode failure.
        source: serde_json::Error,
    },

    /// The underlying node call failed.
    #[error(transparent)]
    Node(#[from] ClusterError),
}
