//! Run configuration for the gauntlet harness.
//!
//! Everything the original drivers kept as ambient module state (wait
//! timeouts, branch compatibility, teardown behavior, binary locations)
//! lives in an immutable [`RunConfig`] value built once by the CLI and
//! passed by reference through the pipeline.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/gauntlet-harness/gauntlet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::ConfigError;

mod run;
pub use run::{RunConfig, DEFAULT_WAIT_TIMEOUT_SECS};

mod retry;
pub use retry::{Clock, InstantClock, RetryPolicy, SystemClock, DEFAULT_POLL_INTERVAL};
