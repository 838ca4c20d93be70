//! End-to-end scenario execution.
//!
//! Wires the other crates into one pipeline per scenario: stage, launch,
//! register, publish, push, probe, verify, tear down. The pipeline only
//! talks to the cluster through the [`gauntlet_cluster::ClusterDriver`]
//! seam, so the tests in this crate run the full pipeline against the
//! deterministic in-memory driver.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/gauntlet-harness/gauntlet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::{Failure, HarnessError, Stage};

mod remote;
pub use remote::{run_remote, DEFAULT_SYNC_BLOCKS};

mod run;
pub use run::{run_all, run_scenario, BatchReport, ScenarioResult};

#[cfg(test)]
mod tests;
