//! Adversarial scenario construction and staging.
//!
//! A scenario is a deterministic set of per-node configurations tagged
//! with the outcome the Byzantine threshold predicts: safety holds while
//! malicious producers hold less than a third of the roster, so a pushed
//! transaction enters the chain for the no-malicious and minority
//! scenarios and stays out for the majority scenario.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/gauntlet-harness/gauntlet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod builder;
pub use builder::{build_scenario, ExpectedOutcome, ScenarioKind, ScenarioSpec, StagedNode};

mod error;
pub use error::ScenarioError;

mod logging;
pub use logging::{Appender, Logger, LoggingDescriptor};

mod settings;
pub use settings::{KeyPair, NodeSettings};

mod staging;
pub use staging::{Staging, StagingLayout};
