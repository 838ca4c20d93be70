//! Cluster lifecycle control.
//!
//! The harness treats the ledger node, the wallet daemon, and the signing
//! client as external collaborators. This crate owns launching them,
//! polling them to liveness, issuing account/contract/transaction calls
//! against them, and tearing everything down again. All of that sits
//! behind the [`ClusterDriver`] seam so the scenario pipeline can also run
//! against the deterministic in-memory driver in [`mock`].

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/gauntlet-harness/gauntlet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod account;
pub use account::{Account, Wallet};

mod api;
pub use api::{ChainInfo, NodeApi, PushOutcome, WalletApi, EXPECTED_REJECTION};

mod diagnostics;
pub use diagnostics::dump_error_details;

mod driver;
pub use driver::{ClusterDriver, ClusterHandle, LaunchOpts, NodeHandle, Topology, WalletHandle};

mod error;
pub use error::ClusterError;

pub mod mock;

mod process;
pub use process::ProcessDriver;
