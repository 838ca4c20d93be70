//! Transaction propagation and inclusion probing.
//!
//! The protocol convention is that a transaction referencing block `N`
//! is expected to be committed in block `N + 1`. The probe fetches that
//! block and compares the first recorded signature of its first
//! execution cycle against the submitted transaction's first signature;
//! anything else is a normal negative result, never an error.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/gauntlet-harness/gauntlet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::ProbeError;

mod probe;
pub use probe::{find_in_chain, transaction, wait_for_block_height, wait_for_transaction, InclusionEvidence};

mod records;
pub use records::{BlockRecord, CycleEntry, TransactionEntry, TransactionRecord};
