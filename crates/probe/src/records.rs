//! Typed transaction and block records.
//!
//! The node returns loosely shaped JSON envelopes; these records give
//! them explicit fields and reject malformed shapes at the boundary
//! instead of failing on access.

use serde::Deserialize;

use crate::ProbeError;

/// A transaction as reported by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Transaction id.
    pub id: String,
    /// Block number the transaction referenced at submission.
    pub ref_block_num: u64,
    /// Signatures attached to the transaction.
    pub signatures: Vec<String>,
}

impl TransactionRecord {
    /// Decode from the node's `{"transaction_id", "transaction": {...}}`
    /// envelope.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProbeError> {
        let envelope: TxEnvelope = serde_json::from_value(value)
            .map_err(|source| ProbeError::Malformed { what: "transaction", source })?;
        Ok(Self {
            id: envelope.transaction_id,
            ref_block_num: envelope.transaction.ref_block_num,
            signatures: envelope.transaction.signatures,
        })
    }

    /// The signature the inclusion check compares against.
    pub fn first_signature(&self) -> Option<&str> {
        self.signatures.first().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct TxEnvelope {
    transaction_id: String,
    transaction: TxBody,
}

#[derive(Debug, Deserialize)]
struct TxBody {
    ref_block_num: u64,
    signatures: Vec<String>,
}

/// One transaction entry inside an execution cycle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionEntry {
    /// Signatures recorded for the entry.
    #[serde(default)]
    pub signatures: Vec<String>,
}

/// One entry of an execution cycle: a thread of transaction entries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CycleEntry {
    /// Ordered transaction entries.
    #[serde(default, rename = "user_input")]
    pub transactions: Vec<TransactionEntry>,
}

/// A block as reported by a node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockRecord {
    /// Block number.
    pub block_num: u64,
    /// Ordered execution cycles, each an ordered list of entries.
    #[serde(default)]
    pub cycles: Vec<Vec<CycleEntry>>,
}

impl BlockRecord {
    /// Decode from the node's block envelope.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ProbeError> {
        serde_json::from_value(value)
            .map_err(|source| ProbeError::Malformed { what: "block", source })
    }

    /// The first signature of the first entry of the first cycle, if the
    /// block committed anything.
    pub fn first_signature(&self) -> Option<&str> {
        self.cycles
            .first()?
            .first()?
            .transactions
            .first()?
            .signatures
            .first()
            .map(String::as_str)
    }
}
