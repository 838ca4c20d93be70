//! Outcome verification.
//!
//! Pure comparison of the scenario's predicted outcome against what the
//! probe observed; no IO, no cluster knowledge.

#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/gauntlet-harness/gauntlet/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use gauntlet_scenario::ExpectedOutcome;
use serde::{Deserialize, Serialize};

/// The result of comparing expectation against observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether reality matched the scenario's prediction.
    pub pass: bool,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.pass { "SUCCESS" } else { "FAILURE" };
        write!(f, "{status}: {}", self.message)
    }
}

/// Compare the expected outcome against whether the transaction was
/// observed in the chain.
pub fn verify(expected: ExpectedOutcome, entered: bool) -> Verdict {
    match (expected, entered) {
        (ExpectedOutcome::EntersChain, true) => Verdict {
            pass: true,
            message: "transaction entered the chain as expected".to_string(),
        },
        (ExpectedOutcome::EntersChain, false) => Verdict {
            pass: false,
            message: "transaction did not enter the chain but should have".to_string(),
        },
        (ExpectedOutcome::StaysOut, true) => Verdict {
            pass: false,
            message: "transaction entered the chain but should not have".to_string(),
        },
        (ExpectedOutcome::StaysOut, false) => Verdict {
            pass: true,
            message: "transaction stayed out of the chain as expected".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entered_as_expected() {
        let verdict = verify(ExpectedOutcome::EntersChain, true);
        assert!(verdict.pass);
        assert!(verdict.to_string().starts_with("SUCCESS"));
    }

    #[test]
    fn test_missing_when_expected_fails() {
        let verdict = verify(ExpectedOutcome::EntersChain, false);
        assert!(!verdict.pass);
        assert!(verdict.message.contains("should have"));
    }

    #[test]
    fn test_entered_when_forbidden_fails() {
        let verdict = verify(ExpectedOutcome::StaysOut, true);
        assert!(!verdict.pass);
        assert!(verdict.message.contains("should not have"));
    }

    #[test]
    fn test_stayed_out_as_expected() {
        let verdict = verify(ExpectedOutcome::StaysOut, false);
        assert!(verdict.pass);
    }
}
