//! Deterministic construction of the three adversarial scenarios.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{KeyPair, LoggingDescriptor, NodeSettings, ScenarioError};

/// Genesis producer signed for by the first node.
const NODE0_PRODUCER: &str = "initu";

/// Genesis producer signed for by the second node.
const NODE1_PRODUCER: &str = "initb";

/// The remainder of the genesis producer roster. Whichever node carries
/// these simulates the large majority of producers.
const ROSTER: [&str; 19] = [
    "initd", "initf", "inith", "initj", "initl", "initn", "initp", "initr", "initt", "inita",
    "initc", "inite", "initg", "initi", "initk", "initm", "inito", "initq", "inits",
];

/// Plugins enabled on every staged node.
const PLUGINS: [&str; 4] =
    ["producer_plugin", "chain_api_plugin", "account_history_plugin", "account_history_api_plugin"];

/// The three fixed adversarial ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioKind {
    /// All producers honest.
    NoMalicious,
    /// Malicious producers hold less than a third of the roster.
    MinorityMalicious,
    /// Malicious producers hold more than a third of the roster.
    MajorityMalicious,
}

impl ScenarioKind {
    /// All scenarios, in batch execution order.
    pub const fn all() -> [Self; 3] {
        [Self::NoMalicious, Self::MinorityMalicious, Self::MajorityMalicious]
    }

    /// The outcome the Byzantine threshold predicts for this scenario.
    pub const fn expected(self) -> ExpectedOutcome {
        match self {
            Self::NoMalicious | Self::MinorityMalicious => ExpectedOutcome::EntersChain,
            Self::MajorityMalicious => ExpectedOutcome::StaysOut,
        }
    }

    /// The CLI selector for this scenario.
    pub const fn selector(self) -> u8 {
        match self {
            Self::NoMalicious => 1,
            Self::MinorityMalicious => 2,
            Self::MajorityMalicious => 3,
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::NoMalicious),
            "2" => Ok(Self::MinorityMalicious),
            "3" => Ok(Self::MajorityMalicious),
            other => Err(ScenarioError::InvalidKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoMalicious => "no malicious producers",
            Self::MinorityMalicious => "minority malicious producers",
            Self::MajorityMalicious => "majority malicious producers",
        };
        f.write_str(name)
    }
}

/// Whether the scenario's transaction is expected to be finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedOutcome {
    /// The transaction is committed into a block.
    EntersChain,
    /// The transaction never reaches a block.
    StaysOut,
}

/// One node's staged configuration: settings plus logging descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedNode {
    /// Node settings rendered to `config.ini`.
    pub settings: NodeSettings,
    /// Logging descriptor rendered to `logging.json`.
    pub logging: LoggingDescriptor,
}

/// A complete scenario: ordered node configurations plus the predicted
/// outcome. Always holds at least two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// The adversarial ratio this spec encodes.
    pub kind: ScenarioKind,
    /// Per-node staged configuration, in node-index order.
    pub nodes: Vec<StagedNode>,
    /// Predicted outcome for the pushed transaction.
    pub expected: ExpectedOutcome,
}

impl ScenarioSpec {
    /// Producers held by malicious nodes versus the total configured
    /// roster, for reporting the Byzantine threshold.
    pub fn malicious_share(&self) -> (usize, usize) {
        let mut malicious = 0;
        let mut total = 0;
        for node in &self.nodes {
            total += node.settings.producers.len();
            if node.settings.is_malicious() {
                malicious += node.settings.producers.len();
            }
        }
        (malicious, total)
    }
}

/// Build the scenario for the given adversarial ratio.
///
/// Pure and deterministic: the same kind always yields a structurally
/// identical spec.
pub fn build_scenario(kind: ScenarioKind) -> ScenarioSpec {
    let mut node0 = base_node(0);
    let mut node1 = base_node(1);

    match kind {
        ScenarioKind::NoMalicious => {
            // Both honest; the second node carries the large roster.
            extend_roster(&mut node1);
        }
        ScenarioKind::MinorityMalicious => {
            // The honest node carries the roster; the malicious node
            // holds a single producer, well under a third.
            extend_roster(&mut node0);
            node1.max_transaction_exec_time = Some(0);
        }
        ScenarioKind::MajorityMalicious => {
            // The roster node itself is malicious, tipping the ratio
            // past the threshold.
            extend_roster(&mut node1);
            node1.max_transaction_exec_time = Some(0);
        }
    }

    ScenarioSpec {
        kind,
        nodes: vec![
            StagedNode { settings: node0, logging: LoggingDescriptor::standard() },
            StagedNode { settings: node1, logging: LoggingDescriptor::standard() },
        ],
        expected: kind.expected(),
    }
}

fn base_node(index: usize) -> NodeSettings {
    let (http, p2p, peer, producer) = match index {
        0 => ("127.0.0.1:8888", 9876, 9877, NODE0_PRODUCER),
        _ => ("127.0.0.1:8889", 9877, 9876, NODE1_PRODUCER),
    };
    NodeSettings {
        genesis: "./genesis.json".to_string(),
        block_log_dir: "blocks".to_string(),
        readonly: false,
        send_whole_blocks: true,
        shared_file_dir: "blockchain".to_string(),
        shared_file_size: 8192,
        http_address: http.to_string(),
        p2p_listen: format!("0.0.0.0:{p2p}"),
        p2p_server: format!("localhost:{p2p}"),
        allowed_connection: "any".to_string(),
        peers: vec![format!("localhost:{peer}")],
        required_participation: true,
        keys: vec![KeyPair::genesis()],
        producers: vec![producer.to_string()],
        plugins: PLUGINS.iter().map(ToString::to_string).collect(),
        max_transaction_exec_time: None,
    }
}

fn extend_roster(node: &mut NodeSettings) {
    node.producers.extend(ROSTER.iter().map(ToString::to_string));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_is_deterministic() {
        for kind in ScenarioKind::all() {
            assert_eq!(build_scenario(kind), build_scenario(kind));
        }
    }

    #[test]
    fn test_every_scenario_has_at_least_two_nodes() {
        for kind in ScenarioKind::all() {
            assert!(build_scenario(kind).nodes.len() >= 2);
        }
    }

    #[test]
    fn test_no_malicious_shares() {
        let spec = build_scenario(ScenarioKind::NoMalicious);
        assert_eq!(spec.malicious_share(), (0, 21));
        assert_eq!(spec.expected, ExpectedOutcome::EntersChain);
        assert!(spec.nodes.iter().all(|n| !n.settings.is_malicious()));
    }

    #[test]
    fn test_minority_is_under_a_third() {
        let spec = build_scenario(ScenarioKind::MinorityMalicious);
        let (malicious, total) = spec.malicious_share();
        assert_eq!((malicious, total), (1, 21));
        assert!(malicious * 3 < total);
        assert_eq!(spec.expected, ExpectedOutcome::EntersChain);
        assert!(spec.nodes[1].settings.is_malicious());
        assert!(!spec.nodes[0].settings.is_malicious());
    }

    #[test]
    fn test_majority_is_over_a_third() {
        let spec = build_scenario(ScenarioKind::MajorityMalicious);
        let (malicious, total) = spec.malicious_share();
        assert_eq!((malicious, total), (20, 21));
        assert!(malicious * 3 > total);
        assert_eq!(spec.expected, ExpectedOutcome::StaysOut);
    }

    #[test]
    fn test_nodes_are_cross_peered() {
        let spec = build_scenario(ScenarioKind::NoMalicious);
        assert_eq!(spec.nodes[0].settings.peers, vec!["localhost:9877"]);
        assert_eq!(spec.nodes[1].settings.peers, vec!["localhost:9876"]);
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!("1".parse::<ScenarioKind>().unwrap(), ScenarioKind::NoMalicious);
        assert_eq!("2".parse::<ScenarioKind>().unwrap(), ScenarioKind::MinorityMalicious);
        assert_eq!("3".parse::<ScenarioKind>().unwrap(), ScenarioKind::MajorityMalicious);
        assert!(matches!(
            "4".parse::<ScenarioKind>(),
            Err(ScenarioError::InvalidKind(s)) if s == "4"
        ));
    }
}
