//! Accounts and wallets as the harness sees them.

use gauntlet_scenario::KeyPair;
use serde::{Deserialize, Serialize};

/// Name of the pre-funded genesis account used to bootstrap scenarios.
pub const FUNDED_ACCOUNT: &str = "inita";

/// An account with its owner and active key pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account name.
    pub name: String,
    /// Owner authority key pair.
    pub owner: KeyPair,
    /// Active authority key pair.
    pub active: KeyPair,
}

impl Account {
    /// An account built from freshly created key pairs. The caller names
    /// it before registration.
    pub fn from_keys(owner: KeyPair, active: KeyPair) -> Self {
        Self { name: String::new(), owner, active }
    }

    /// The pre-funded genesis account, keyed with the shared development
    /// pair, used as the creator and counterparty in every scenario.
    pub fn funded() -> Self {
        Self {
            name: FUNDED_ACCOUNT.to_string(),
            owner: KeyPair::genesis(),
            active: KeyPair::genesis(),
        }
    }
}

/// A wallet created on the wallet daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet name.
    pub name: String,
    /// Unlock password returned at creation.
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funded_account_uses_genesis_keys() {
        let account = Account::funded();
        assert_eq!(account.name, FUNDED_ACCOUNT);
        assert_eq!(account.owner, KeyPair::genesis());
        assert_eq!(account.active, KeyPair::genesis());
    }
}
