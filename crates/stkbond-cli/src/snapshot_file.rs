//! Offline bond snapshots stored as JSON.

use std::path::Path;

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail};
use serde::{Deserialize, Serialize};
use stkbond_chain::{encode_ss58, parse_account};
use stkbond_core::{AccountBondState, BondSnapshot, Network};

/// Snapshot with SS58 addresses instead of raw account ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub active: Option<String>,
    #[serde(default)]
    pub controller: Option<String>,
    #[serde(default)]
    pub direct: AccountBondState,
    #[serde(default)]
    pub pooled: AccountBondState,
}

impl SnapshotFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).wrap_err("Malformed snapshot")
    }

    pub fn into_snapshot(self) -> Result<BondSnapshot> {
        check_non_negative("direct", &self.direct)?;
        check_non_negative("pooled", &self.pooled)?;
        let active = self.active.as_deref().map(parse_account).transpose()?;
        let controller = self.controller.as_deref().map(parse_account).transpose()?;
        Ok(BondSnapshot {
            active,
            controller,
            direct: self.direct,
            pooled: self.pooled,
            ..BondSnapshot::for_network(self.network)
        })
    }

    pub fn from_snapshot(network: Network, snapshot: &BondSnapshot) -> Self {
        let prefix = network.ss58_format();
        Self {
            network,
            active: snapshot.active.map(|a| encode_ss58(&a, prefix)),
            controller: snapshot.controller.map(|c| encode_ss58(&c, prefix)),
            direct: snapshot.direct.clone(),
            pooled: snapshot.pooled.clone(),
        }
    }
}

fn check_non_negative(section: &str, state: &AccountBondState) -> Result<()> {
    let fields = [
        ("free_to_bond", state.free_to_bond),
        ("free_to_unbond", state.free_to_unbond),
        ("total_possible_bond", state.total_possible_bond),
    ];
    for (name, value) in fields {
        if value.is_sign_negative() && !value.is_zero() {
            bail!("Negative {}.{} in snapshot: {}", section, name, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const ALICE: &str = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";

    #[test]
    fn test_parse_snapshot_file() {
        let json = r#"{
            "network": "Polkadot",
            "active": "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5",
            "controller": "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5",
            "direct": {
                "free_to_bond": "10",
                "free_to_unbond": "100",
                "total_possible_bond": "110",
                "minimum_bond": 200000000000,
                "nominations_count": 3,
                "controller_imported": true
            }
        }"#;

        let snapshot = SnapshotFile::parse(json).unwrap().into_snapshot().unwrap();
        assert_eq!(snapshot.units, 10);
        assert_eq!(snapshot.symbol, "DOT");
        assert_eq!(snapshot.active, snapshot.controller);
        assert_eq!(snapshot.direct.free_to_unbond, dec!(100));
        assert_eq!(snapshot.direct.nominations_count, 3);
        assert_eq!(snapshot.pooled, AccountBondState::default());
    }

    #[test]
    fn test_bad_address_is_rejected() {
        let file = SnapshotFile {
            active: Some("nope".to_string()),
            ..SnapshotFile::default()
        };
        assert!(file.into_snapshot().is_err());
    }

    #[test]
    fn test_negative_amounts_are_rejected() {
        let json = r#"{
            "pooled": {
                "free_to_bond": "-5",
                "free_to_unbond": "0",
                "total_possible_bond": "0",
                "minimum_bond": 0
            }
        }"#;
        let file = SnapshotFile::parse(json).unwrap();
        let err = file.into_snapshot().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Negative pooled.free_to_bond in snapshot: -5"
        );
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(SnapshotFile::parse("{").is_err());
    }

    #[test]
    fn test_from_snapshot_encodes_addresses() {
        let file = SnapshotFile {
            network: Network::Polkadot,
            active: Some(ALICE.to_string()),
            ..SnapshotFile::default()
        };
        let snapshot = file.clone().into_snapshot().unwrap();
        let encoded = SnapshotFile::from_snapshot(Network::Polkadot, &snapshot);
        assert_eq!(encoded, file);
    }
}
