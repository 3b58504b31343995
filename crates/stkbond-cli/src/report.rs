//! JSON output of the CLI commands.

use rust_decimal::Decimal;
use serde::Serialize;
use stkbond_chain::{Era, UnsignedPayload, encode_ss58};
use stkbond_core::{ActionKind, BondSession, BondTransaction, Network, SignerRole, StakingMode};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionReport {
    pub pallet: &'static str,
    pub call: &'static str,
    /// Amount in base units.
    pub amount: String,
    pub description: String,
    pub signer: String,
    pub signer_role: SignerRole,
}

impl TransactionReport {
    pub fn new(tx: &BondTransaction, network: Network) -> Self {
        Self {
            pallet: tx.call.pallet(),
            call: tx.call.call_name(),
            amount: tx.call.amount().to_string(),
            description: tx.call.description(),
            signer: encode_ss58(&tx.signer, network.ss58_format()),
            signer_role: tx.signer_role,
        }
    }
}

/// State of a bond form after resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveReport {
    pub mode: StakingMode,
    pub action: ActionKind,
    pub amount: Decimal,
    pub max_amount: Option<Decimal>,
    pub valid: bool,
    pub submit_disabled: bool,
    pub advisories: Vec<String>,
    pub fee: Option<String>,
    pub notes: Vec<String>,
    pub transaction: Option<TransactionReport>,
    /// Why no transaction would be built.
    pub refusal: Option<String>,
}

impl ResolveReport {
    pub fn from_session(session: &BondSession, network: Network) -> Self {
        let (transaction, refusal) = match session.preview() {
            Ok(tx) => (Some(TransactionReport::new(&tx, network)), None),
            Err(refusal) => (None, Some(refusal.to_string())),
        };

        Self {
            mode: session.mode(),
            action: session.action(),
            amount: session.amount(),
            max_amount: session.max_amount(),
            valid: session.is_valid(),
            submit_disabled: session.submit_disabled(),
            advisories: session.advisories().iter().map(|a| a.to_string()).collect(),
            fee: session.show_fee().then(|| session.fee_label()),
            notes: session.notes(),
            transaction,
            refusal,
        }
    }
}

/// Unsigned payload ready for an external signer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadReport {
    pub description: String,
    pub signer: String,
    pub call_data: String,
    pub signing_payload: String,
    pub nonce: u64,
    pub era: String,
    pub spec_version: u32,
    pub tx_version: u32,
    pub genesis_hash: String,
}

impl PayloadReport {
    pub fn new(payload: &UnsignedPayload, network: Network) -> Self {
        let era = match payload.era {
            Era::Immortal => "immortal".to_string(),
            Era::Mortal { period, phase } => format!("mortal({}/{})", period, phase),
        };
        Self {
            description: payload.description.clone(),
            signer: encode_ss58(&payload.signer, network.ss58_format()),
            call_data: format!("0x{}", hex::encode(&payload.call_data)),
            signing_payload: payload.signing_payload_hex(),
            nonce: payload.nonce,
            era,
            spec_version: payload.spec_version,
            tx_version: payload.tx_version,
            genesis_hash: format!("0x{}", hex::encode(payload.genesis_hash)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use stkbond_core::{AccountBondState, BondSnapshot};

    const ALICE: [u8; 32] = [
        0xd4, 0x35, 0x93, 0xc7, 0x15, 0xfd, 0xd3, 0x1c, 0x61, 0x14, 0x1a, 0xbd, 0x04, 0xa9, 0x9f,
        0xd6, 0x82, 0x2c, 0x85, 0x58, 0x85, 0x4c, 0xcd, 0xe3, 0x9a, 0x56, 0x84, 0xe7, 0xa5, 0x6d,
        0xa2, 0x7d,
    ];

    fn snapshot(direct: AccountBondState, pooled: AccountBondState) -> BondSnapshot {
        BondSnapshot {
            active: Some(ALICE),
            controller: Some(ALICE),
            direct,
            pooled,
            ..BondSnapshot::for_network(Network::Polkadot)
        }
    }

    #[test]
    fn test_report_pool_bond_all_without_funds() {
        let session = BondSession::new(
            StakingMode::Pooled,
            ActionKind::BondAll,
            snapshot(AccountBondState::default(), AccountBondState::default()),
            true,
        );
        let report = ResolveReport::from_session(&session, Network::Polkadot);

        assert_eq!(report.amount, Decimal::ZERO);
        assert!(!report.valid);
        assert!(report.submit_disabled);
        assert_eq!(
            report.advisories,
            vec!["You have no free DOT to bond.".to_string()]
        );
        assert_eq!(report.transaction, None);
        assert_eq!(
            report.refusal.as_deref(),
            Some("Amount is not valid for submission")
        );
        assert_eq!(report.fee.as_deref(), Some("Estimated Tx Fee: ..."));
    }

    #[test]
    fn test_report_direct_unbond_all() {
        let direct = AccountBondState {
            free_to_unbond: dec!(50),
            total_possible_bond: dec!(50),
            controller_imported: true,
            ..AccountBondState::default()
        };
        let session = BondSession::new(
            StakingMode::Direct,
            ActionKind::UnbondAll,
            snapshot(direct, AccountBondState::default()),
            true,
        );
        let report = ResolveReport::from_session(&session, Network::Polkadot);

        assert!(report.valid);
        assert_eq!(report.max_amount, None);
        assert_eq!(report.notes[1], stkbond_core::UNBONDING_NOTE);
        assert_eq!(
            report.transaction,
            Some(TransactionReport {
                pallet: "Staking",
                call: "unbond",
                amount: "500000000000".to_string(),
                description: "Staking::unbond(500000000000)".to_string(),
                signer: "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5".to_string(),
                signer_role: SignerRole::Controller,
            })
        );
        assert_eq!(report.refusal, None);
    }

    #[test]
    fn test_report_serializes() {
        let session = BondSession::new(
            StakingMode::Direct,
            ActionKind::BondSome,
            snapshot(AccountBondState::default(), AccountBondState::default()),
            false,
        );
        let json = serde_json::to_value(ResolveReport::from_session(&session, Network::Polkadot))
            .unwrap();
        assert_eq!(json["mode"], "Direct");
        assert_eq!(json["action"], "BondSome");
        assert_eq!(json["valid"], false);
    }

    #[test]
    fn test_payload_report() {
        let payload = UnsignedPayload {
            call_data: vec![0x59, 0x01],
            description: "Staking::bond_extra(1)".to_string(),
            signer: ALICE,
            genesis_hash: [0u8; 32],
            block_hash: [0u8; 32],
            spec_version: 1,
            tx_version: 2,
            nonce: 3,
            era: Era::Mortal {
                period: 128,
                phase: 5,
            },
            include_metadata_hash: false,
            use_asset_payment: false,
        };
        let report = PayloadReport::new(&payload, Network::Westend);
        assert_eq!(report.call_data, "0x5901");
        assert_eq!(report.era, "mortal(128/5)");
        assert_eq!(
            report.signer,
            "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY"
        );
        assert!(report.signing_payload.starts_with("0x5901"));
    }
}
