//! Unsigned bond transactions for an external signer.

use crate::ChainClient;
use crate::error::ChainError;
use parity_scale_codec::{Compact, Decode, Encode};
use stkbond_core::{AccountId, Balance, BondCall, BondTransaction};
use subxt::dynamic::{At, Value};
use subxt::tx::DynamicPayload;

/// Mortality window in blocks (about 12 minutes at 6s blocks).
pub const MORTAL_PERIOD: u64 = 128;

/// Signer address, signature and extensions added on top of the call.
const SIGNED_EXTRINSIC_OVERHEAD: u32 = 110;

/// Unsigned extrinsic payload.
#[derive(Debug, Clone)]
pub struct UnsignedPayload {
    /// The call data (SCALE encoded).
    pub call_data: Vec<u8>,
    pub description: String,
    pub signer: AccountId,
    pub genesis_hash: [u8; 32],
    /// Mortality checkpoint; the genesis hash for immortal transactions.
    pub block_hash: [u8; 32],
    pub spec_version: u32,
    pub tx_version: u32,
    pub nonce: u64,
    pub era: Era,
    /// Whether the runtime has the CheckMetadataHash extension.
    pub include_metadata_hash: bool,
    /// Whether to use ChargeAssetTxPayment instead of ChargeTransactionPayment.
    pub use_asset_payment: bool,
}

/// Transaction era (mortality).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Immortal,
    Mortal { period: u64, phase: u64 },
}

impl Era {
    /// Mortal era starting at `block`.
    pub fn mortal(period: u64, block: u64) -> Self {
        let period = period
            .checked_next_power_of_two()
            .unwrap_or(1 << 16)
            .clamp(4, 1 << 16);
        Era::Mortal {
            period,
            phase: block % period,
        }
    }

    /// SCALE encoding of the era.
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Era::Immortal => vec![0x00],
            Era::Mortal { period, phase } => {
                let quantize_factor = (period >> 12).max(1);
                let low = (period.trailing_zeros().saturating_sub(1)).clamp(1, 15) as u16;
                let high = ((phase / quantize_factor) << 4) as u16;
                (low | high).to_le_bytes().to_vec()
            }
        }
    }
}

impl UnsignedPayload {
    /// The bytes the signer signs: call, extra, then additional signed data.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.call_data.len() + 128);

        data.extend_from_slice(&self.call_data);

        // Extra
        data.extend_from_slice(&self.era.encode());
        Compact(self.nonce).encode_to(&mut data);
        Compact(0u128).encode_to(&mut data); // tip
        if self.use_asset_payment {
            data.push(0x00); // native asset
        }
        if self.include_metadata_hash {
            data.push(0x00); // mode: disabled
        }

        // Additional signed
        data.extend_from_slice(&self.spec_version.to_le_bytes());
        data.extend_from_slice(&self.tx_version.to_le_bytes());
        data.extend_from_slice(&self.genesis_hash);
        data.extend_from_slice(&self.block_hash);
        if self.include_metadata_hash {
            data.push(0x00); // no metadata hash
        }

        data
    }

    pub fn signing_payload_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_payload()))
    }
}

/// Dynamic subxt call for a [`BondCall`].
pub fn bond_call_payload(call: &BondCall) -> DynamicPayload {
    let fields = match call {
        BondCall::PoolBondExtra { amount } => vec![Value::unnamed_variant(
            "FreeBalance",
            [Value::u128(*amount)],
        )],
        BondCall::PoolUnbond { member, amount } => vec![
            Value::unnamed_variant("Id", [Value::from_bytes(member)]),
            Value::u128(*amount),
        ],
        BondCall::BondExtra { amount } | BondCall::Unbond { amount } => {
            vec![Value::u128(*amount)]
        }
    };
    subxt::dynamic::tx(call.pallet(), call.call_name(), fields)
}

#[derive(Debug, Decode)]
struct Weight {
    #[codec(compact)]
    _ref_time: u64,
    #[codec(compact)]
    _proof_size: u64,
}

/// `RuntimeDispatchInfo` as returned by `query_call_info`.
#[derive(Debug, Decode)]
struct DispatchInfo {
    _weight: Weight,
    _class: u8,
    partial_fee: Balance,
}

impl ChainClient {
    /// Build the unsigned payload for a resolved bond transaction.
    ///
    /// With `use_mortal_era` the transaction expires [`MORTAL_PERIOD`] blocks
    /// after the current block.
    pub async fn create_bond_payload(
        &self,
        tx: &BondTransaction,
        use_mortal_era: bool,
    ) -> Result<UnsignedPayload, ChainError> {
        let client = self.client();
        let call_data = client.tx().call_data(&bond_call_payload(&tx.call))?;

        let metadata = client.metadata();
        let extensions: Vec<_> = (0..=5)
            .find_map(|v| metadata.extrinsic().transaction_extensions_by_version(v))
            .map(|iter| iter.collect())
            .unwrap_or_default();
        let include_metadata_hash = extensions
            .iter()
            .any(|e| e.identifier() == "CheckMetadataHash");
        let use_asset_payment = extensions
            .iter()
            .any(|e| e.identifier() == "ChargeAssetTxPayment");

        let genesis_hash = self.genesis_hash();
        let runtime = client.runtime_version();
        let nonce = self.get_account_nonce(&tx.signer).await?;

        let (era, block_hash) = if use_mortal_era {
            let (block_number, block_hash) = self.get_latest_block().await?;
            (Era::mortal(MORTAL_PERIOD, block_number as u64), block_hash)
        } else {
            (Era::Immortal, genesis_hash)
        };

        tracing::info!(
            "Created {} payload: genesis=0x{}, spec={}, tx={}, nonce={}, \
             meta_hash={}, asset_pay={}, era={:?}",
            tx.call.description(),
            hex::encode(genesis_hash),
            runtime.spec_version,
            runtime.transaction_version,
            nonce,
            include_metadata_hash,
            use_asset_payment,
            era
        );

        Ok(UnsignedPayload {
            call_data,
            description: tx.call.description(),
            signer: tx.signer,
            genesis_hash,
            block_hash,
            spec_version: runtime.spec_version,
            tx_version: runtime.transaction_version,
            nonce,
            era,
            include_metadata_hash,
            use_asset_payment,
        })
    }

    /// Estimated partial fee of `call` via `TransactionPaymentCallApi`.
    pub async fn estimate_fee(&self, call: &BondCall) -> Result<Balance, ChainError> {
        let call_data = self.client().tx().call_data(&bond_call_payload(call))?;
        let len = call_data.len() as u32 + SIGNED_EXTRINSIC_OVERHEAD;

        let mut params = call_data;
        len.encode_to(&mut params);

        let raw = self
            .client()
            .runtime_api()
            .at_latest()
            .await?
            .call_raw(
                "TransactionPaymentCallApi_query_call_info",
                Some(params.as_slice()),
            )
            .await?;
        let info = DispatchInfo::decode(&mut raw.as_slice()).map_err(subxt::Error::from)?;

        tracing::debug!(
            "Estimated fee for {}: {}",
            call.description(),
            info.partial_fee
        );
        Ok(info.partial_fee)
    }

    async fn get_account_nonce(&self, account: &AccountId) -> Result<u64, ChainError> {
        let storage_query =
            subxt::dynamic::storage("System", "Account", vec![Value::from_bytes(account)]);

        let result = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        let Some(value) = result else {
            return Ok(0);
        };
        let nonce = value
            .to_value()?
            .at("nonce")
            .and_then(|v: &Value<u32>| v.as_u128())
            .unwrap_or(0);
        Ok(nonce as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_payload(era: Era) -> UnsignedPayload {
        UnsignedPayload {
            call_data: vec![0x59, 0x01, 0x04],
            description: "Staking::bond_extra(1)".to_string(),
            signer: [0xAB; 32],
            genesis_hash: [1u8; 32],
            block_hash: [2u8; 32],
            spec_version: 1_002_000,
            tx_version: 26,
            nonce: 42,
            era,
            include_metadata_hash: false,
            use_asset_payment: false,
        }
    }

    #[test]
    fn test_era_mortal_phase() {
        assert_eq!(
            Era::mortal(128, 1_000),
            Era::Mortal {
                period: 128,
                phase: 1_000 % 128
            }
        );
        // Period is rounded up to a power of two.
        assert_eq!(
            Era::mortal(100, 0),
            Era::Mortal {
                period: 128,
                phase: 0
            }
        );
    }

    #[test]
    fn test_era_encoding() {
        assert_eq!(Era::Immortal.encode(), vec![0x00]);
        assert_eq!(Era::mortal(128, 64).encode(), vec![0x06, 0x04]);
        assert_eq!(Era::mortal(64, 42).encode(), vec![0xA5, 0x02]);
    }

    #[test]
    fn test_signing_payload_layout() {
        let payload = make_test_payload(Era::Immortal);
        let data = payload.signing_payload();

        let mut expected = vec![0x59, 0x01, 0x04];
        expected.push(0x00); // era
        expected.push(42 << 2); // nonce
        expected.push(0x00); // tip
        expected.extend_from_slice(&1_002_000u32.to_le_bytes());
        expected.extend_from_slice(&26u32.to_le_bytes());
        expected.extend_from_slice(&[1u8; 32]);
        expected.extend_from_slice(&[2u8; 32]);
        assert_eq!(data, expected);
    }

    #[test]
    fn test_signing_payload_optional_extensions() {
        let mut payload = make_test_payload(Era::mortal(128, 64));
        let base = payload.signing_payload().len();
        payload.include_metadata_hash = true;
        payload.use_asset_payment = true;
        assert_eq!(payload.signing_payload().len(), base + 3);
    }

    #[test]
    fn test_signing_payload_hex_prefix() {
        let payload = make_test_payload(Era::Immortal);
        assert!(payload.signing_payload_hex().starts_with("0x590104"));
    }

    #[test]
    fn test_bond_call_payload_names() {
        let member = [3u8; 32];
        let cases = [
            (BondCall::PoolBondExtra { amount: 1 }, "NominationPools", "bond_extra"),
            (BondCall::PoolUnbond { member, amount: 1 }, "NominationPools", "unbond"),
            (BondCall::BondExtra { amount: 1 }, "Staking", "bond_extra"),
            (BondCall::Unbond { amount: 1 }, "Staking", "unbond"),
        ];
        for (call, pallet, name) in cases {
            let payload = bond_call_payload(&call);
            assert_eq!(payload.pallet_name(), pallet);
            assert_eq!(payload.call_name(), name);
        }
    }
}
