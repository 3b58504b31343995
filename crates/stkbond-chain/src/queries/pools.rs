//! Nomination pool queries.

use crate::ChainClient;
use crate::error::ChainError;
use stkbond_core::{AccountId, Balance};
use subxt::dynamic::{At, DecodedValueThunk, Value};

const POOLS_PALLET_ID: &[u8; 8] = b"py/nopls";

/// Account type byte of a pool's bonded stash.
const BONDED_ACCOUNT: u8 = 0;

/// Derive a pool's bonded stash account.
///
/// `b"modl" ++ pallet_id ++ account_type ++ pool_id (le)`, zero-padded to
/// 32 bytes, the way the NominationPools pallet derives it.
pub fn derive_pool_stash(pool_id: u32) -> AccountId {
    let mut account = [0u8; 32];
    account[..4].copy_from_slice(b"modl");
    account[4..12].copy_from_slice(POOLS_PALLET_ID);
    account[12] = BONDED_ACCOUNT;
    account[13..17].copy_from_slice(&pool_id.to_le_bytes());
    account
}

/// Points and bonded balance of one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolBond {
    pub pool_id: u32,
    /// Total points issued to members.
    pub points: Balance,
    /// Active bond of the pool's stash.
    pub balance: Balance,
}

impl ChainClient {
    /// Total points of a bonded pool, `None` if the pool does not exist.
    pub async fn get_pool_points(&self, pool_id: u32) -> Result<Option<Balance>, ChainError> {
        let storage_query = subxt::dynamic::storage(
            "NominationPools",
            "BondedPools",
            vec![Value::u128(pool_id as u128)],
        );

        let result: Option<DecodedValueThunk> = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        let Some(value) = result else {
            return Ok(None);
        };

        // BondedPoolInner = { commission, member_counter, points, roles, state }
        let points = value
            .to_value()?
            .at("points")
            .and_then(|v: &Value<u32>| v.as_u128())
            .unwrap_or(0);
        Ok(Some(points))
    }

    /// Points and stash bond of a pool.
    pub async fn get_pool_bond(&self, pool_id: u32) -> Result<PoolBond, ChainError> {
        let points = self
            .get_pool_points(pool_id)
            .await?
            .ok_or_else(|| ChainError::InvalidData(format!("Pool {} not found", pool_id)))?;

        let stash = derive_pool_stash(pool_id);
        let balance = self
            .get_staking_ledger(&stash)
            .await?
            .map(|ledger| ledger.active)
            .unwrap_or(0);

        tracing::debug!("Pool {}: {} points, {} bonded", pool_id, points, balance);
        Ok(PoolBond {
            pool_id,
            points,
            balance,
        })
    }
}
