//! Account-related chain queries.

use crate::ChainClient;
use crate::error::ChainError;
use stkbond_core::{AccountId, Balance};
use subxt::dynamic::{At, DecodedValueThunk, Value};

/// Account balance information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountBalance {
    pub free: Balance,
    pub frozen: Balance,
}

/// Staking ledger information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakingLedger {
    /// Bonded funds not scheduled for unlocking.
    pub active: Balance,
}

/// Pool membership information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMembership {
    pub pool_id: u32,
    pub points: Balance,
}

fn field_u128<T>(value: &Value<T>, name: &str) -> Balance {
    value
        .at(name)
        .and_then(|v: &Value<T>| v.as_u128())
        .unwrap_or(0)
}

// PoolMember = { pool_id, points, last_recorded_reward_counter, unbonding_eras }
fn pool_membership_from<T>(decoded: &Value<T>) -> Result<PoolMembership, ChainError> {
    let raw_id = field_u128(decoded, "pool_id");
    let pool_id = u32::try_from(raw_id)
        .map_err(|_| ChainError::InvalidData(format!("pool id {} out of range", raw_id)))?;
    Ok(PoolMembership {
        pool_id,
        points: field_u128(decoded, "points"),
    })
}

impl ChainClient {
    async fn fetch_account_entry(
        &self,
        pallet: &str,
        entry: &str,
        account: &AccountId,
    ) -> Result<Option<Value<u32>>, ChainError> {
        let storage_query =
            subxt::dynamic::storage(pallet, entry, vec![Value::from_bytes(account)]);

        let result: Option<DecodedValueThunk> = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        match result {
            Some(value) => Ok(Some(value.to_value()?)),
            None => Ok(None),
        }
    }

    /// Get account balance information.
    pub async fn get_account_balance(
        &self,
        account: &AccountId,
    ) -> Result<AccountBalance, ChainError> {
        let Some(decoded) = self.fetch_account_entry("System", "Account", account).await? else {
            return Ok(AccountBalance::default());
        };

        // AccountInfo = { nonce, consumers, providers, sufficients, data: AccountData }
        let Some(data) = decoded.at("data") else {
            return Ok(AccountBalance::default());
        };

        Ok(AccountBalance {
            free: field_u128(data, "free"),
            frozen: field_u128(data, "frozen"),
        })
    }

    /// Get the staking ledger keyed by `stash`.
    pub async fn get_staking_ledger(
        &self,
        stash: &AccountId,
    ) -> Result<Option<StakingLedger>, ChainError> {
        let Some(decoded) = self.fetch_account_entry("Staking", "Ledger", stash).await? else {
            return Ok(None);
        };

        Ok(Some(StakingLedger {
            active: field_u128(&decoded, "active"),
        }))
    }

    /// Controller of `stash`. Stashes without a `Bonded` entry control themselves.
    pub async fn get_controller(&self, stash: &AccountId) -> Result<AccountId, ChainError> {
        let controller = self
            .fetch_account_entry("Staking", "Bonded", stash)
            .await?
            .as_ref()
            .and_then(extract_account_id);
        Ok(controller.unwrap_or(*stash))
    }

    /// Number of validators `stash` currently nominates.
    pub async fn get_nomination_count(&self, stash: &AccountId) -> Result<u32, ChainError> {
        let Some(decoded) = self.fetch_account_entry("Staking", "Nominators", stash).await? else {
            return Ok(0);
        };

        // Nominations = { targets, submitted_in, suppressed }
        let mut count = 0;
        if let Some(targets) = decoded.at("targets") {
            while targets.at(count as usize).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Get pool membership for an account.
    pub async fn get_pool_membership(
        &self,
        account: &AccountId,
    ) -> Result<Option<PoolMembership>, ChainError> {
        let Some(decoded) = self
            .fetch_account_entry("NominationPools", "PoolMembers", account)
            .await?
        else {
            return Ok(None);
        };

        pool_membership_from(&decoded).map(Some)
    }
}

/// Extract an AccountId from a dynamic Value.
pub(crate) fn extract_account_id(value: &Value<u32>) -> Option<AccountId> {
    if value.at(31).is_none() {
        // AccountId32 newtype around the byte array.
        return value.at(0).and_then(extract_account_id);
    }
    let mut bytes = [0u8; 32];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = value.at(i).and_then(|v| v.as_u128())? as u8;
    }
    Some(bytes)
}
