//! Bonding minimums and runtime constants.

use crate::ChainClient;
use crate::error::ChainError;
use stkbond_core::Balance;
use subxt::dynamic::DecodedValueThunk;

impl ChainClient {
    /// Minimum active bond for a nominator.
    pub async fn get_min_nominator_bond(&self) -> Result<Balance, ChainError> {
        self.get_storage_u128("Staking", "MinNominatorBond").await
    }

    /// Minimum bond to join a nomination pool.
    pub async fn get_min_join_bond(&self) -> Result<Balance, ChainError> {
        self.get_storage_u128("NominationPools", "MinJoinBond").await
    }

    pub async fn get_existential_deposit(&self) -> Result<Balance, ChainError> {
        self.get_constant_u128("Balances", "ExistentialDeposit")
    }

    /// Plain storage value, zero when unset.
    async fn get_storage_u128(&self, pallet: &str, entry: &str) -> Result<Balance, ChainError> {
        let storage_query = subxt::dynamic::storage(pallet, entry, ());

        let result: Option<DecodedValueThunk> = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        let Some(value) = result else {
            tracing::debug!("{}::{} unset, using 0", pallet, entry);
            return Ok(0);
        };

        value.to_value()?.as_u128().ok_or_else(|| {
            ChainError::InvalidData(format!("Invalid storage value {}::{}", pallet, entry))
        })
    }

    fn get_constant_u128(&self, pallet: &str, name: &str) -> Result<Balance, ChainError> {
        let constant = subxt::dynamic::constant(pallet, name);
        let value = self.client().constants().at(&constant)?;
        let decoded = value.to_value()?;
        decoded.as_u128().ok_or_else(|| {
            ChainError::InvalidData(format!("Invalid constant {}::{}", pallet, name))
        })
    }
}
