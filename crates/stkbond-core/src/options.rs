//! Bond options derived from raw balances.
//!
//! Turns base-unit chain data into the decimal [`AccountBondState`] the
//! resolver works with, for both staking modes.

use serde::{Deserialize, Serialize};

use crate::amount::planck_to_unit;
use crate::resolver::BuildEnv;
use crate::types::{AccountBondState, AccountId, Balance, Network, StakingMode};

/// Account balance in base units.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawBalances {
    pub free: Balance,
    pub frozen: Balance,
    pub existential_deposit: Balance,
}

impl RawBalances {
    /// Free balance not already frozen and above the existential deposit.
    ///
    /// Staking locks count towards `frozen`, so funds that are already
    /// bonded are never offered again.
    pub fn free_to_bond(&self) -> Balance {
        self.free
            .saturating_sub(self.frozen.max(self.existential_deposit))
    }
}

/// Chain data for direct nomination staking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectInputs {
    pub balances: RawBalances,
    /// Active bonded amount from the staking ledger.
    pub active_bond: Balance,
    pub min_nominator_bond: Balance,
    pub nominations_count: u32,
    pub controller_imported: bool,
}

impl DirectInputs {
    pub fn bond_state(&self, units: u8) -> AccountBondState {
        let free_to_bond = self.balances.free_to_bond();
        let total = self.active_bond.saturating_add(free_to_bond);
        AccountBondState {
            free_to_bond: planck_to_unit(free_to_bond, units),
            free_to_unbond: planck_to_unit(self.active_bond, units),
            total_possible_bond: planck_to_unit(total, units),
            minimum_bond: self.min_nominator_bond,
            nominations_count: self.nominations_count,
            controller_imported: self.controller_imported,
        }
    }
}

/// Chain data for a nomination pool member.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PoolInputs {
    pub balances: RawBalances,
    pub member_points: Balance,
    /// Total points issued by the pool.
    pub pool_points: Balance,
    /// Active bond of the pool's stash.
    pub pool_balance: Balance,
    pub min_join_bond: Balance,
}

impl PoolInputs {
    /// Member points converted to balance.
    pub fn member_balance(&self) -> Balance {
        points_to_balance(self.member_points, self.pool_points, self.pool_balance)
    }

    pub fn bond_state(&self, units: u8) -> AccountBondState {
        let free_to_bond = self.balances.free_to_bond();
        let bonded = self.member_balance();
        AccountBondState {
            free_to_bond: planck_to_unit(free_to_bond, units),
            free_to_unbond: planck_to_unit(bonded, units),
            total_possible_bond: planck_to_unit(bonded.saturating_add(free_to_bond), units),
            minimum_bond: self.min_join_bond,
            nominations_count: 0,
            controller_imported: false,
        }
    }
}

/// `points * pool_balance / pool_points`, 1:1 for an empty pool.
pub fn points_to_balance(points: Balance, pool_points: Balance, pool_balance: Balance) -> Balance {
    if pool_points == 0 || pool_balance == 0 {
        return points;
    }
    match points.checked_mul(pool_balance) {
        Some(product) => product / pool_points,
        None => (points / pool_points).saturating_mul(pool_balance),
    }
}

/// Whether the controller's key is among the locally imported accounts.
pub fn controller_imported(controller: Option<&AccountId>, imported: &[AccountId]) -> bool {
    controller.is_some_and(|c| imported.contains(c))
}

/// Everything the bond form reads, captured at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BondSnapshot {
    /// Base-unit exponent.
    pub units: u8,
    pub symbol: String,
    pub active: Option<AccountId>,
    pub controller: Option<AccountId>,
    pub direct: AccountBondState,
    pub pooled: AccountBondState,
}

impl BondSnapshot {
    /// Empty snapshot carrying the network's units and symbol.
    pub fn for_network(network: Network) -> Self {
        Self {
            units: network.token_decimals(),
            symbol: network.token_symbol().to_string(),
            ..Self::default()
        }
    }

    pub fn state(&self, mode: StakingMode) -> &AccountBondState {
        match mode {
            StakingMode::Direct => &self.direct,
            StakingMode::Pooled => &self.pooled,
        }
    }

    pub fn build_env(&self, client_available: bool) -> BuildEnv {
        BuildEnv {
            units: self.units,
            active: self.active,
            controller: self.controller,
            client_available,
        }
    }
}
