//! Bond snapshot assembly.
//!
//! Gathers everything the bond form needs for one account and turns it into
//! a [`BondSnapshot`]. Queries go through [`BondStateSource`] so the
//! assembly can run against something other than a live chain.

use async_trait::async_trait;
use stkbond_core::{
    AccountId, Balance, BondSnapshot, DirectInputs, Network, PoolInputs, RawBalances,
    controller_imported,
};

use crate::ChainClient;
use crate::error::ChainError;
use crate::queries::account::{AccountBalance, PoolMembership};
use crate::queries::pools::PoolBond;

/// Chain reads required to build a [`BondSnapshot`].
#[async_trait]
pub trait BondStateSource: Send + Sync {
    async fn account_balance(&self, account: &AccountId) -> Result<AccountBalance, ChainError>;
    async fn existential_deposit(&self) -> Result<Balance, ChainError>;
    /// Active bond from the staking ledger, zero when not bonded.
    async fn active_bond(&self, stash: &AccountId) -> Result<Balance, ChainError>;
    async fn controller(&self, stash: &AccountId) -> Result<AccountId, ChainError>;
    async fn nomination_count(&self, stash: &AccountId) -> Result<u32, ChainError>;
    async fn min_nominator_bond(&self) -> Result<Balance, ChainError>;
    async fn pool_membership(
        &self,
        account: &AccountId,
    ) -> Result<Option<PoolMembership>, ChainError>;
    async fn pool_bond(&self, pool_id: u32) -> Result<PoolBond, ChainError>;
    async fn min_join_bond(&self) -> Result<Balance, ChainError>;
}

#[async_trait]
impl BondStateSource for ChainClient {
    async fn account_balance(&self, account: &AccountId) -> Result<AccountBalance, ChainError> {
        self.get_account_balance(account).await
    }

    async fn existential_deposit(&self) -> Result<Balance, ChainError> {
        self.get_existential_deposit().await
    }

    async fn active_bond(&self, stash: &AccountId) -> Result<Balance, ChainError> {
        Ok(self
            .get_staking_ledger(stash)
            .await?
            .map(|ledger| ledger.active)
            .unwrap_or(0))
    }

    async fn controller(&self, stash: &AccountId) -> Result<AccountId, ChainError> {
        self.get_controller(stash).await
    }

    async fn nomination_count(&self, stash: &AccountId) -> Result<u32, ChainError> {
        self.get_nomination_count(stash).await
    }

    async fn min_nominator_bond(&self) -> Result<Balance, ChainError> {
        self.get_min_nominator_bond().await
    }

    async fn pool_membership(
        &self,
        account: &AccountId,
    ) -> Result<Option<PoolMembership>, ChainError> {
        self.get_pool_membership(account).await
    }

    async fn pool_bond(&self, pool_id: u32) -> Result<PoolBond, ChainError> {
        self.get_pool_bond(pool_id).await
    }

    async fn min_join_bond(&self) -> Result<Balance, ChainError> {
        self.get_min_join_bond().await
    }
}

/// Fetch the bond snapshot of `account`.
///
/// `imported` lists the accounts the local signer holds keys for; it decides
/// whether the controller is available.
pub async fn fetch_bond_snapshot<S: BondStateSource + ?Sized>(
    source: &S,
    network: Network,
    account: &AccountId,
    imported: &[AccountId],
) -> Result<BondSnapshot, ChainError> {
    let (
        balance,
        existential_deposit,
        active_bond,
        controller,
        nominations_count,
        min_nominator_bond,
        membership,
        min_join_bond,
    ) = futures::try_join!(
        source.account_balance(account),
        source.existential_deposit(),
        source.active_bond(account),
        source.controller(account),
        source.nomination_count(account),
        source.min_nominator_bond(),
        source.pool_membership(account),
        source.min_join_bond(),
    )?;

    let balances = RawBalances {
        free: balance.free,
        frozen: balance.frozen,
        existential_deposit,
    };

    let direct = DirectInputs {
        balances: balances.clone(),
        active_bond,
        min_nominator_bond,
        nominations_count,
        controller_imported: controller_imported(Some(&controller), imported),
    };

    let pooled = match membership {
        Some(member) => {
            let pool = source.pool_bond(member.pool_id).await?;
            PoolInputs {
                balances,
                member_points: member.points,
                pool_points: pool.points,
                pool_balance: pool.balance,
                min_join_bond,
            }
        }
        None => PoolInputs {
            balances,
            min_join_bond,
            ..PoolInputs::default()
        },
    };

    let units = network.token_decimals();
    tracing::debug!(
        "Snapshot: free {} frozen {} bonded {} nominations {}",
        balance.free,
        balance.frozen,
        active_bond,
        nominations_count
    );

    Ok(BondSnapshot {
        active: Some(*account),
        controller: Some(controller),
        direct: direct.bond_state(units),
        pooled: pooled.bond_state(units),
        ..BondSnapshot::for_network(network)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DOT: Balance = 10_000_000_000;
    const STASH: AccountId = [1u8; 32];
    const CONTROLLER: AccountId = [2u8; 32];

    #[derive(Default)]
    struct FixedSource {
        balance: AccountBalance,
        active_bond: Balance,
        controller: Option<AccountId>,
        nominations: u32,
        membership: Option<PoolMembership>,
        pool: PoolBond,
        fail_balance: bool,
    }

    #[async_trait]
    impl BondStateSource for FixedSource {
        async fn account_balance(&self, _: &AccountId) -> Result<AccountBalance, ChainError> {
            if self.fail_balance {
                return Err(ChainError::Connection("offline".into()));
            }
            Ok(self.balance.clone())
        }
        async fn existential_deposit(&self) -> Result<Balance, ChainError> {
            Ok(DOT)
        }
        async fn active_bond(&self, _: &AccountId) -> Result<Balance, ChainError> {
            Ok(self.active_bond)
        }
        async fn controller(&self, stash: &AccountId) -> Result<AccountId, ChainError> {
            Ok(self.controller.unwrap_or(*stash))
        }
        async fn nomination_count(&self, _: &AccountId) -> Result<u32, ChainError> {
            Ok(self.nominations)
        }
        async fn min_nominator_bond(&self) -> Result<Balance, ChainError> {
            Ok(250 * DOT)
        }
        async fn pool_membership(
            &self,
            _: &AccountId,
        ) -> Result<Option<PoolMembership>, ChainError> {
            Ok(self.membership.clone())
        }
        async fn pool_bond(&self, _: u32) -> Result<PoolBond, ChainError> {
            Ok(self.pool)
        }
        async fn min_join_bond(&self) -> Result<Balance, ChainError> {
            Ok(DOT)
        }
    }

    #[tokio::test]
    async fn test_direct_nominator_snapshot() {
        let source = FixedSource {
            balance: AccountBalance {
                free: 400 * DOT,
                frozen: 300 * DOT,
            },
            active_bond: 300 * DOT,
            controller: Some(CONTROLLER),
            nominations: 12,
            ..FixedSource::default()
        };

        let snapshot = fetch_bond_snapshot(&source, Network::Polkadot, &STASH, &[CONTROLLER])
            .await
            .unwrap();

        assert_eq!(snapshot.units, 10);
        assert_eq!(snapshot.symbol, "DOT");
        assert_eq!(snapshot.active, Some(STASH));
        assert_eq!(snapshot.controller, Some(CONTROLLER));
        assert_eq!(snapshot.direct.free_to_bond, dec!(100));
        assert_eq!(snapshot.direct.free_to_unbond, dec!(300));
        assert_eq!(snapshot.direct.total_possible_bond, dec!(400));
        assert_eq!(snapshot.direct.minimum_bond, 250 * DOT);
        assert_eq!(snapshot.direct.nominations_count, 12);
        assert!(snapshot.direct.controller_imported);
        assert_eq!(snapshot.pooled.free_to_unbond, dec!(0));
    }

    #[tokio::test]
    async fn test_controller_not_imported() {
        let source = FixedSource {
            controller: Some(CONTROLLER),
            ..FixedSource::default()
        };
        let snapshot = fetch_bond_snapshot(&source, Network::Polkadot, &STASH, &[STASH])
            .await
            .unwrap();
        assert!(!snapshot.direct.controller_imported);
    }

    #[tokio::test]
    async fn test_stash_controls_itself() {
        let source = FixedSource::default();
        let snapshot = fetch_bond_snapshot(&source, Network::Kusama, &STASH, &[STASH])
            .await
            .unwrap();
        assert_eq!(snapshot.controller, Some(STASH));
        assert!(snapshot.direct.controller_imported);
        assert_eq!(snapshot.units, 12);
    }

    #[tokio::test]
    async fn test_pool_member_snapshot() {
        let source = FixedSource {
            balance: AccountBalance {
                free: 21 * DOT,
                frozen: 0,
            },
            membership: Some(PoolMembership {
                pool_id: 12,
                points: 10 * DOT,
            }),
            pool: PoolBond {
                pool_id: 12,
                points: 1_000 * DOT,
                balance: 1_100 * DOT,
            },
            ..FixedSource::default()
        };

        let snapshot = fetch_bond_snapshot(&source, Network::Polkadot, &STASH, &[])
            .await
            .unwrap();
        assert_eq!(snapshot.pooled.free_to_bond, dec!(20));
        assert_eq!(snapshot.pooled.free_to_unbond, dec!(11));
        assert_eq!(snapshot.pooled.total_possible_bond, dec!(31));
        assert_eq!(snapshot.pooled.minimum_bond, DOT);
    }

    #[tokio::test]
    async fn test_query_failure_propagates() {
        let source = FixedSource {
            fail_balance: true,
            ..FixedSource::default()
        };
        let result = fetch_bond_snapshot(&source, Network::Polkadot, &STASH, &[]).await;
        assert!(matches!(result, Err(ChainError::Connection(_))));
    }
}
