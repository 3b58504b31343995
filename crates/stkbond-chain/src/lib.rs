//! Asset Hub adapter for bond and unbond actions.
//!
//! Reads the balances, ledgers and pool data that feed a [`BondSnapshot`],
//! and turns resolved [`BondTransaction`]s into unsigned payloads.
//!
//! [`BondSnapshot`]: stkbond_core::BondSnapshot
//! [`BondTransaction`]: stkbond_core::BondTransaction

pub mod client;
pub mod config;
pub mod error;
pub mod queries;
pub mod snapshot;
pub mod ss58;
pub mod transactions;

pub use client::*;
pub use config::*;
pub use error::*;
pub use queries::account::{AccountBalance, PoolMembership, StakingLedger};
pub use queries::pools::{PoolBond, derive_pool_stash};
pub use snapshot::{BondStateSource, fetch_bond_snapshot};
pub use ss58::{decode_ss58, encode_ss58, parse_account};
pub use transactions::{Era, MORTAL_PERIOD, UnsignedPayload, bond_call_payload};
