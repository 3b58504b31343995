//! Per `(mode, action)` behaviour table.
//!
//! Proposer, validator and builder all read the same entry, so the three can
//! never disagree about which branch a mode/action pair takes.

use rust_decimal::Decimal;

use crate::amount::{planck_to_unit, saturating_sub};
use crate::resolver::BondCall;
use crate::types::{AccountBondState, AccountId, ActionKind, Balance, StakingMode};

/// Which account signs the resulting call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SignerRole {
    /// The active (stash or pool member) account.
    Active,
    /// The stash's controller account.
    Controller,
}

type ProposeFn = fn(&AccountBondState, u8) -> Decimal;
type PolicyFn = fn(&AccountBondState) -> bool;
type CallFn = fn(&AccountId, Balance) -> BondCall;

/// Behaviour of one `(mode, action)` pair.
#[derive(Debug)]
pub struct BondStrategy {
    pub mode: StakingMode,
    pub action: ActionKind,
    pub signer: SignerRole,
    propose: ProposeFn,
    policy: PolicyFn,
    call: CallFn,
}

impl BondStrategy {
    /// Amount offered when the action is selected.
    pub fn propose(&self, state: &AccountBondState, units: u8) -> Decimal {
        (self.propose)(state, units)
    }

    /// Account-level policy, independent of the amount.
    pub fn allows(&self, state: &AccountBondState) -> bool {
        (self.policy)(state)
    }

    /// Construct the call for an already encoded amount.
    pub fn call(&self, account: &AccountId, amount: Balance) -> BondCall {
        (self.call)(account, amount)
    }

    pub fn editable(&self) -> bool {
        self.action.is_editable()
    }

    /// Largest amount the input accepts; `None` for fixed actions.
    pub fn max_amount(&self, state: &AccountBondState, units: u8) -> Option<Decimal> {
        self.editable().then(|| self.propose(state, units))
    }

    pub fn requires_controller(&self) -> bool {
        self.signer == SignerRole::Controller
    }
}

fn free_to_bond(state: &AccountBondState, _units: u8) -> Decimal {
    state.free_to_bond.max(Decimal::ZERO)
}

fn unbond_to_minimum(state: &AccountBondState, units: u8) -> Decimal {
    let minimum = planck_to_unit(state.minimum_bond, units);
    saturating_sub(state.free_to_unbond, minimum)
}

fn total_possible_bond(state: &AccountBondState, _units: u8) -> Decimal {
    state.total_possible_bond.max(Decimal::ZERO)
}

fn always(_state: &AccountBondState) -> bool {
    true
}

fn has_free_funds(state: &AccountBondState) -> bool {
    state.has_free_to_bond()
}

fn controller_imported(state: &AccountBondState) -> bool {
    state.controller_imported
}

// Unbonding everything while still nominating would leave dangling nominations.
fn direct_unbond_all(state: &AccountBondState) -> bool {
    state.total_possible_bond > Decimal::ZERO && !state.is_nominating() && state.controller_imported
}

fn pool_bond_extra(_account: &AccountId, amount: Balance) -> BondCall {
    BondCall::PoolBondExtra { amount }
}

fn pool_unbond(account: &AccountId, amount: Balance) -> BondCall {
    BondCall::PoolUnbond {
        member: *account,
        amount,
    }
}

fn bond_extra(_account: &AccountId, amount: Balance) -> BondCall {
    BondCall::BondExtra { amount }
}

fn unbond(_account: &AccountId, amount: Balance) -> BondCall {
    BondCall::Unbond { amount }
}

const fn entry(
    mode: StakingMode,
    action: ActionKind,
    signer: SignerRole,
    propose: ProposeFn,
    policy: PolicyFn,
    call: CallFn,
) -> BondStrategy {
    BondStrategy {
        mode,
        action,
        signer,
        propose,
        policy,
        call,
    }
}

use ActionKind::*;
use SignerRole::*;
use StakingMode::*;

#[rustfmt::skip]
static TABLE: [BondStrategy; 8] = [
    entry(Direct, BondSome, Active, free_to_bond, always, bond_extra),
    entry(Direct, BondAll, Active, free_to_bond, has_free_funds, bond_extra),
    entry(Direct, UnbondSome, Controller, unbond_to_minimum, controller_imported, unbond),
    entry(Direct, UnbondAll, Controller, total_possible_bond, direct_unbond_all, unbond),
    entry(Pooled, BondSome, Active, free_to_bond, always, pool_bond_extra),
    entry(Pooled, BondAll, Active, free_to_bond, has_free_funds, pool_bond_extra),
    entry(Pooled, UnbondSome, Active, unbond_to_minimum, always, pool_unbond),
    entry(Pooled, UnbondAll, Active, total_possible_bond, always, pool_unbond),
];

/// Strategy for a mode/action pair.
pub fn lookup(mode: StakingMode, action: ActionKind) -> &'static BondStrategy {
    let row = match mode {
        Direct => 0,
        Pooled => 4,
    };
    let col = match action {
        BondSome => 0,
        BondAll => 1,
        UnbondSome => 2,
        UnbondAll => 3,
    };
    &TABLE[row + col]
}
