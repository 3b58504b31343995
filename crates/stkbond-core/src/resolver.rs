//! Amount proposal, validation and call construction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{AmountError, encode_amount};
use crate::strategy::{self, SignerRole};
use crate::types::{AccountBondState, AccountId, ActionKind, Balance, StakingMode};

/// On-chain call produced for a bond action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BondCall {
    /// `NominationPools::bond_extra(FreeBalance(amount))`.
    PoolBondExtra { amount: Balance },
    /// `NominationPools::unbond(member, amount)`.
    PoolUnbond { member: AccountId, amount: Balance },
    /// `Staking::bond_extra(amount)`.
    BondExtra { amount: Balance },
    /// `Staking::unbond(amount)`.
    Unbond { amount: Balance },
}

impl BondCall {
    pub fn pallet(&self) -> &'static str {
        match self {
            BondCall::PoolBondExtra { .. } | BondCall::PoolUnbond { .. } => "NominationPools",
            BondCall::BondExtra { .. } | BondCall::Unbond { .. } => "Staking",
        }
    }

    pub fn call_name(&self) -> &'static str {
        match self {
            BondCall::PoolBondExtra { .. } | BondCall::BondExtra { .. } => "bond_extra",
            BondCall::PoolUnbond { .. } | BondCall::Unbond { .. } => "unbond",
        }
    }

    /// Encoded amount in base units.
    pub fn amount(&self) -> Balance {
        match self {
            BondCall::PoolBondExtra { amount }
            | BondCall::PoolUnbond { amount, .. }
            | BondCall::BondExtra { amount }
            | BondCall::Unbond { amount } => *amount,
        }
    }

    /// Human-readable description of the call.
    pub fn description(&self) -> String {
        format!("{}::{}({})", self.pallet(), self.call_name(), self.amount())
    }
}

/// Proposed/edited amount and its validity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BondRequest {
    pub amount: Decimal,
    pub valid: bool,
}

/// A call together with the account that must sign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondTransaction {
    pub call: BondCall,
    pub signer: AccountId,
    pub signer_role: SignerRole,
}

/// Environment the builder checks before producing a call.
#[derive(Debug, Clone, Default)]
pub struct BuildEnv {
    /// Base-unit exponent of the network.
    pub units: u8,
    pub active: Option<AccountId>,
    pub controller: Option<AccountId>,
    /// Whether a chain client handle is connected.
    pub client_available: bool,
}

/// Why no transaction was produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildRefusal {
    #[error("Amount is not valid for submission")]
    InvalidAmount,
    #[error("Not connected")]
    NoClient,
    #[error("No account selected")]
    NoActiveAccount,
    #[error("Controller account is not imported")]
    ControllerNotImported,
    #[error("Controller account is unknown")]
    NoController,
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// Amount to pre-fill when `action` is selected.
pub fn propose(
    action: ActionKind,
    mode: StakingMode,
    state: &AccountBondState,
    units: u8,
) -> Decimal {
    strategy::lookup(mode, action).propose(state, units)
}

/// Account-level policy for the action, ignoring the amount.
pub fn policy_allows(action: ActionKind, mode: StakingMode, state: &AccountBondState) -> bool {
    strategy::lookup(mode, action).allows(state)
}

/// Input-level bound check: editable actions need `0 < amount <= max`.
///
/// Fixed actions always pass since their amount cannot be edited.
pub fn within_input_bounds(
    action: ActionKind,
    mode: StakingMode,
    state: &AccountBondState,
    amount: Decimal,
    units: u8,
) -> bool {
    match strategy::lookup(mode, action).max_amount(state, units) {
        Some(max) => amount > Decimal::ZERO && amount <= max,
        None => true,
    }
}

/// Whether `amount` may be submitted for `action`.
pub fn validate(
    action: ActionKind,
    mode: StakingMode,
    state: &AccountBondState,
    amount: Decimal,
    units: u8,
) -> bool {
    if amount.is_sign_negative() && !amount.is_zero() {
        return false;
    }
    policy_allows(action, mode, state) && within_input_bounds(action, mode, state, amount, units)
}

/// Build the call and pick its signer, or say why not.
pub fn try_build(
    mode: StakingMode,
    action: ActionKind,
    request: &BondRequest,
    state: &AccountBondState,
    env: &BuildEnv,
) -> Result<BondTransaction, BuildRefusal> {
    if !request.valid {
        return Err(BuildRefusal::InvalidAmount);
    }
    if !env.client_available {
        return Err(BuildRefusal::NoClient);
    }
    let active = env.active.ok_or(BuildRefusal::NoActiveAccount)?;

    let strategy = strategy::lookup(mode, action);
    let signer = match strategy.signer {
        SignerRole::Active => active,
        SignerRole::Controller => {
            if !state.controller_imported {
                return Err(BuildRefusal::ControllerNotImported);
            }
            env.controller.ok_or(BuildRefusal::NoController)?
        }
    };

    let amount = encode_amount(request.amount, env.units)?;
    let call = strategy.call(&active, amount);
    tracing::debug!(
        "Built {} for {} {} (signer: {:?})",
        call.description(),
        mode,
        action,
        strategy.signer
    );

    Ok(BondTransaction {
        call,
        signer,
        signer_role: strategy.signer,
    })
}

/// Build the call and signer, or nothing when any precondition fails.
pub fn build(
    mode: StakingMode,
    action: ActionKind,
    request: &BondRequest,
    state: &AccountBondState,
    env: &BuildEnv,
) -> Option<BondTransaction> {
    try_build(mode, action, request, state, env)
        .inspect_err(|refusal| {
            tracing::debug!("No transaction for {} {}: {}", mode, action, refusal)
        })
        .ok()
}
