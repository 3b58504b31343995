//! Core domain types for bond and unbond actions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type Balance = u128;

/// Raw 32-byte account identifier.
pub type AccountId = [u8; 32];

/// Supported networks - exhaustive match required (no default case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Network {
    #[default]
    Polkadot,
    Kusama,
    Westend,
    Paseo,
}

impl Network {
    pub fn token_symbol(&self) -> &'static str {
        match self {
            Network::Polkadot => "DOT",
            Network::Kusama => "KSM",
            Network::Westend => "WND",
            Network::Paseo => "PAS",
        }
    }

    /// Base-unit exponent (`units`) used for decimal conversion.
    pub fn token_decimals(&self) -> u8 {
        match self {
            Network::Polkadot => 10,
            Network::Kusama => 12,
            Network::Westend => 12,
            Network::Paseo => 10,
        }
    }

    pub fn ss58_format(&self) -> u16 {
        match self {
            Network::Polkadot => 0,
            Network::Kusama => 2,
            Network::Westend => 42,
            Network::Paseo => 0,
        }
    }

    /// Returns all known networks.
    pub fn all() -> &'static [Network] {
        &[
            Network::Polkadot,
            Network::Kusama,
            Network::Westend,
            Network::Paseo,
        ]
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Polkadot => write!(f, "Polkadot"),
            Network::Kusama => write!(f, "Kusama"),
            Network::Westend => write!(f, "Westend"),
            Network::Paseo => write!(f, "Paseo"),
        }
    }
}

/// Connection status for the chain client.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

/// How the account stakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StakingMode {
    /// Solo nominator staking (stash + controller).
    #[default]
    Direct,
    /// Nomination pool membership.
    Pooled,
}

impl StakingMode {
    pub fn label(&self) -> &'static str {
        match self {
            StakingMode::Direct => "Direct",
            StakingMode::Pooled => "Pooled",
        }
    }
}

impl std::fmt::Display for StakingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Action requested in the bond form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    BondSome,
    BondAll,
    UnbondSome,
    UnbondAll,
}

impl ActionKind {
    /// Returns all actions in menu order.
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::BondSome,
            ActionKind::BondAll,
            ActionKind::UnbondSome,
            ActionKind::UnbondAll,
        ]
    }

    pub fn is_bond(&self) -> bool {
        matches!(self, ActionKind::BondSome | ActionKind::BondAll)
    }

    pub fn is_unbond(&self) -> bool {
        matches!(self, ActionKind::UnbondSome | ActionKind::UnbondAll)
    }

    /// Whether the user may edit the proposed amount.
    pub fn is_editable(&self) -> bool {
        matches!(self, ActionKind::BondSome | ActionKind::UnbondSome)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::BondSome => "Bond Extra",
            ActionKind::BondAll => "Bond All",
            ActionKind::UnbondSome => "Unbond",
            ActionKind::UnbondAll => "Unbond All",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Bond options for one staking mode, as reported by the balance provider.
///
/// Decimal fields are in whole tokens; `minimum_bond` stays in base units
/// because that is how the chain reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountBondState {
    /// Funds available to add to the stake.
    pub free_to_bond: Decimal,
    /// Bonded funds eligible for removal.
    pub free_to_unbond: Decimal,
    /// What would be bonded after bonding all free funds.
    pub total_possible_bond: Decimal,
    /// Nominator minimum (Direct) or pool join minimum (Pooled).
    pub minimum_bond: Balance,
    /// Active nominations of the stash. Direct mode only.
    #[serde(default)]
    pub nominations_count: u32,
    /// Whether the controller key is available locally. Direct mode only.
    #[serde(default)]
    pub controller_imported: bool,
}

impl AccountBondState {
    pub fn has_free_to_bond(&self) -> bool {
        self.free_to_bond > Decimal::ZERO
    }

    pub fn is_nominating(&self) -> bool {
        self.nominations_count > 0
    }
}
