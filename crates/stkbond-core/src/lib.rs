//! Core bond/unbond decision logic.
//!
//! This crate holds everything that does not touch the network: the amount
//! proposer, the validator, the transaction builder, the `(mode, action)`
//! strategy table they share, and the session state machine driving a single
//! bond form.

#[cfg(feature = "persistence")]
pub mod config;

pub mod amount;
pub mod options;
pub mod resolver;
pub mod session;
pub mod strategy;
pub mod types;

pub use amount::*;
pub use options::*;
pub use resolver::*;
pub use session::*;
pub use strategy::{BondStrategy, SignerRole};
pub use types::*;
