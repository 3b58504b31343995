//! Chain query implementations.

pub mod account;
pub mod pools;
pub mod staking;
