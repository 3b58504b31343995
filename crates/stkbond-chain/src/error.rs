//! Error types for chain operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Failed to connect to chain: {0}")]
    Connection(String),

    #[error("Subxt error: {0}")]
    Subxt(#[from] subxt::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] subxt::error::DecodeError),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
