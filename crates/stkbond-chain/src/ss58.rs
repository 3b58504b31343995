//! SS58 address encoding utilities.

use crate::error::ChainError;
use stkbond_core::AccountId;

const SS58_PREFIX: &[u8] = b"SS58PRE";

fn checksum(payload: &[u8]) -> [u8; 2] {
    let mut input = Vec::with_capacity(SS58_PREFIX.len() + payload.len());
    input.extend_from_slice(SS58_PREFIX);
    input.extend_from_slice(payload);
    let hash = sp_crypto_hashing::blake2_512(&input);
    [hash[0], hash[1]]
}

/// Encode an account with a specific SS58 prefix.
pub fn encode_ss58(account: &AccountId, prefix: u16) -> String {
    let mut payload = Vec::with_capacity(36);

    if prefix < 64 {
        payload.push(prefix as u8);
    } else if prefix < 16384 {
        let first = ((prefix & 0x00FC) >> 2) as u8 | 0x40;
        let second = ((prefix >> 8) as u8) | ((prefix & 0x03) << 6) as u8;
        payload.push(first);
        payload.push(second);
    } else {
        // Unsupported prefix, fall back to generic
        payload.push(42);
    }

    payload.extend_from_slice(account);
    let sum = checksum(&payload);
    payload.extend_from_slice(&sum);

    bs58::encode(payload).into_string()
}

/// Decode an SS58 address into the account and its prefix.
pub fn decode_ss58(address: &str) -> Result<(AccountId, u16), ChainError> {
    let data = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| ChainError::Address(format!("{}: {}", address, e)))?;

    let (prefix, prefix_len) = match data.as_slice() {
        [first, ..] if *first < 64 => (*first as u16, 1),
        [first, second, ..] if *first < 128 => {
            let lower = ((first & 0b0011_1111) << 2) | (second >> 6);
            let upper = second & 0b0011_1111;
            (lower as u16 | ((upper as u16) << 8), 2)
        }
        _ => {
            return Err(ChainError::Address(format!(
                "{}: unsupported prefix",
                address
            )));
        }
    };

    if data.len() != prefix_len + 32 + 2 {
        return Err(ChainError::Address(format!(
            "{}: unexpected length {}",
            address,
            data.len()
        )));
    }

    let body = &data[..prefix_len + 32];
    if checksum(body) != data[prefix_len + 32..] {
        return Err(ChainError::Address(format!("{}: bad checksum", address)));
    }

    let mut account = [0u8; 32];
    account.copy_from_slice(&body[prefix_len..]);
    Ok((account, prefix))
}

/// Decode an address, ignoring its prefix.
pub fn parse_account(address: &str) -> Result<AccountId, ChainError> {
    decode_ss58(address).map(|(account, _)| account)
}
