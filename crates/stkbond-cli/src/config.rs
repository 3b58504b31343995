//! Configuration loading for the CLI.

use std::path::Path;

use stkbond_chain::parse_account;
use stkbond_core::AccountId;
use stkbond_core::config::{AppConfig, ConfigError, load_config, load_config_from};

/// Load from `path` if given, otherwise from the platform config dir.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
}

/// Imported accounts as raw ids; unparsable entries are skipped.
pub fn imported_accounts(config: &AppConfig) -> Vec<AccountId> {
    config
        .imported_addresses()
        .filter_map(|address| match parse_account(address) {
            Ok(account) => Some(account),
            Err(e) => {
                tracing::warn!("Skipping imported account: {}", e);
                None
            }
        })
        .collect()
}
