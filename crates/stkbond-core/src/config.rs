//! Application configuration and persistence utilities.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{Network, StakingMode};

/// Configuration error type.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// An account whose keys are available to the local signer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportedAccount {
    /// SS58-encoded address.
    pub address: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub network: Network,
    /// RPC endpoint overriding the network defaults.
    #[serde(default)]
    pub rpc_endpoint: Option<String>,
    #[serde(default)]
    pub imported_accounts: Vec<ImportedAccount>,
    #[serde(default)]
    pub default_mode: StakingMode,
    #[serde(default = "default_mortal_era")]
    pub use_mortal_era: bool,
}

fn default_mortal_era() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            network: Network::Polkadot,
            rpc_endpoint: None,
            imported_accounts: Vec::new(),
            default_mode: StakingMode::Direct,
            use_mortal_era: true,
        }
    }
}

impl AppConfig {
    /// Record an imported account. Does not add duplicates.
    pub fn import_account(&mut self, address: String, label: Option<String>) {
        if self.is_imported(&address) {
            return;
        }
        self.imported_accounts.push(ImportedAccount { address, label });
    }

    /// Returns true if an account was removed.
    pub fn forget_account(&mut self, address: &str) -> bool {
        let len_before = self.imported_accounts.len();
        self.imported_accounts.retain(|a| a.address != address);
        self.imported_accounts.len() < len_before
    }

    pub fn is_imported(&self, address: &str) -> bool {
        self.imported_accounts.iter().any(|a| a.address == address)
    }

    pub fn imported_addresses(&self) -> impl Iterator<Item = &str> {
        self.imported_accounts.iter().map(|a| a.address.as_str())
    }
}

// ==================== Path Utilities ====================

/// Get the config directory.
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    ProjectDirs::from("xyz", "dotidx", "stkbond")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| ConfigError::Other("Could not determine config directory".to_string()))
}

/// Get the config file path.
pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    get_config_dir().map(|dir| dir.join("config.json"))
}

// ==================== Config I/O ====================

/// Load configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path()?)
}

/// Load configuration from `path`, or defaults if the file is absent.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path()?)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
