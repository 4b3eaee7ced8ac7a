//! Client configuration
//!
//! The client is driven by an explicit `ClientConfig` passed to
//! `EscrowClient::new`; nothing is read from ambient state once it is built.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "ESCROW_CLIENT_CONFIG";

/// Config file used when neither a path nor the env var is given
pub const DEFAULT_CONFIG_PATH: &str = "config/escrow_client.toml";

/// Ledger client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// RPC endpoint URL (e.g., "http://127.0.0.1:8899")
    pub endpoint: String,
    /// Base58 id of the deployed escrow program
    pub program_id: String,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, program_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            program_id: program_id.into(),
        }
    }

    /// Loads configuration from a TOML file.
    ///
    /// Path priority: explicit `path` > `ESCROW_CLIENT_CONFIG` > `config/escrow_client.toml`.
    /// The loaded configuration is validated before it is returned.
    pub fn load_from_path(path: Option<&str>) -> anyhow::Result<Self> {
        let config_path = path
            .map(|p| p.to_string())
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        if !Path::new(&config_path).exists() {
            return Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/escrow_client.template.toml config/escrow_client.toml\n\
                Then edit config/escrow_client.toml with your actual values.",
                config_path
            ));
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid configuration in {}", config_path))?;
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: ClientConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies command line overrides on top of the loaded values.
    pub fn with_overrides(mut self, endpoint: Option<String>, program_id: Option<String>) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(program_id) = program_id {
            self.program_id = program_id;
        }
        self
    }

    /// Validates the endpoint scheme and the program id encoding.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            anyhow::bail!(
                "Configuration error: endpoint '{}' must start with http:// or https://",
                self.endpoint
            );
        }
        self.program_id()?;
        Ok(())
    }

    /// Parsed program id.
    pub fn program_id(&self) -> anyhow::Result<Pubkey> {
        Pubkey::from_str(&self.program_id).map_err(|_| {
            anyhow::anyhow!(
                "Configuration error: program_id '{}' is not a base58 32-byte address",
                self.program_id
            )
        })
    }
}
