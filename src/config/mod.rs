//! # Configuration Module
//!
//! This module handles loading and validating configuration from
//! environment variables. All settings are centralized here.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = AppConfig::from_env()?;
//! println!("Algorand RPC: {}", config.algorand_rpc_url);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Description | Example |
//! |----------|-------------|---------|
//! | `ALGORAND_RPC_URL` | Algorand node REST endpoint | `https://mainnet-api.4160.nodely.dev` |
//! | `VOI_RPC_URL` | Voi node REST endpoint | `https://mainnet-api.voi.nodely.dev` |
//! | `ALGORAND_CHAIN_ID` | Numeric chain id in bridge notes | `416001` |
//! | `VOI_CHAIN_ID` | Numeric chain id in bridge notes | `416101` |
//! | `ALGORAND_ASSET_ID` | Native token asset id on Algorand | `302189` |
//! | `VOI_ASSET_ID` | Native token asset id on Voi | `302190` |
//! | `ALGORAND_APP_ID` | Token contract app id on Algorand | `2657887` |
//! | `VOI_APP_ID` | Token contract app id on Voi | `47` |
//! | `RELAY_ADDRESS` | Bridge relay escrow address | `ARAMIDW...` |
//! | `SERVER_HOST` | HTTP server host | `127.0.0.1` |
//! | `SERVER_PORT` | HTTP server port | `8080` |

use std::env;
use thiserror::Error;

use crate::buckets::Network;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is missing
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Failed to parse a value
    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // ==========================================
    // LEDGER SETTINGS
    // ==========================================
    /// Algorand node REST endpoint.
    pub algorand_rpc_url: String,

    /// Voi node REST endpoint.
    pub voi_rpc_url: String,

    /// Numeric chain id used for Algorand in bridge notes.
    pub algorand_chain_id: u64,

    /// Numeric chain id used for Voi in bridge notes.
    pub voi_chain_id: u64,

    /// Native token asset id on Algorand.
    pub algorand_asset_id: u64,

    /// Native token asset id on Voi.
    pub voi_asset_id: u64,

    /// Token contract application id on Algorand.
    pub algorand_app_id: u64,

    /// Token contract application id on Voi.
    pub voi_app_id: u64,

    // ==========================================
    // BRIDGE SETTINGS
    // ==========================================
    /// The fixed, well-known relay escrow address. Cross-network legs
    /// are plain transfers to this address; the note is the instruction.
    pub relay_address: String,

    /// Rounds to wait before treating a submitted leg as settled.
    pub confirming_rounds: u64,

    /// Maximum confirmation-monitor polling iterations.
    pub monitor_max_attempts: u32,

    /// Milliseconds between monitor iterations.
    pub monitor_interval_ms: u64,

    /// First-iteration scan lookback in rounds.
    pub monitor_lookback: u64,

    // ==========================================
    // TRANSFER SETTINGS
    // ==========================================
    /// Fixed protocol fee (base units) paid alongside a same-network
    /// representation conversion.
    pub conversion_fee: u64,

    // ==========================================
    // SERVER SETTINGS
    // ==========================================
    /// HTTP server host address.
    pub server_host: String,

    /// HTTP server port number.
    pub server_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Use `dotenvy::dotenv()` before calling this to load from `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Ledgers
            algorand_rpc_url: get_env_or_default(
                "ALGORAND_RPC_URL",
                "https://mainnet-api.4160.nodely.dev",
            ),
            voi_rpc_url: get_env_or_default(
                "VOI_RPC_URL",
                "https://mainnet-api.voi.nodely.dev",
            ),
            algorand_chain_id: parse_env("ALGORAND_CHAIN_ID", "416001")?,
            voi_chain_id: parse_env("VOI_CHAIN_ID", "416101")?,
            algorand_asset_id: parse_env("ALGORAND_ASSET_ID", "302189")?,
            voi_asset_id: parse_env("VOI_ASSET_ID", "302190")?,
            algorand_app_id: parse_env("ALGORAND_APP_ID", "2657887")?,
            voi_app_id: parse_env("VOI_APP_ID", "47")?,

            // Bridge
            relay_address: get_env("RELAY_ADDRESS")?,
            confirming_rounds: parse_env("CONFIRMING_ROUNDS", "4")?,
            monitor_max_attempts: parse_env("MONITOR_MAX_ATTEMPTS", "60")?,
            monitor_interval_ms: parse_env("MONITOR_INTERVAL_MS", "5000")?,
            monitor_lookback: parse_env("MONITOR_LOOKBACK", "100")?,

            // Transfers
            conversion_fee: parse_env("CONVERSION_FEE", "10000")?,

            // Server
            server_host: get_env_or_default("SERVER_HOST", "127.0.0.1"),
            server_port: parse_env("SERVER_PORT", "8080")?,
        })
    }

    /// REST endpoint for one network.
    pub fn rpc_url(&self, network: Network) -> &str {
        match network {
            Network::Algorand => &self.algorand_rpc_url,
            Network::Voi => &self.voi_rpc_url,
        }
    }

    /// Numeric chain id for one network, as embedded in bridge notes.
    pub fn chain_id(&self, network: Network) -> u64 {
        match network {
            Network::Algorand => self.algorand_chain_id,
            Network::Voi => self.voi_chain_id,
        }
    }

    /// Native token asset id on one network.
    pub fn asset_id(&self, network: Network) -> u64 {
        match network {
            Network::Algorand => self.algorand_asset_id,
            Network::Voi => self.voi_asset_id,
        }
    }

    /// Token contract app id on one network.
    pub fn app_id(&self, network: Network) -> u64 {
        match network {
            Network::Algorand => self.algorand_app_id,
            Network::Voi => self.voi_app_id,
        }
    }
}

#[cfg(test)]
impl AppConfig {
    /// Fixed configuration for unit tests: no environment involved.
    pub fn for_tests() -> Self {
        Self {
            algorand_rpc_url: "http://localhost:4001".into(),
            voi_rpc_url: "http://localhost:4002".into(),
            algorand_chain_id: 416001,
            voi_chain_id: 416101,
            algorand_asset_id: 302189,
            voi_asset_id: 302190,
            algorand_app_id: 2657887,
            voi_app_id: 47,
            relay_address: crate::ledger::encode_address(&[0xAA; 32]),
            confirming_rounds: 4,
            monitor_max_attempts: 3,
            monitor_interval_ms: 1,
            monitor_lookback: 100,
            conversion_fee: 10_000,
            server_host: "127.0.0.1".into(),
            server_port: 0,
        }
    }
}

/// Get a required environment variable.
fn get_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an environment variable with a default value.
fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::ParseError(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_or_default() {
        // Should return default when not set
        let value = get_env_or_default("NONEXISTENT_VAR_12345", "default_value");
        assert_eq!(value, "default_value");
    }

    #[test]
    fn per_network_accessors() {
        let config = AppConfig::for_tests();
        assert_eq!(config.chain_id(Network::Algorand), 416001);
        assert_eq!(config.chain_id(Network::Voi), 416101);
        assert_ne!(config.asset_id(Network::Algorand), config.asset_id(Network::Voi));
    }
}
