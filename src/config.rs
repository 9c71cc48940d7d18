// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 YieldWay Labs

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup. Anything
//! required for chain or custody operations is validated here so that a
//! missing value fails the process early instead of failing per-request.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the ledger document store | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `RPC_URL` | EVM JSON-RPC endpoint | Required |
//! | `STABLECOIN_ADDRESS` | ERC-20 stablecoin contract (6 decimals) | Required |
//! | `MASTER_WALLET_PRIVATE_KEY` | Hex key of the master funding wallet | Required |
//! | `WALLET_ENCRYPTION_KEY` | 32-byte hex key for at-rest custody encryption | Required |
//! | `CONFIRMATION_TIMEOUT_SECS` | Block-confirmation wait before `Unconfirmed` | `90` |
//! | `SETTLEMENT_DELAY_MS` | Artificial settlement delay of the FX mock | `3000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{env, path::PathBuf, time::Duration};

use url::Url;

/// Environment variable name for the ledger data directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

const DEFAULT_DATA_DIR: &str = "/data";
const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 90;
const DEFAULT_SETTLEMENT_DELAY_MS: u64 = 3000;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for the ledger document store.
    pub data_dir: PathBuf,
    /// HTTP bind address.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
    /// EVM JSON-RPC endpoint.
    pub rpc_url: Url,
    /// ERC-20 stablecoin contract address (6 decimals).
    pub stablecoin_address: String,
    /// Hex-encoded private key of the master funding wallet.
    pub master_wallet_key: String,
    /// 32-byte hex key used to encrypt custodial secrets at rest.
    pub wallet_encryption_key: String,
    /// How long to wait for block confirmation before reporting `Unconfirmed`.
    pub confirmation_timeout: Duration,
    /// Artificial delay applied by the mock settlement provider.
    pub settlement_delay: Duration,
}

impl Config {
    /// Load and validate configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(env_or_default(DATA_DIR_ENV, DEFAULT_DATA_DIR));
        let host = env_or_default("HOST", "0.0.0.0");
        let port = env_or_default("PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?;

        let rpc_url: Url = env_required("RPC_URL")?
            .parse()
            .map_err(|e: url::ParseError| ConfigError::Invalid {
                var: "RPC_URL",
                reason: e.to_string(),
            })?;

        let stablecoin_address = env_required("STABLECOIN_ADDRESS")?;
        let master_wallet_key = env_required("MASTER_WALLET_PRIVATE_KEY")?;

        let wallet_encryption_key = env_required("WALLET_ENCRYPTION_KEY")?;
        validate_hex_key(&wallet_encryption_key)?;

        let confirmation_timeout = Duration::from_secs(parse_u64(
            "CONFIRMATION_TIMEOUT_SECS",
            DEFAULT_CONFIRMATION_TIMEOUT_SECS,
        )?);
        let settlement_delay = Duration::from_millis(parse_u64(
            "SETTLEMENT_DELAY_MS",
            DEFAULT_SETTLEMENT_DELAY_MS,
        )?);

        Ok(Self {
            data_dir,
            host,
            port,
            rpc_url,
            stablecoin_address,
            master_wallet_key,
            wallet_encryption_key,
            confirmation_timeout,
            settlement_delay,
        })
    }
}

fn env_required(var: &'static str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var)),
    }
}

fn env_or_default(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

fn parse_u64(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(value) => value.parse::<u64>().map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// The at-rest encryption key must be exactly 32 bytes of hex.
fn validate_hex_key(key: &str) -> Result<(), ConfigError> {
    let trimmed = key.strip_prefix("0x").unwrap_or(key);
    if trimmed.len() != 64 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::Invalid {
            var: "WALLET_ENCRYPTION_KEY",
            reason: "expected 64 hex characters (32 bytes)".to_string(),
        });
    }
    Ok(())
}
