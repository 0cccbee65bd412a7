use crate::domain::Address;
use crate::orchestration::{OracleConfig, DEFAULT_FEE_TIERS};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Settings of the read API binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        Ok(Config {
            port,
            database_path,
        })
    }
}

/// Pricing settings for hosts that run an [`crate::AccountingEngine`].
impl OracleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        Ok(OracleConfig {
            reference_token: parse_address(&env_map, "REFERENCE_TOKEN")?,
            display_token: parse_address(&env_map, "DISPLAY_TOKEN")?,
            fee_tiers: parse_fee_tiers(&env_map)?,
        })
    }
}

fn parse_address(env_map: &HashMap<String, String>, key: &str) -> Result<Address, ConfigError> {
    let raw = env_map
        .get(key)
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))?;
    Address::from_str(raw.trim()).map_err(|_| {
        ConfigError::InvalidValue(key.to_string(), format!("not an address: {}", raw))
    })
}

fn parse_fee_tiers(env_map: &HashMap<String, String>) -> Result<Vec<u32>, ConfigError> {
    let Some(tiers_str) = env_map.get("FEE_TIERS") else {
        return Ok(DEFAULT_FEE_TIERS.to_vec());
    };

    let tiers = tiers_str
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>().map_err(|_| {
                ConfigError::InvalidValue(
                    "FEE_TIERS".to_string(),
                    format!("must be comma-separated integers, got {}", s),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if tiers.is_empty() {
        return Err(ConfigError::InvalidValue(
            "FEE_TIERS".to_string(),
            "at least one fee tier is required".to_string(),
        ));
    }
    Ok(tiers)
}
