use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::Network;

pub const ENV_NETWORK: &str = "BAZAAR_NETWORK";
pub const ENV_ENCODING_V1_BLOCK: &str = "BAZAAR_ENCODING_V1_BLOCK";
pub const ENV_DEFAULT_TIP: &str = "BAZAAR_DEFAULT_TIP";
pub const ENV_DH_PRIME_BITS: &str = "BAZAAR_DH_PRIME_BITS";

/// First block at which binary references are stored as raw bytes.
pub const DEFAULT_ENCODING_V1_BLOCK: u64 = 300_000;

/// Satoshis offered to miners on top of the data outputs.
pub const DEFAULT_TIP: u64 = 20_000;

/// Prime size of the DH group generated for each new session.
pub const DEFAULT_DH_PRIME_BITS: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid BAZAAR_NETWORK: {0}")]
    InvalidNetwork(String),
    #[error("invalid BAZAAR_ENCODING_V1_BLOCK: {0}")]
    InvalidEncodingV1Block(String),
    #[error("invalid BAZAAR_DEFAULT_TIP: {0}")]
    InvalidDefaultTip(String),
    #[error("invalid BAZAAR_DH_PRIME_BITS: {0}")]
    InvalidDhPrimeBits(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub network: Network,
    pub encoding_v1_block: u64,
    pub default_tip: u64,
    pub dh_prime_bits: usize,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            encoding_v1_block: DEFAULT_ENCODING_V1_BLOCK,
            default_tip: DEFAULT_TIP,
            dh_prime_bits: DEFAULT_DH_PRIME_BITS,
        }
    }
}

impl ProtocolConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let network = parse_with_lookup(&lookup, ENV_NETWORK, defaults.network, |raw| {
            raw.parse::<Network>()
                .map_err(|error| ConfigError::InvalidNetwork(error.to_string()))
        })?;
        let encoding_v1_block = parse_with_lookup(
            &lookup,
            ENV_ENCODING_V1_BLOCK,
            defaults.encoding_v1_block,
            |raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|error| ConfigError::InvalidEncodingV1Block(format!("{raw}: {error}")))
            },
        )?;
        let default_tip = parse_with_lookup(&lookup, ENV_DEFAULT_TIP, defaults.default_tip, |raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|error| ConfigError::InvalidDefaultTip(format!("{raw}: {error}")))
        })?;
        let dh_prime_bits =
            parse_with_lookup(&lookup, ENV_DH_PRIME_BITS, defaults.dh_prime_bits, |raw| {
                raw.trim()
                    .parse::<usize>()
                    .map_err(|error| ConfigError::InvalidDhPrimeBits(format!("{raw}: {error}")))
            })?;

        Ok(Self {
            network,
            encoding_v1_block,
            default_tip,
            dh_prime_bits,
        })
    }

    pub fn with_encoding_v1_block(mut self, block: u64) -> Self {
        self.encoding_v1_block = block;
        self
    }

    pub fn with_default_tip(mut self, tip: u64) -> Self {
        self.default_tip = tip;
        self
    }

    pub fn with_dh_prime_bits(mut self, bits: usize) -> Self {
        self.dh_prime_bits = bits;
        self
    }
}

fn parse_with_lookup<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
    parser: impl FnOnce(String) -> Result<T, ConfigError>,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => parser(raw),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn config_defaults_without_env() {
        let config = ProtocolConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ProtocolConfig::default());
        assert_eq!(config.encoding_v1_block, 300_000);
        assert_eq!(config.default_tip, 20_000);
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.dh_prime_bits, 1024);
    }

    #[test]
    fn config_applies_env_overrides() {
        let values = HashMap::from([
            (ENV_NETWORK, "mainnet"),
            (ENV_ENCODING_V1_BLOCK, "0"),
            (ENV_DEFAULT_TIP, " 5000 "),
            (ENV_DH_PRIME_BITS, "2048"),
        ]);
        let config =
            ProtocolConfig::from_lookup(|key| values.get(key).map(ToString::to_string)).unwrap();
        assert_eq!(config.network, Network::Mainnet);
        assert_eq!(config.encoding_v1_block, 0);
        assert_eq!(config.default_tip, 5000);
        assert_eq!(config.dh_prime_bits, 2048);
    }

    #[test]
    fn config_rejects_invalid_values() {
        let values = HashMap::from([(ENV_DEFAULT_TIP, "lots")]);
        let error = ProtocolConfig::from_lookup(|key| values.get(key).map(ToString::to_string))
            .expect_err("invalid tip should fail");
        assert!(matches!(error, ConfigError::InvalidDefaultTip(_)));

        let values = HashMap::from([(ENV_NETWORK, "signet")]);
        let error = ProtocolConfig::from_lookup(|key| values.get(key).map(ToString::to_string))
            .expect_err("unknown network should fail");
        assert!(matches!(error, ConfigError::InvalidNetwork(_)));
    }

    #[test]
    fn config_serializes_network_lowercase() {
        let json = serde_json::to_value(ProtocolConfig::default()).unwrap();
        assert_eq!(json["network"], "testnet");
    }
}
