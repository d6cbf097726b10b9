//! Bitcoin network selection and base58check address helpers.
//!
//! Every address conversion takes an explicit [`Network`]; there is no
//! process-wide network switch.

use std::fmt;
use std::str::FromStr;

use bitcoin::base58;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAINNET_P2PKH: u8 = 0x00;
const MAINNET_P2SH: u8 = 0x05;
const TESTNET_P2PKH: u8 = 0x6f;
const TESTNET_P2SH: u8 = 0xc4;

/// Length of a RIPEMD160(SHA256(pubkey)) digest.
pub const HASH160_LEN: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58check address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid hash160 length: expected 20, got {0}")]
    InvalidHashLength(usize),

    #[error("unknown network: {0}")]
    UnknownNetwork(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    /// Version byte prepended to a hash160 for pay-to-pubkey-hash addresses.
    pub fn p2pkh_version(self) -> u8 {
        match self {
            Self::Mainnet => MAINNET_P2PKH,
            Self::Testnet => TESTNET_P2PKH,
        }
    }

    /// Three character prefix of geospatial receiver tokens.
    pub fn geo_prefix(self) -> &'static str {
        match self {
            Self::Mainnet => "1DZ",
            Self::Testnet => "mfZ",
        }
    }

    pub fn from_kind(kind: bitcoin::NetworkKind) -> Self {
        match kind {
            bitcoin::NetworkKind::Main => Self::Mainnet,
            bitcoin::NetworkKind::Test => Self::Testnet,
        }
    }

    /// Render a hash160 as a P2PKH address on this network.
    pub fn hash160_to_address(self, hash160: &[u8]) -> Result<String, AddressError> {
        if hash160.len() != HASH160_LEN {
            return Err(AddressError::InvalidHashLength(hash160.len()));
        }
        let mut payload = Vec::with_capacity(HASH160_LEN + 1);
        payload.push(self.p2pkh_version());
        payload.extend_from_slice(hash160);
        Ok(base58::encode_check(&payload))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" => Ok(Self::Mainnet),
            "testnet" | "testnet3" => Ok(Self::Testnet),
            other => Err(AddressError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Extract the hash160 from a base58check address of either network.
///
/// The network is carried by the address's own version byte.
pub fn address_to_hash160(address: &str) -> Result<[u8; HASH160_LEN], AddressError> {
    let decoded = base58::decode_check(address).map_err(|err| AddressError::InvalidAddress {
        address: address.to_string(),
        reason: err.to_string(),
    })?;
    if decoded.len() != HASH160_LEN + 1 {
        return Err(AddressError::InvalidAddress {
            address: address.to_string(),
            reason: format!("unexpected payload length {}", decoded.len()),
        });
    }

    let mut hash = [0u8; HASH160_LEN];
    hash.copy_from_slice(&decoded[1..]);
    Ok(hash)
}

/// True for well-formed P2PKH or P2SH addresses on mainnet or testnet.
pub fn is_valid_address(address: &str) -> bool {
    match base58::decode_check(address) {
        Ok(decoded) => {
            decoded.len() == HASH160_LEN + 1
                && matches!(
                    decoded[0],
                    MAINNET_P2PKH | MAINNET_P2SH | TESTNET_P2PKH | TESTNET_P2SH
                )
        }
        Err(_) => false,
    }
}
