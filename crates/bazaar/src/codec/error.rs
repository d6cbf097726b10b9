use thiserror::Error;

use crate::network::AddressError;

/// Payload codec error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("truncated payload: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("invalid message tag: {0:?}")]
    InvalidTag(Vec<u8>),

    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("address error: {0}")]
    Address(#[from] AddressError),

    #[error("message has no receiver address")]
    MissingReceiver,
}

pub type Result<T> = std::result::Result<T, CodecError>;
