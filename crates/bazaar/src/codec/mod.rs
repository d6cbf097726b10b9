//! Binary payload codec
//!
//! Messages travel as a six character ASCII tag followed by `(key, value)`
//! pairs. Keys are one-byte, length-prefixed strings; values are written
//! according to the kind the message schema declares for the key.
//!
//! Internal module boundaries:
//! - `error`: codec error and result types
//! - `varint`: CompactSize integers and length-prefixed byte strings
//! - `payload`: schemas, field values and tagged payload encode/decode
//! - `tests`: codec coverage
//!
//! # Encoding versions
//!
//! Binary references (transaction ids) were stored as hex text before the
//! version 1 cutover block and as raw bytes afterwards. The version is a pure
//! function of the message's block height; see [`EncodingVersion::for_block`].

mod error;
mod payload;
mod varint;

pub use error::{CodecError, Result};
pub use payload::{
    EncodingVersion, FieldKind, FieldMap, FieldSpec, FieldValue, FieldWriter, KeyRef, TAG_LEN,
    decode_fields, encode_payload, read_tag,
};
pub use varint::{decode_var_bytes, decode_varint, encode_var_bytes, encode_varint};

#[cfg(test)]
mod tests;
