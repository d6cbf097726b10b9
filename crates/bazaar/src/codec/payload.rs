use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{CodecError, Result};
use super::varint::{decode_var_bytes, decode_varint, encode_var_bytes, encode_varint};
use crate::network::{Network, address_to_hash160};

/// Every payload starts with a six character ASCII tag.
pub const TAG_LEN: usize = 6;

/// Single byte written for an address-key that has been explicitly cleared.
const CLEARED_KEY: u8 = 0x00;

/// Wire layout of binary references, chosen by block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingVersion {
    /// Binary references stored as their hex text.
    V0,
    /// Binary references stored as raw bytes.
    V1,
}

impl EncodingVersion {
    /// Unconfirmed messages always use the current version.
    pub fn for_block(block_height: Option<u64>, v1_cutover: u64) -> Self {
        match block_height {
            Some(height) if height < v1_cutover => Self::V0,
            _ => Self::V1,
        }
    }
}

/// Encoding kind declared for a field in a message schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Length-prefixed raw bytes.
    Bytes,
    /// CompactSize unsigned integer.
    Integer,
    /// Transaction id, version dependent.
    TxRef,
    /// hash160 of an address, or a cleared sentinel.
    KeyRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: u8,
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(key: u8, name: &'static str, kind: FieldKind) -> Self {
        Self { key, name, kind }
    }
}

/// Reference to an address carried in a profile field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRef {
    /// Written as a single zero byte. On a transfer field this closes the profile.
    Cleared,
    Address(String),
}

impl KeyRef {
    pub fn address(addr: impl Into<String>) -> Self {
        Self::Address(addr.into())
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, Self::Cleared)
    }

    pub fn as_address(&self) -> Option<&str> {
        match self {
            Self::Cleared => None,
            Self::Address(addr) => Some(addr),
        }
    }

    /// True when this reference points at `addr`.
    pub fn is_address(&self, addr: &str) -> bool {
        self.as_address() == Some(addr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Bytes(Vec<u8>),
    Integer(u64),
    TxRef(String),
    KeyRef(KeyRef),
}

/// Decoded field values keyed by their short key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    values: HashMap<u8, FieldValue>,
}

impl FieldMap {
    pub fn insert(&mut self, key: u8, value: FieldValue) {
        self.values.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: u8) -> Option<&FieldValue> {
        self.values.get(&key)
    }

    pub fn take_bytes(&mut self, key: u8) -> Option<Vec<u8>> {
        match self.values.remove(&key) {
            Some(FieldValue::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Text fields arrive as untrusted bytes and are decoded lossily.
    pub fn take_text(&mut self, key: u8) -> Option<String> {
        self.take_bytes(key)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn take_integer(&mut self, key: u8) -> Option<u64> {
        match self.values.remove(&key) {
            Some(FieldValue::Integer(value)) => Some(value),
            _ => None,
        }
    }

    pub fn take_tx_ref(&mut self, key: u8) -> Option<String> {
        match self.values.remove(&key) {
            Some(FieldValue::TxRef(txid)) => Some(txid),
            _ => None,
        }
    }

    pub fn take_key_ref(&mut self, key: u8) -> Option<KeyRef> {
        match self.values.remove(&key) {
            Some(FieldValue::KeyRef(key_ref)) => Some(key_ref),
            _ => None,
        }
    }
}

/// Collects the present fields of a message in schema order.
#[derive(Debug, Default)]
pub struct FieldWriter {
    fields: Vec<(u8, FieldValue)>,
}

impl FieldWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, key: u8, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.fields
                .push((key, FieldValue::Bytes(value.as_bytes().to_vec())));
        }
        self
    }

    pub fn bytes(mut self, key: u8, value: Option<&[u8]>) -> Self {
        if let Some(value) = value {
            self.fields.push((key, FieldValue::Bytes(value.to_vec())));
        }
        self
    }

    pub fn integer(mut self, key: u8, value: Option<u64>) -> Self {
        if let Some(value) = value {
            self.fields.push((key, FieldValue::Integer(value)));
        }
        self
    }

    pub fn tx_ref(mut self, key: u8, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.fields.push((key, FieldValue::TxRef(value.to_string())));
        }
        self
    }

    pub fn key_ref(mut self, key: u8, value: Option<&KeyRef>) -> Self {
        if let Some(value) = value {
            self.fields.push((key, FieldValue::KeyRef(value.clone())));
        }
        self
    }

    pub fn into_fields(self) -> Vec<(u8, FieldValue)> {
        self.fields
    }
}

/// Encode a tagged payload. Fields are written in the order given.
pub fn encode_payload(
    tag: &str,
    fields: &[(u8, FieldValue)],
    version: EncodingVersion,
) -> Result<Vec<u8>> {
    if tag.len() != TAG_LEN || !tag.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(CodecError::InvalidTag(tag.as_bytes().to_vec()));
    }

    let mut buf = tag.as_bytes().to_vec();
    for (key, value) in fields {
        buf.extend(encode_var_bytes(&[*key]));
        match value {
            FieldValue::Bytes(bytes) => buf.extend(encode_var_bytes(bytes)),
            FieldValue::Integer(value) => buf.extend(encode_varint(*value)),
            FieldValue::TxRef(txid) => {
                let raw = match version {
                    EncodingVersion::V0 => txid.as_bytes().to_vec(),
                    EncodingVersion::V1 => {
                        hex::decode(txid).map_err(|err| CodecError::InvalidHex(err.to_string()))?
                    }
                };
                buf.extend(encode_var_bytes(&raw));
            }
            FieldValue::KeyRef(KeyRef::Cleared) => buf.extend(encode_var_bytes(&[CLEARED_KEY])),
            FieldValue::KeyRef(KeyRef::Address(addr)) => {
                buf.extend(encode_var_bytes(&address_to_hash160(addr)?));
            }
        }
    }

    Ok(buf)
}

/// Read the leading type tag without interpreting the fields.
pub fn read_tag(data: &[u8]) -> Result<&str> {
    let tag = data.get(..TAG_LEN).ok_or(CodecError::Truncated {
        needed: TAG_LEN,
        available: data.len(),
    })?;
    if !tag.iter().all(u8::is_ascii_alphanumeric) {
        return Err(CodecError::InvalidTag(tag.to_vec()));
    }

    std::str::from_utf8(tag).map_err(|_| CodecError::InvalidTag(tag.to_vec()))
}

/// Decode the key/value pairs following the tag using a concrete schema.
///
/// Keys missing from the schema are skipped as length-prefixed strings. A
/// repeated key keeps its last value.
pub fn decode_fields(
    data: &[u8],
    schema: &[FieldSpec],
    version: EncodingVersion,
    network: Network,
) -> Result<FieldMap> {
    let mut fields = FieldMap::default();
    let mut offset = 0;

    while offset < data.len() {
        let (key, consumed) = decode_var_bytes(&data[offset..])?;
        offset += consumed;

        let spec = match key {
            [short] => schema.iter().find(|spec| spec.key == *short),
            _ => None,
        };
        let Some(spec) = spec else {
            let (_, consumed) = decode_var_bytes(&data[offset..])?;
            offset += consumed;
            debug!(key = ?key, "skipping unknown payload field");
            continue;
        };

        let value = if spec.kind == FieldKind::Integer {
            let (value, consumed) = decode_varint(&data[offset..])?;
            offset += consumed;
            FieldValue::Integer(value)
        } else {
            let (raw, consumed) = decode_var_bytes(&data[offset..])?;
            offset += consumed;
            match spec.kind {
                FieldKind::TxRef => FieldValue::TxRef(match version {
                    EncodingVersion::V0 => String::from_utf8_lossy(raw).into_owned(),
                    EncodingVersion::V1 => hex::encode(raw),
                }),
                FieldKind::KeyRef if raw == [CLEARED_KEY] => FieldValue::KeyRef(KeyRef::Cleared),
                FieldKind::KeyRef => {
                    FieldValue::KeyRef(KeyRef::Address(network.hash160_to_address(raw)?))
                }
                _ => FieldValue::Bytes(raw.to_vec()),
            }
        };
        fields.insert(spec.key, value);
    }

    Ok(fields)
}
