use super::error::{CodecError, Result};

/// Encode an unsigned integer using the Bitcoin CompactSize scheme.
///
/// Values below `0xfd` occupy a single byte; larger values are written as a
/// marker byte (`0xfd`, `0xfe`, `0xff`) followed by a little-endian u16, u32
/// or u64.
pub fn encode_varint(value: u64) -> Vec<u8> {
    match value {
        0..=0xfc => vec![value as u8],
        0xfd..=0xffff => {
            let mut bytes = vec![0xfd];
            bytes.extend_from_slice(&(value as u16).to_le_bytes());
            bytes
        }
        0x1_0000..=0xffff_ffff => {
            let mut bytes = vec![0xfe];
            bytes.extend_from_slice(&(value as u32).to_le_bytes());
            bytes
        }
        _ => {
            let mut bytes = vec![0xff];
            bytes.extend_from_slice(&value.to_le_bytes());
            bytes
        }
    }
}

/// Decode a CompactSize integer from the front of a byte slice
///
/// Returns (value, bytes_consumed). Non-minimal encodings are accepted.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let Some(&marker) = data.first() else {
        return Err(CodecError::Truncated {
            needed: 1,
            available: 0,
        });
    };

    let width = match marker {
        0xfd => 2,
        0xfe => 4,
        0xff => 8,
        _ => return Ok((u64::from(marker), 1)),
    };

    let body = data.get(1..=width).ok_or(CodecError::Truncated {
        needed: width + 1,
        available: data.len(),
    })?;
    let mut le = [0u8; 8];
    le[..width].copy_from_slice(body);

    Ok((u64::from_le_bytes(le), width + 1))
}

/// Length-prefixed byte string.
pub fn encode_var_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = encode_varint(bytes.len() as u64);
    out.extend_from_slice(bytes);
    out
}

/// Decode a length-prefixed byte string
///
/// Returns (bytes, bytes_consumed)
pub fn decode_var_bytes(data: &[u8]) -> Result<(&[u8], usize)> {
    let (len, prefix) = decode_varint(data)?;
    let available = data.len() - prefix;
    let len = usize::try_from(len).map_err(|_| CodecError::Truncated {
        needed: usize::MAX,
        available,
    })?;
    if len > available {
        return Err(CodecError::Truncated {
            needed: len,
            available,
        });
    }

    Ok((&data[prefix..prefix + len], prefix + len))
}
