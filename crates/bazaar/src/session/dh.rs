//! Finite-field Diffie-Hellman over DER encoded `DHParameter` groups.
//!
//! Only the two-integer form `SEQUENCE { prime, base }` is written. A third
//! `privateValueLength` integer is accepted on read and ignored.

use num_bigint::BigUint;

use super::cipher::CryptoError;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

/// Smallest prime size accepted for a generated group.
pub const MIN_GENERATED_BITS: usize = 256;

/// RFC 3526 group 14 prime. The generator is 2.
const MODP_2048_PRIME: &str = concat!(
    "ffffffffffffffffc90fdaa22168c234c4c6628b80dc1cd129024e088a67cc74",
    "020bbea63b139b22514a08798e3404ddef9519b3cd3a431b302b0a6df25f1437",
    "4fe1356d6d51c245e485b576625e7ec6f44c42e9a637ed6b0bff5cb6f406b7ed",
    "ee386bfb5a899fa5ae9f24117c4b1fe649286651ece45b3dc2007cb8a163bf05",
    "98da48361c55d39a69163fa8fd24cf5f83655d23dca3ad961c62f356208552bb",
    "9ed529077096966d670c354e4abc9804f1746c08ca18217c32905e462e36ce3b",
    "e39e772c180e86039b2783a2ec07a28fb5c55df06f4c52c9de2bcbf695581718",
    "3995497cea956ae515d2261898fa051015728e5a8aacaa68ffffffffffffffff",
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhParams {
    prime: BigUint,
    generator: BigUint,
}

impl DhParams {
    pub fn new(prime: BigUint, generator: BigUint) -> Result<Self, CryptoError> {
        if prime <= BigUint::from(3u8) {
            return Err(CryptoError::InvalidDer("prime too small".to_string()));
        }
        if generator <= BigUint::from(1u8) || generator >= prime {
            return Err(CryptoError::InvalidDer("generator out of range".to_string()));
        }
        Ok(Self { prime, generator })
    }

    /// A fresh group: a random safe prime of `bits` bits with generator 2.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        if bits < MIN_GENERATED_BITS {
            return Err(CryptoError::Generation(format!(
                "{bits}-bit prime is below the {MIN_GENERATED_BITS}-bit minimum"
            )));
        }
        let prime = glass_pumpkin::safe_prime::new(bits)
            .map_err(|err| CryptoError::Generation(err.to_string()))?;
        Self::new(prime, BigUint::from(2u8))
    }

    /// The fixed RFC 3526 2048-bit MODP group.
    pub fn modp_2048() -> Result<Self, CryptoError> {
        let prime = BigUint::parse_bytes(MODP_2048_PRIME.as_bytes(), 16)
            .ok_or_else(|| CryptoError::InvalidDer("bad built-in prime".to_string()))?;
        Self::new(prime, BigUint::from(2u8))
    }

    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    pub fn from_der(der: &[u8]) -> Result<Self, CryptoError> {
        let (body, rest) = read_element(der, TAG_SEQUENCE)?;
        if !rest.is_empty() {
            return Err(CryptoError::InvalidDer("trailing bytes".to_string()));
        }

        let (prime, body) = read_integer(body)?;
        let (generator, body) = read_integer(body)?;
        if !body.is_empty() {
            let (_, body) = read_integer(body)?;
            if !body.is_empty() {
                return Err(CryptoError::InvalidDer("unexpected sequence member".to_string()));
            }
        }

        Self::new(prime, generator)
    }

    pub fn to_der(&self) -> Vec<u8> {
        let mut body = write_integer(&self.prime);
        body.extend(write_integer(&self.generator));
        write_element(TAG_SEQUENCE, &body)
    }

    /// `generator ^ secret mod prime`, minimal big-endian.
    pub fn public_key(&self, secret: &BigUint) -> Vec<u8> {
        self.generator.modpow(secret, &self.prime).to_bytes_be()
    }

    /// `peer ^ secret mod prime`, minimal big-endian.
    ///
    /// Peer keys outside `2..=prime-2` are rejected.
    pub fn shared_secret(&self, secret: &BigUint, peer_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let peer = BigUint::from_bytes_be(peer_key);
        let one = BigUint::from(1u8);
        if peer <= one || peer >= &self.prime - &one {
            return Err(CryptoError::InvalidPublicKey);
        }
        Ok(peer.modpow(secret, &self.prime).to_bytes_be())
    }
}

/// Parse a hex private exponent.
pub fn parse_secret(secret_hex: &str) -> Result<BigUint, CryptoError> {
    let trimmed = secret_hex.trim();
    if trimmed.is_empty() {
        return Err(CryptoError::InvalidSecret("empty".to_string()));
    }
    let secret = BigUint::parse_bytes(trimmed.as_bytes(), 16)
        .ok_or_else(|| CryptoError::InvalidSecret("not hex".to_string()))?;
    if secret <= BigUint::from(1u8) {
        return Err(CryptoError::InvalidSecret("exponent too small".to_string()));
    }
    Ok(secret)
}

fn read_element(data: &[u8], tag: u8) -> Result<(&[u8], &[u8]), CryptoError> {
    let (&found, data) = data
        .split_first()
        .ok_or_else(|| CryptoError::InvalidDer("truncated".to_string()))?;
    if found != tag {
        return Err(CryptoError::InvalidDer(format!(
            "expected tag {tag:#04x}, got {found:#04x}"
        )));
    }

    let (&first, data) = data
        .split_first()
        .ok_or_else(|| CryptoError::InvalidDer("truncated length".to_string()))?;
    let (len, data) = if first < 0x80 {
        (usize::from(first), data)
    } else {
        let width = usize::from(first & 0x7f);
        if width == 0 || width > 4 || data.len() < width {
            return Err(CryptoError::InvalidDer("bad length".to_string()));
        }
        let len = data[..width]
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte));
        (len, &data[width..])
    };

    if data.len() < len {
        return Err(CryptoError::InvalidDer("truncated content".to_string()));
    }
    Ok(data.split_at(len))
}

fn read_integer(data: &[u8]) -> Result<(BigUint, &[u8]), CryptoError> {
    let (content, rest) = read_element(data, TAG_INTEGER)?;
    match content.first() {
        None => Err(CryptoError::InvalidDer("empty integer".to_string())),
        Some(byte) if byte & 0x80 != 0 => {
            Err(CryptoError::InvalidDer("negative integer".to_string()))
        }
        Some(_) => Ok((BigUint::from_bytes_be(content), rest)),
    }
}

fn write_integer(value: &BigUint) -> Vec<u8> {
    let mut content = value.to_bytes_be();
    if content.first().is_some_and(|byte| byte & 0x80 != 0) {
        content.insert(0, 0x00);
    }
    write_element(TAG_INTEGER, &content)
}

fn write_element(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|byte| **byte == 0).count();
        out.push(0x80 | (bytes.len() - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
    out.extend_from_slice(content);
    out
}
