use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use thiserror::Error;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;
/// CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;

type Encryptor = cbc::Encryptor<Aes256>;
type Decryptor = cbc::Decryptor<Aes256>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("no symmetric key attached to message")]
    NoSymmKey,
    #[error("message has no initialization vector")]
    MissingIv,
    #[error("invalid key or iv length: key {key}, iv {iv}")]
    InvalidLength { key: usize, iv: usize },
    #[error("decryption failed: bad padding or wrong key")]
    Decrypt,
    #[error("invalid DH parameters: {0}")]
    InvalidDer(String),
    #[error("invalid session secret: {0}")]
    InvalidSecret(String),
    #[error("peer public key out of range")]
    InvalidPublicKey,
    #[error("DH group generation failed: {0}")]
    Generation(String),
}

/// AES-256-CBC with PKCS#7 padding.
pub fn encrypt(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Encryptor::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidLength {
        key: key.len(),
        iv: iv.len(),
    })?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

pub fn decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Decryptor::new_from_slices(key, iv).map_err(|_| CryptoError::InvalidLength {
        key: key.len(),
        iv: iv.len(),
    })?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Decrypt)
}

pub fn random_iv() -> [u8; IV_LEN] {
    rand::random()
}
