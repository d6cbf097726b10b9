use crate::codec::{FieldKind, FieldMap, FieldSpec, FieldWriter};
use crate::session::cipher::{self, CryptoError};

use super::registry::MessageFields;

/// Session traffic between two addresses.
///
/// - `der` + `session_pkey`: initiation carrying the DH group
/// - `session_pkey` alone: the counterparty's authentication echo
/// - `iv` + `contents`: an AES-256-CBC encrypted line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Communication {
    pub iv: Option<Vec<u8>>,
    pub contents: Option<Vec<u8>>,
    pub der: Option<Vec<u8>>,
    pub session_pkey: Option<Vec<u8>>,
    /// Attached by a session when it hands the message out. Never encoded.
    pub symm_key: Option<Vec<u8>>,
}

impl Communication {
    pub fn init(der: Vec<u8>, session_pkey: Vec<u8>) -> Self {
        Self {
            der: Some(der),
            session_pkey: Some(session_pkey),
            ..Self::default()
        }
    }

    pub fn auth(session_pkey: Vec<u8>) -> Self {
        Self {
            session_pkey: Some(session_pkey),
            ..Self::default()
        }
    }

    pub fn encrypted(iv: Vec<u8>, contents: Vec<u8>) -> Self {
        Self {
            iv: Some(iv),
            contents: Some(contents),
            ..Self::default()
        }
    }

    pub fn is_init(&self) -> bool {
        self.der.is_some() && self.session_pkey.is_some()
    }

    /// Any message carrying a session key, initiations included.
    pub fn is_auth(&self) -> bool {
        self.session_pkey.is_some()
    }

    pub fn contents_plain(&self) -> Result<Vec<u8>, CryptoError> {
        let key = self.symm_key.as_deref().ok_or(CryptoError::NoSymmKey)?;
        let iv = self.iv.as_deref().ok_or(CryptoError::MissingIv)?;
        let contents = self.contents.as_deref().unwrap_or_default();
        cipher::decrypt(key, iv, contents)
    }

    pub fn contents_text(&self) -> Result<String, CryptoError> {
        let plain = self.contents_plain()?;
        Ok(String::from_utf8_lossy(&plain).into_owned())
    }
}

impl MessageFields for Communication {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::new(b'i', "iv", FieldKind::Bytes),
        FieldSpec::new(b'c', "contents", FieldKind::Bytes),
        FieldSpec::new(b'd', "der", FieldKind::Bytes),
        FieldSpec::new(b'p', "session_pkey", FieldKind::Bytes),
    ];

    fn write_fields(&self, writer: FieldWriter) -> FieldWriter {
        writer
            .bytes(b'i', self.iv.as_deref())
            .bytes(b'c', self.contents.as_deref())
            .bytes(b'd', self.der.as_deref())
            .bytes(b'p', self.session_pkey.as_deref())
    }

    fn read_fields(mut fields: FieldMap) -> Self {
        Self {
            iv: fields.take_bytes(b'i'),
            contents: fields.take_bytes(b'c'),
            der: fields.take_bytes(b'd'),
            session_pkey: fields.take_bytes(b'p'),
            symm_key: None,
        }
    }
}
