use crate::codec::{FieldKind, FieldMap, FieldSpec, FieldWriter, KeyRef};

use super::registry::MessageFields;

/// Seller declaration, edit, transfer (`transfer_pkey` = new address) or
/// close (`transfer_pkey` = [`KeyRef::Cleared`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Seller {
    pub description: Option<String>,
    pub alias: Option<String>,
    pub transfer_pkey: Option<KeyRef>,
    pub communications_pkey: Option<KeyRef>,
}

impl Seller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_communications_pkey(mut self, pkey: KeyRef) -> Self {
        self.communications_pkey = Some(pkey);
        self
    }

    pub fn transfer_to(mut self, addr: impl Into<String>) -> Self {
        self.transfer_pkey = Some(KeyRef::Address(addr.into()));
        self
    }

    pub fn close(mut self) -> Self {
        self.transfer_pkey = Some(KeyRef::Cleared);
        self
    }
}

impl MessageFields for Seller {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::new(b'd', "description", FieldKind::Bytes),
        FieldSpec::new(b'a', "alias", FieldKind::Bytes),
        FieldSpec::new(b't', "transfer_pkey", FieldKind::KeyRef),
        FieldSpec::new(b'p', "communications_pkey", FieldKind::KeyRef),
    ];

    fn write_fields(&self, writer: FieldWriter) -> FieldWriter {
        writer
            .text(b'd', self.description.as_deref())
            .text(b'a', self.alias.as_deref())
            .key_ref(b't', self.transfer_pkey.as_ref())
            .key_ref(b'p', self.communications_pkey.as_ref())
    }

    fn read_fields(mut fields: FieldMap) -> Self {
        Self {
            description: fields.take_text(b'd'),
            alias: fields.take_text(b'a'),
            transfer_pkey: fields.take_key_ref(b't'),
            communications_pkey: fields.take_key_ref(b'p'),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buyer {
    pub description: Option<String>,
    pub alias: Option<String>,
    pub transfer_pkey: Option<KeyRef>,
}

impl Buyer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn transfer_to(mut self, addr: impl Into<String>) -> Self {
        self.transfer_pkey = Some(KeyRef::Address(addr.into()));
        self
    }

    pub fn close(mut self) -> Self {
        self.transfer_pkey = Some(KeyRef::Cleared);
        self
    }
}

impl MessageFields for Buyer {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::new(b'd', "description", FieldKind::Bytes),
        FieldSpec::new(b'a', "alias", FieldKind::Bytes),
        FieldSpec::new(b't', "transfer_pkey", FieldKind::KeyRef),
    ];

    fn write_fields(&self, writer: FieldWriter) -> FieldWriter {
        writer
            .text(b'd', self.description.as_deref())
            .text(b'a', self.alias.as_deref())
            .key_ref(b't', self.transfer_pkey.as_ref())
    }

    fn read_fields(mut fields: FieldMap) -> Self {
        Self {
            description: fields.take_text(b'd'),
            alias: fields.take_text(b'a'),
            transfer_pkey: fields.take_key_ref(b't'),
        }
    }
}
