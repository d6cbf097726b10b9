use crate::codec::{FieldKind, FieldMap, FieldSpec, FieldWriter};

use super::registry::MessageFields;

/// Highest value accepted for a payment rating.
pub const MAX_RATING: u64 = 8;

/// Request for payment, sent by a seller to a buyer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invoice {
    pub amount_due: Option<u64>,
    pub expiration_in: Option<u64>,
}

impl Invoice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount_due(mut self, amount: u64) -> Self {
        self.amount_due = Some(amount);
        self
    }

    pub fn with_expiration_in(mut self, blocks: u64) -> Self {
        self.expiration_in = Some(blocks);
        self
    }
}

impl MessageFields for Invoice {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::new(b'p', "amount_due", FieldKind::Integer),
        FieldSpec::new(b'e', "expiration_in", FieldKind::Integer),
    ];

    fn write_fields(&self, writer: FieldWriter) -> FieldWriter {
        writer
            .integer(b'p', self.amount_due)
            .integer(b'e', self.expiration_in)
    }

    fn read_fields(mut fields: FieldMap) -> Self {
        Self {
            amount_due: fields.take_integer(b'p'),
            expiration_in: fields.take_integer(b'e'),
        }
    }
}

/// Buyer's acknowledgement of an invoice, with optional 0..=8 ratings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payment {
    pub description: Option<String>,
    pub invoice_txid: Option<String>,
    pub delivery_quality: Option<u64>,
    pub product_quality: Option<u64>,
    pub communications_quality: Option<u64>,
}

impl Payment {
    pub fn new(invoice_txid: impl Into<String>) -> Self {
        Self {
            invoice_txid: Some(invoice_txid.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_ratings(mut self, delivery: u64, product: u64, communications: u64) -> Self {
        self.delivery_quality = Some(delivery);
        self.product_quality = Some(product);
        self.communications_quality = Some(communications);
        self
    }
}

impl MessageFields for Payment {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::new(b'd', "description", FieldKind::Bytes),
        FieldSpec::new(b't', "invoice_txid", FieldKind::TxRef),
        FieldSpec::new(b'q', "delivery_quality", FieldKind::Integer),
        FieldSpec::new(b'p', "product_quality", FieldKind::Integer),
        FieldSpec::new(b'c', "communications_quality", FieldKind::Integer),
    ];

    fn write_fields(&self, writer: FieldWriter) -> FieldWriter {
        writer
            .text(b'd', self.description.as_deref())
            .tx_ref(b't', self.invoice_txid.as_deref())
            .integer(b'q', self.delivery_quality)
            .integer(b'p', self.product_quality)
            .integer(b'c', self.communications_quality)
    }

    fn read_fields(mut fields: FieldMap) -> Self {
        Self {
            description: fields.take_text(b'd'),
            invoice_txid: fields.take_tx_ref(b't'),
            delivery_quality: fields.take_integer(b'q'),
            product_quality: fields.take_integer(b'p'),
            communications_quality: fields.take_integer(b'c'),
        }
    }
}
