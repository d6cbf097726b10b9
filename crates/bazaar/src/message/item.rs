use crate::codec::{FieldKind, FieldMap, FieldSpec, FieldWriter};
use crate::geo::Location;

use super::kinds::MessageType;
use super::registry::MessageFields;

/// A listing, or an edit to one when `create_txid` is set.
///
/// Location is not part of the payload. For a create it is carried by the
/// geospatial receiver address; on decode it is read back out of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub description: Option<String>,
    pub price_currency: Option<String>,
    pub create_txid: Option<String>,
    pub price_in_units: Option<u64>,
    pub expiration_in: Option<u64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<u64>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    /// An edit of the listing created by `create_txid`.
    pub fn update(create_txid: impl Into<String>) -> Self {
        Self {
            create_txid: Some(create_txid.into()),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_price(mut self, currency: impl Into<String>, units: u64) -> Self {
        self.price_currency = Some(currency.into());
        self.price_in_units = Some(units);
        self
    }

    pub fn with_price_in_units(mut self, units: u64) -> Self {
        self.price_in_units = Some(units);
        self
    }

    pub fn with_expiration_in(mut self, blocks: u64) -> Self {
        self.expiration_in = Some(blocks);
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64, radius: u64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self.radius = Some(radius);
        self
    }

    pub fn is_update(&self) -> bool {
        self.create_txid.is_some()
    }

    pub fn message_type(&self) -> MessageType {
        if self.is_update() {
            MessageType::ItemUpdate
        } else {
            MessageType::ItemCreate
        }
    }

    pub fn location(&self) -> Option<Location> {
        Some(Location {
            latitude: self.latitude?,
            longitude: self.longitude?,
            radius: self.radius?,
        })
    }

    pub(crate) fn set_location(&mut self, location: Option<Location>) {
        self.latitude = location.map(|l| l.latitude);
        self.longitude = location.map(|l| l.longitude);
        self.radius = location.map(|l| l.radius);
    }
}

impl MessageFields for Item {
    const SCHEMA: &'static [FieldSpec] = &[
        FieldSpec::new(b'd', "description", FieldKind::Bytes),
        FieldSpec::new(b'c', "price_currency", FieldKind::Bytes),
        FieldSpec::new(b't', "create_txid", FieldKind::TxRef),
        FieldSpec::new(b'p', "price_in_units", FieldKind::Integer),
        FieldSpec::new(b'e', "expiration_in", FieldKind::Integer),
    ];

    fn write_fields(&self, writer: FieldWriter) -> FieldWriter {
        writer
            .text(b'd', self.description.as_deref())
            .text(b'c', self.price_currency.as_deref())
            .tx_ref(b't', self.create_txid.as_deref())
            .integer(b'p', self.price_in_units)
            .integer(b'e', self.expiration_in)
    }

    fn read_fields(mut fields: FieldMap) -> Self {
        Self {
            description: fields.take_text(b'd'),
            price_currency: fields.take_text(b'c'),
            create_txid: fields.take_tx_ref(b't'),
            price_in_units: fields.take_integer(b'p'),
            expiration_in: fields.take_integer(b'e'),
            ..Self::default()
        }
    }
}
