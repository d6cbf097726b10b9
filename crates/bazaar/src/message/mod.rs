//! Marketplace messages
//!
//! Every message is one ledger transaction: a sender, a receiver and a tagged
//! payload. The tag selects the body type and therefore the field schema.
//!
//! Internal module boundaries:
//! - `kinds`: message type tags
//! - `item`, `profile`, `billing`, `communication`: body types and schemas
//! - `registry`: closed tag-to-decoder table and ledger record decoding
//! - `validation`: per-type rule sets and the collected error list
//! - `tests`: encoding and validation coverage
//!
//! | Body | Tag(s) |
//! |------|--------|
//! | [`Item`] | `ITCRTE`, `ITUPDT` |
//! | [`Seller`] | `SLUPDT` |
//! | [`Buyer`] | `BYUPDT` |
//! | [`Invoice`] | `INCRTE` |
//! | [`Payment`] | `INPAID` |
//! | [`Communication`] | `COMMUN` |

mod billing;
mod communication;
mod item;
mod kinds;
mod profile;
mod registry;
mod validation;

pub use billing::{Invoice, MAX_RATING, Payment};
pub use communication::Communication;
pub use item::Item;
pub use kinds::{
    MessageType, TAG_BUYER_UPDATE, TAG_COMMUNICATION, TAG_INVOICE_CREATE, TAG_INVOICE_PAID,
    TAG_ITEM_CREATE, TAG_ITEM_UPDATE, TAG_SELLER_UPDATE,
};
pub use profile::{Buyer, Seller};
pub use registry::{MessageFields, decode_body, is_registered_tag};
pub use validation::{ValidationErrors, is_transaction_id, validate};

use crate::codec::{self, CodecError, EncodingVersion, FieldWriter};
use crate::config::ProtocolConfig;
use crate::geo;
use crate::ledger::WireTransaction;
use crate::network::Network;

#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    Item(Item),
    Seller(Seller),
    Buyer(Buyer),
    Invoice(Invoice),
    Payment(Payment),
    Communication(Communication),
}

impl MessageBody {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Item(item) => item.message_type(),
            Self::Seller(_) => MessageType::SellerUpdate,
            Self::Buyer(_) => MessageType::BuyerUpdate,
            Self::Invoice(_) => MessageType::InvoiceCreate,
            Self::Payment(_) => MessageType::InvoicePaid,
            Self::Communication(_) => MessageType::Communication,
        }
    }

    fn write_fields(&self) -> FieldWriter {
        let writer = FieldWriter::new();
        match self {
            Self::Item(body) => body.write_fields(writer),
            Self::Seller(body) => body.write_fields(writer),
            Self::Buyer(body) => body.write_fields(writer),
            Self::Invoice(body) => body.write_fields(writer),
            Self::Payment(body) => body.write_fields(writer),
            Self::Communication(body) => body.write_fields(writer),
        }
    }
}

macro_rules! impl_from_body {
    ($($variant:ident),+) => {
        $(impl From<$variant> for MessageBody {
            fn from(body: $variant) -> Self {
                Self::$variant(body)
            }
        })+
    };
}

impl_from_body!(Item, Seller, Buyer, Invoice, Payment, Communication);

/// A message either read from the ledger or about to be broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub txid: Option<String>,
    pub sender_addr: Option<String>,
    pub receiver_addr: Option<String>,
    pub block_height: Option<u64>,
    pub sequence: u64,
    pub body: MessageBody,
}

impl Message {
    pub fn new(body: impl Into<MessageBody>) -> Self {
        Self {
            txid: None,
            sender_addr: None,
            receiver_addr: None,
            block_height: None,
            sequence: 0,
            body: body.into(),
        }
    }

    /// Set an explicit receiver. Items take their location from it.
    pub fn with_receiver(mut self, addr: impl Into<String>) -> Self {
        let addr = addr.into();
        if let MessageBody::Item(item) = &mut self.body {
            item.set_location(geo::decode_address(&addr).ok());
        }
        self.receiver_addr = Some(addr);
        self
    }

    pub fn with_sender(mut self, addr: impl Into<String>) -> Self {
        self.sender_addr = Some(addr.into());
        self
    }

    pub fn with_block_height(mut self, block_height: u64) -> Self {
        self.block_height = Some(block_height);
        self
    }

    pub fn message_type(&self) -> MessageType {
        self.body.message_type()
    }

    pub fn tag(&self) -> &'static str {
        self.message_type().tag()
    }

    /// Receiver the message will be (or was) sent to.
    ///
    /// Items without an explicit receiver go to their sender when they are an
    /// update, and to the geospatial address of their location when they are
    /// a create.
    pub fn receiver(&self, network: Network) -> Option<String> {
        if let Some(addr) = &self.receiver_addr {
            return Some(addr.clone());
        }
        let MessageBody::Item(item) = &self.body else {
            return None;
        };
        if item.is_update() {
            return self.sender_addr.clone();
        }
        let location = item.location()?;
        geo::encode_address(location.latitude, location.longitude, location.radius, network).ok()
    }

    pub fn encoding_version(&self, v1_cutover: u64) -> EncodingVersion {
        EncodingVersion::for_block(self.block_height, v1_cutover)
    }

    pub fn encode(&self, version: EncodingVersion) -> codec::Result<Vec<u8>> {
        codec::encode_payload(self.tag(), &self.body.write_fields().into_fields(), version)
    }

    /// Receiver, payload and tip handed to the broadcast collaborator.
    pub fn to_wire(&self, config: &ProtocolConfig) -> codec::Result<WireTransaction> {
        let receiver_addr = self
            .receiver(config.network)
            .ok_or(CodecError::MissingReceiver)?;
        let data = self.encode(self.encoding_version(config.encoding_v1_block))?;
        Ok(WireTransaction {
            receiver_addr,
            data,
            tip: config.default_tip,
        })
    }

    pub fn as_item(&self) -> Option<&Item> {
        match &self.body {
            MessageBody::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_seller(&self) -> Option<&Seller> {
        match &self.body {
            MessageBody::Seller(seller) => Some(seller),
            _ => None,
        }
    }

    pub fn as_buyer(&self) -> Option<&Buyer> {
        match &self.body {
            MessageBody::Buyer(buyer) => Some(buyer),
            _ => None,
        }
    }

    pub fn as_invoice(&self) -> Option<&Invoice> {
        match &self.body {
            MessageBody::Invoice(invoice) => Some(invoice),
            _ => None,
        }
    }

    pub fn as_payment(&self) -> Option<&Payment> {
        match &self.body {
            MessageBody::Payment(payment) => Some(payment),
            _ => None,
        }
    }

    pub fn as_communication(&self) -> Option<&Communication> {
        match &self.body {
            MessageBody::Communication(communication) => Some(communication),
            _ => None,
        }
    }

    pub(crate) fn as_communication_mut(&mut self) -> Option<&mut Communication> {
        match &mut self.body {
            MessageBody::Communication(communication) => Some(communication),
            _ => None,
        }
    }
}
