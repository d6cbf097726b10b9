use tracing::debug;

use crate::codec::{self, CodecError, EncodingVersion, FieldMap, FieldSpec, FieldWriter, TAG_LEN};
use crate::config::ProtocolConfig;
use crate::geo;
use crate::ledger::TransactionRecord;
use crate::network::Network;

use super::billing::{Invoice, Payment};
use super::communication::Communication;
use super::item::Item;
use super::kinds::{
    TAG_BUYER_UPDATE, TAG_COMMUNICATION, TAG_INVOICE_CREATE, TAG_INVOICE_PAID, TAG_ITEM_CREATE,
    TAG_ITEM_UPDATE, TAG_SELLER_UPDATE,
};
use super::profile::{Buyer, Seller};
use super::{Message, MessageBody};

/// Schema and field mapping of one message body.
pub trait MessageFields: Sized {
    /// Declaration order is wire order.
    const SCHEMA: &'static [FieldSpec];

    fn write_fields(&self, writer: FieldWriter) -> FieldWriter;

    fn read_fields(fields: FieldMap) -> Self;
}

type BodyDecoder = fn(FieldMap) -> MessageBody;

struct Registration {
    tag: &'static str,
    schema: &'static [FieldSpec],
    decode: BodyDecoder,
}

const REGISTRY: &[Registration] = &[
    Registration {
        tag: TAG_ITEM_CREATE,
        schema: Item::SCHEMA,
        decode: |fields| MessageBody::Item(Item::read_fields(fields)),
    },
    Registration {
        tag: TAG_ITEM_UPDATE,
        schema: Item::SCHEMA,
        decode: |fields| MessageBody::Item(Item::read_fields(fields)),
    },
    Registration {
        tag: TAG_SELLER_UPDATE,
        schema: Seller::SCHEMA,
        decode: |fields| MessageBody::Seller(Seller::read_fields(fields)),
    },
    Registration {
        tag: TAG_BUYER_UPDATE,
        schema: Buyer::SCHEMA,
        decode: |fields| MessageBody::Buyer(Buyer::read_fields(fields)),
    },
    Registration {
        tag: TAG_INVOICE_CREATE,
        schema: Invoice::SCHEMA,
        decode: |fields| MessageBody::Invoice(Invoice::read_fields(fields)),
    },
    Registration {
        tag: TAG_INVOICE_PAID,
        schema: Payment::SCHEMA,
        decode: |fields| MessageBody::Payment(Payment::read_fields(fields)),
    },
    Registration {
        tag: TAG_COMMUNICATION,
        schema: Communication::SCHEMA,
        decode: |fields| MessageBody::Communication(Communication::read_fields(fields)),
    },
];

pub fn is_registered_tag(tag: &str) -> bool {
    REGISTRY.iter().any(|entry| entry.tag == tag)
}

/// Decode a payload into a message body.
///
/// `Ok(None)` means the tag belongs to no message type.
pub fn decode_body(
    data: &[u8],
    version: EncodingVersion,
    network: Network,
) -> codec::Result<Option<MessageBody>> {
    let tag = codec::read_tag(data)?;
    let Some(entry) = REGISTRY.iter().find(|entry| entry.tag == tag) else {
        return Ok(None);
    };

    let fields = codec::decode_fields(&data[TAG_LEN..], entry.schema, version, network)?;
    Ok(Some((entry.decode)(fields)))
}

impl Message {
    /// Interpret a ledger transaction. Anything that is not a well-formed
    /// message yields `None`.
    pub fn from_record(record: &TransactionRecord, config: &ProtocolConfig) -> Option<Self> {
        let version = EncodingVersion::for_block(record.block_height, config.encoding_v1_block);

        let body = match decode_body(&record.data, version, config.network) {
            Ok(Some(body)) => body,
            Ok(None) => return None,
            Err(err) => {
                log_decode_failure(record, &err);
                return None;
            }
        };

        let mut message = Message {
            txid: Some(record.txid.clone()),
            sender_addr: Some(record.sender_addr.clone()),
            receiver_addr: Some(record.receiver_addr.clone()),
            block_height: record.block_height,
            sequence: record.sequence,
            body,
        };
        if let MessageBody::Item(item) = &mut message.body {
            item.set_location(geo::decode_address(&record.receiver_addr).ok());
        }
        Some(message)
    }
}

fn log_decode_failure(record: &TransactionRecord, err: &CodecError) {
    debug!(txid = %record.txid, error = %err, "skipping undecodable transaction");
}
