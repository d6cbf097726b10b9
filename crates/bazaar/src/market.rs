//! Ledger-backed message store.
//!
//! [`Market`] decodes ledger transactions into messages, keeps only the valid
//! ones, and is the entry point for profiles, listings, payments and sessions.

use thiserror::Error;
use tracing::{debug, warn};

use crate::accumulator::{Listing, Profile, ProfileKind};
use crate::codec::CodecError;
use crate::config::ProtocolConfig;
use crate::geo;
use crate::ledger::{BlockRange, Ledger, LedgerError, TransactionRecord};
use crate::message::{self, Item, Message, MessageType, ValidationErrors};
use crate::network::Network;

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}

/// Filters applied to an address history after decoding.
///
/// Block bounds never exclude unconfirmed messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageQuery {
    pub message_type: Option<MessageType>,
    pub start_block: Option<u64>,
    pub end_block: Option<u64>,
    /// Keep only messages exchanged between these two addresses, either way.
    pub between: Option<(String, String)>,
}

impl MessageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(mut self, message_type: MessageType) -> Self {
        self.message_type = Some(message_type);
        self
    }

    pub fn since(mut self, block: u64) -> Self {
        self.start_block = Some(block);
        self
    }

    pub fn until(mut self, block: u64) -> Self {
        self.end_block = Some(block);
        self
    }

    pub fn between(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.between = Some((a.into(), b.into()));
        self
    }

    fn block_range(&self) -> BlockRange {
        BlockRange {
            start_block: self.start_block,
            end_block: self.end_block,
            include_unconfirmed: true,
        }
    }

    fn matches(&self, message: &Message) -> bool {
        if self
            .message_type
            .is_some_and(|wanted| message.message_type() != wanted)
        {
            return false;
        }
        match &self.between {
            None => true,
            // Exact pair in either direction, so a party's self-addressed
            // messages (sender == receiver) never match.
            Some((a, b)) => {
                let sender = message.sender_addr.as_deref();
                let receiver = message.receiver_addr.as_deref();
                let (a, b) = (Some(a.as_str()), Some(b.as_str()));
                (sender == a && receiver == b) || (sender == b && receiver == a)
            }
        }
    }
}

pub struct Market<L: Ledger> {
    ledger: L,
    config: ProtocolConfig,
}

impl<L: Ledger> Market<L> {
    pub fn new(ledger: L, config: ProtocolConfig) -> Self {
        Self { ledger, config }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    pub fn current_block_height(&self) -> Result<u64, MarketError> {
        Ok(self.ledger.block_height()?)
    }

    pub fn address_for_private_key(&self, private_key: &str) -> Result<String, MarketError> {
        Ok(self.ledger.address_for_private_key(private_key)?)
    }

    /// Decode a single transaction. Validity is not checked.
    pub fn find_message(&self, txid: &str) -> Result<Option<Message>, MarketError> {
        Ok(self
            .ledger
            .transaction(txid)?
            .and_then(|record| Message::from_record(&record, &self.config)))
    }

    /// Valid messages sent or received by `addr`, newest first.
    pub fn messages_by_addr(
        &self,
        addr: &str,
        query: &MessageQuery,
    ) -> Result<Vec<Message>, MarketError> {
        let records = self
            .ledger
            .transactions_by_address(addr, &query.block_range())?;
        Ok(self.decode_valid(&records, query))
    }

    /// Valid messages confirmed in `block_height`.
    pub fn messages_in_block(
        &self,
        block_height: u64,
        message_type: Option<MessageType>,
    ) -> Result<Vec<Message>, MarketError> {
        let records = self.ledger.transactions_in_block(block_height)?;
        let query = MessageQuery {
            message_type,
            ..MessageQuery::default()
        };
        Ok(self.decode_valid(&records, &query))
    }

    fn decode_valid(&self, records: &[TransactionRecord], query: &MessageQuery) -> Vec<Message> {
        records
            .iter()
            .filter_map(|record| Message::from_record(record, &self.config))
            .filter(|message| query.matches(message))
            .filter(|message| self.is_valid(message))
            .collect()
    }

    /// Encode and broadcast. The caller decides whether to validate first.
    pub fn save(&self, message: &Message, private_key: &str) -> Result<String, MarketError> {
        let wire = message.to_wire(&self.config)?;
        let txid = self.ledger.broadcast(&wire, private_key)?;
        debug!(%txid, tag = message.tag(), receiver = %wire.receiver_addr, "broadcast message");
        Ok(txid)
    }

    pub fn validate(&self, message: &Message) -> ValidationErrors {
        let lookup = |txid: &str| match self.find_message(txid) {
            Ok(found) => found,
            Err(err) => {
                warn!(%txid, error = %err, "reference lookup failed");
                None
            }
        };
        message::validate(message, self.config.network, &lookup)
    }

    pub fn is_valid(&self, message: &Message) -> bool {
        self.validate(message).is_empty()
    }

    pub fn seller_profile(&self, addr: &str) -> Result<Profile, MarketError> {
        Profile::accumulate(self, addr, ProfileKind::Seller)
    }

    pub fn buyer_profile(&self, addr: &str) -> Result<Profile, MarketError> {
        Profile::accumulate(self, addr, ProfileKind::Buyer)
    }

    pub fn listing(&self, txid: &str) -> Result<Listing, MarketError> {
        Listing::accumulate(self, txid)
    }

    /// Valid payments referencing `invoice`, newest first.
    pub fn invoice_payments(&self, invoice: &Message) -> Result<Vec<Message>, MarketError> {
        let (Some(txid), Some(sender)) = (invoice.txid.as_deref(), invoice.sender_addr.as_deref())
        else {
            return Ok(Vec::new());
        };

        let mut query = MessageQuery::new().of_type(MessageType::InvoicePaid);
        query.start_block = invoice.block_height;

        let payments = self.messages_by_addr(sender, &query)?;
        Ok(payments
            .into_iter()
            .filter(|payment| {
                payment
                    .as_payment()
                    .is_some_and(|body| body.invoice_txid.as_deref() == Some(txid))
            })
            .collect())
    }

    /// Item creations confirmed from `start_block` back through
    /// `start_block - depth`, newest block first.
    pub fn items_created_since(
        &self,
        start_block: u64,
        depth: u64,
    ) -> Result<Vec<Message>, MarketError> {
        let mut items = Vec::new();
        for height in (start_block.saturating_sub(depth)..=start_block).rev() {
            items.extend(self.messages_in_block(height, Some(MessageType::ItemCreate))?);
        }
        Ok(items)
    }

    /// Item creations within `meters` of a point, over the same window as
    /// [`Market::items_created_since`].
    pub fn items_in_radius(
        &self,
        start_block: u64,
        depth: u64,
        latitude: f64,
        longitude: f64,
        meters: f64,
    ) -> Result<Vec<Message>, MarketError> {
        let items = self.items_created_since(start_block, depth)?;
        Ok(items
            .into_iter()
            .filter(|message| {
                message
                    .as_item()
                    .and_then(Item::location)
                    .is_some_and(|location| {
                        geo::distance_between(
                            latitude,
                            longitude,
                            location.latitude,
                            location.longitude,
                        ) <= meters
                    })
            })
            .collect())
    }
}
