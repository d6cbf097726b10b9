use crate::ledger::Ledger;
use crate::market::{Market, MarketError, MessageQuery};
use crate::message::{Item, Message, MessageType, ValidationErrors};

use super::profile::Profile;

/// An item creation folded together with its seller's later edits.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub txid: String,
    pub create_item: Option<Message>,
    pub description: Option<String>,
    pub price_currency: Option<String>,
    pub price_in_units: Option<u64>,
    pub expiration_in: Option<u64>,
    pub seller_profile: Option<Profile>,
}

impl Listing {
    pub fn accumulate<L: Ledger>(market: &Market<L>, txid: &str) -> Result<Self, MarketError> {
        let mut listing = Self {
            txid: txid.to_string(),
            create_item: None,
            description: None,
            price_currency: None,
            price_in_units: None,
            expiration_in: None,
            seller_profile: None,
        };

        let Some(create) = market.find_message(txid)?.filter(|message| {
            message.message_type() == MessageType::ItemCreate && market.is_valid(message)
        }) else {
            return Ok(listing);
        };

        if let Some(item) = create.as_item() {
            listing.merge(item);
        }

        if let Some(seller) = create.sender_addr.as_deref() {
            let mut query = MessageQuery::new().of_type(MessageType::ItemUpdate);
            query.start_block = create.block_height;

            let updates = market.messages_by_addr(seller, &query)?;
            for update in updates.iter().rev() {
                if let Some(item) = update.as_item() {
                    if item.create_txid.as_deref() == Some(txid) {
                        listing.merge(item);
                    }
                }
            }

            listing.seller_profile = Some(market.seller_profile(seller)?);
        }

        listing.create_item = Some(create);
        Ok(listing)
    }

    fn merge(&mut self, item: &Item) {
        if item.description.is_some() {
            self.description.clone_from(&item.description);
        }
        if item.price_currency.is_some() {
            self.price_currency.clone_from(&item.price_currency);
        }
        if item.price_in_units.is_some() {
            self.price_in_units = item.price_in_units;
        }
        if item.expiration_in.is_some() {
            self.expiration_in = item.expiration_in;
        }
    }

    pub fn is_found(&self) -> bool {
        self.create_item.is_some()
    }

    /// Seller address, taken from the creation.
    pub fn addr(&self) -> Option<&str> {
        self.create_item.as_ref()?.sender_addr.as_deref()
    }

    fn created(&self) -> Option<&Item> {
        self.create_item.as_ref()?.as_item()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.created()?.latitude
    }

    pub fn longitude(&self) -> Option<f64> {
        self.created()?.longitude
    }

    pub fn radius(&self) -> Option<u64> {
        self.created()?.radius
    }

    /// Block at which the listing lapses.
    pub fn expiration_at(&self) -> Option<u64> {
        let created_at = self.create_item.as_ref()?.block_height?;
        created_at.checked_add(self.expiration_in?)
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let seller_ok = self
            .seller_profile
            .as_ref()
            .is_some_and(|profile| profile.is_valid() && profile.is_active());
        if !seller_ok {
            errors.add("seller_profile", "invalid or missing");
        }
        if self.create_item.is_none() {
            errors.add("create_item", "invalid or missing");
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
