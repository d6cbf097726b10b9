use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tag of a new item listing
pub const TAG_ITEM_CREATE: &str = "ITCRTE";
/// Tag of an edit to an existing listing
pub const TAG_ITEM_UPDATE: &str = "ITUPDT";
/// Seller profile declaration, edit or transfer
pub const TAG_SELLER_UPDATE: &str = "SLUPDT";
/// Buyer profile declaration, edit or transfer
pub const TAG_BUYER_UPDATE: &str = "BYUPDT";
pub const TAG_INVOICE_CREATE: &str = "INCRTE";
pub const TAG_INVOICE_PAID: &str = "INPAID";
/// Session handshake or encrypted chat line
pub const TAG_COMMUNICATION: &str = "COMMUN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    ItemCreate,
    ItemUpdate,
    SellerUpdate,
    BuyerUpdate,
    InvoiceCreate,
    InvoicePaid,
    Communication,
}

impl MessageType {
    pub const ALL: [Self; 7] = [
        Self::ItemCreate,
        Self::ItemUpdate,
        Self::SellerUpdate,
        Self::BuyerUpdate,
        Self::InvoiceCreate,
        Self::InvoicePaid,
        Self::Communication,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::ItemCreate => TAG_ITEM_CREATE,
            Self::ItemUpdate => TAG_ITEM_UPDATE,
            Self::SellerUpdate => TAG_SELLER_UPDATE,
            Self::BuyerUpdate => TAG_BUYER_UPDATE,
            Self::InvoiceCreate => TAG_INVOICE_CREATE,
            Self::InvoicePaid => TAG_INVOICE_PAID,
            Self::Communication => TAG_COMMUNICATION,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unknown message type: {s}"))
    }
}
