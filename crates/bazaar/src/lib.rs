//! Marketplace protocol carried in Bitcoin transactions.
//!
//! Sellers list items at geospatial addresses, buyers pay invoices, and both
//! sides keep profiles and talk over DH-keyed encrypted sessions. Every piece
//! of state is a message on the ledger; current state is derived by folding
//! message history.

pub mod accumulator;
pub mod codec;
pub mod config;
pub mod geo;
pub mod ledger;
mod market;
pub mod message;
pub mod network;
pub mod session;

pub use accumulator::{Listing, Profile, ProfileKind};
pub use codec::{CodecError, EncodingVersion, KeyRef};
pub use config::{ConfigError, ProtocolConfig};
pub use geo::{GeoError, Location};
pub use ledger::{InMemoryLedger, Ledger, LedgerError, TransactionRecord};
pub use market::{Market, MarketError, MessageQuery};
pub use message::{
    Buyer, Communication, Invoice, Item, Message, MessageBody, MessageType, Payment, Seller,
    ValidationErrors,
};
pub use network::{AddressError, Network};
pub use session::{CryptoError, Session, SessionError};
