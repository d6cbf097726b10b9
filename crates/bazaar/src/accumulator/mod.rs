//! State accumulation
//!
//! Derived records are rebuilt on every read by folding the valid messages an
//! address has sent and received. Nothing is cached between reads.
//!
//! Internal module boundaries:
//! - `profile`: seller and buyer identities, including transfers
//! - `listing`: an item creation plus its updates

mod listing;
mod profile;

pub use listing::Listing;
pub use profile::{Profile, ProfileKind};
