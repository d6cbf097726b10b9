use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::codec::KeyRef;
use crate::ledger::Ledger;
use crate::market::{Market, MarketError, MessageQuery};
use crate::message::{Message, MessageBody, MessageType, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Seller,
    Buyer,
}

impl ProfileKind {
    pub fn message_type(self) -> MessageType {
        match self {
            Self::Seller => MessageType::SellerUpdate,
            Self::Buyer => MessageType::BuyerUpdate,
        }
    }
}

/// Profile fields carried by a single seller or buyer message.
struct ProfileFields<'a> {
    description: Option<&'a str>,
    alias: Option<&'a str>,
    communications_pkey: Option<&'a KeyRef>,
    transfer_pkey: Option<&'a KeyRef>,
}

impl<'a> ProfileFields<'a> {
    fn of(message: &'a Message) -> Option<Self> {
        match &message.body {
            MessageBody::Seller(seller) => Some(Self {
                description: seller.description.as_deref(),
                alias: seller.alias.as_deref(),
                communications_pkey: seller.communications_pkey.as_ref(),
                transfer_pkey: seller.transfer_pkey.as_ref(),
            }),
            MessageBody::Buyer(buyer) => Some(Self {
                description: buyer.description.as_deref(),
                alias: buyer.alias.as_deref(),
                communications_pkey: None,
                transfer_pkey: buyer.transfer_pkey.as_ref(),
            }),
            _ => None,
        }
    }
}

/// Current state of a seller or buyer identity at one address.
///
/// Built by replaying the address's profile messages oldest first. A profile
/// that arrived by transfer starts from the sending address's profile, and
/// folding stops at the first transfer away or close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub addr: String,
    pub kind: ProfileKind,
    pub description: Option<String>,
    pub alias: Option<String>,
    /// Always `None` for buyers.
    pub communications_pkey: Option<KeyRef>,
    pub transfer_pkey: Option<KeyRef>,
    pub prior_profile: Option<Box<Profile>>,
    message_count: usize,
}

impl Profile {
    fn empty(addr: &str, kind: ProfileKind) -> Self {
        Self {
            addr: addr.to_string(),
            kind,
            description: None,
            alias: None,
            communications_pkey: None,
            transfer_pkey: None,
            prior_profile: None,
            message_count: 0,
        }
    }

    pub fn accumulate<L: Ledger>(
        market: &Market<L>,
        addr: &str,
        kind: ProfileKind,
    ) -> Result<Self, MarketError> {
        Self::accumulate_from(market, addr, kind, &mut HashSet::new())
    }

    fn accumulate_from<L: Ledger>(
        market: &Market<L>,
        addr: &str,
        kind: ProfileKind,
        visited: &mut HashSet<String>,
    ) -> Result<Self, MarketError> {
        let mut profile = Self::empty(addr, kind);
        if !visited.insert(addr.to_string()) {
            debug!(%addr, "transfer chain revisits address");
            return Ok(profile);
        }

        let query = MessageQuery::new().of_type(kind.message_type());
        let messages = market.messages_by_addr(addr, &query)?;
        profile.message_count = messages.len();

        for (i, message) in messages.iter().rev().enumerate() {
            let Some(fields) = ProfileFields::of(message) else {
                continue;
            };

            if i == 0 && fields.transfer_pkey.is_some() {
                let Some(sender) = message.sender_addr.as_deref() else {
                    break;
                };
                let prior = Self::accumulate_from(market, sender, kind, visited)?;
                let usable = prior.is_valid()
                    && prior
                        .transfer_pkey
                        .as_ref()
                        .is_some_and(|target| target.is_address(addr));
                if usable {
                    profile.merge_profile(&prior);
                }
                profile.prior_profile = Some(Box::new(prior));
                if !usable {
                    break;
                }
            } else {
                // A second inbound transfer is ignored.
                if fields
                    .transfer_pkey
                    .is_some_and(|target| target.is_address(addr))
                {
                    continue;
                }
                profile.transfer_pkey = fields.transfer_pkey.cloned();
                profile.merge_fields(&fields);
            }

            if profile.transfer_pkey.is_some() {
                break;
            }
        }

        Ok(profile)
    }

    fn merge_fields(&mut self, fields: &ProfileFields<'_>) {
        if let Some(description) = fields.description {
            self.description = Some(description.to_string());
        }
        if let Some(alias) = fields.alias {
            self.alias = Some(alias.to_string());
        }
        if let Some(pkey) = fields.communications_pkey {
            self.communications_pkey = Some(pkey.clone());
        }
    }

    fn merge_profile(&mut self, prior: &Profile) {
        if prior.description.is_some() {
            self.description.clone_from(&prior.description);
        }
        if prior.alias.is_some() {
            self.alias.clone_from(&prior.alias);
        }
        if prior.communications_pkey.is_some() {
            self.communications_pkey.clone_from(&prior.communications_pkey);
        }
    }

    /// Closed by a transfer to the cleared key.
    pub fn is_closed(&self) -> bool {
        self.transfer_pkey.as_ref().is_some_and(KeyRef::is_cleared)
    }

    /// Neither transferred away nor closed.
    pub fn is_active(&self) -> bool {
        self.transfer_pkey.is_none()
    }

    pub fn is_found(&self) -> bool {
        self.message_count > 0
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if !self.is_found() {
            errors.add("addr", "profile not found");
        }
        if let Some(prior) = &self.prior_profile {
            if !prior.is_valid() {
                errors.add("prior_profile", "invalid");
            }
            let transferred_here = prior
                .transfer_pkey
                .as_ref()
                .is_some_and(|target| target.is_address(&self.addr));
            if !transferred_here {
                errors.add("prior_profile", "invalid transfer or closed");
            }
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolConfig;
    use crate::ledger::InMemoryLedger;
    use crate::message::{Buyer, Seller};

    const KEY_A: &str = "92UvdTpmxA6cvD6YeJZSiHW8ff8DsZXL2PHZu9Mg7JY3zbaETJw";
    const ADDR_A: &str = "mi37WkBomHJpUghCn7Vgh3ah33h6L9Nkqw";
    const KEY_B: &str = "92thgQGx77ihBaA56W7B1Qm8nhYHRERo1UqrgT2p6P6QTqkRhRB";
    const ADDR_B: &str = "mqVRfjepJTxxoDgDt892tCybhmjfKCFNyp";

    fn market() -> Market<InMemoryLedger> {
        Market::new(InMemoryLedger::new(1), ProtocolConfig::default())
    }

    #[test]
    fn test_missing_profile_is_invalid() {
        let profile = market().seller_profile(ADDR_A).unwrap();
        assert!(!profile.is_found());
        assert!(profile.is_active());
        assert_eq!(profile.validate().on("addr"), vec!["profile not found"]);
    }

    #[test]
    fn test_kinds_are_separate() {
        let market = market();
        let buyer = Message::new(Buyer::new().with_alias("Hal")).with_receiver(ADDR_A);
        market.save(&buyer, KEY_A).unwrap();

        assert!(market.buyer_profile(ADDR_A).unwrap().is_valid());
        assert!(!market.seller_profile(ADDR_A).unwrap().is_found());
    }

    #[test]
    fn test_transfer_cycle_terminates() {
        let market = market();
        // A transfers to B, then B transfers straight back to A.
        let to_b = Message::new(Seller::new().transfer_to(ADDR_B)).with_receiver(ADDR_B);
        market.save(&to_b, KEY_A).unwrap();
        market.ledger().increment_block_height().unwrap();
        let to_a = Message::new(Seller::new().transfer_to(ADDR_A)).with_receiver(ADDR_A);
        market.save(&to_a, KEY_B).unwrap();

        let a = market.seller_profile(ADDR_A).unwrap();
        assert!(!a.is_valid());
        let b = market.seller_profile(ADDR_B).unwrap();
        assert!(!b.is_valid());
    }
}
