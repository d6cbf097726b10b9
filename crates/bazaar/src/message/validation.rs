use std::fmt;

use serde::Serialize;

use crate::codec::KeyRef;
use crate::network::{Network, is_valid_address};

use super::billing::{MAX_RATING, Payment};
use super::communication::Communication;
use super::item::Item;
use super::{Message, MessageBody};

const LATITUDE_LIMIT: f64 = 90.0;
const LONGITUDE_LIMIT: f64 = 180.0;
const RADIUS_LIMIT: u64 = 1_000_000;

/// Rule violations collected as `(field, message)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<(String, String)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push((field.to_string(), message.into()));
    }

    /// Messages recorded against `field`, in the order they were added.
    pub fn on(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|(name, _)| name == field)
            .map(|(_, message)| message.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (field.as_str(), message.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .iter()
            .map(|(field, message)| format!("{field} {message}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Hex text of even length, as binary references must be.
pub fn is_transaction_id(value: &str) -> bool {
    !value.is_empty() && value.len() % 2 == 0 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Run the rule set of the message's type.
///
/// `lookup` resolves transaction ids; payments use it to find their invoice.
pub fn validate(
    message: &Message,
    network: Network,
    lookup: &dyn Fn(&str) -> Option<Message>,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let receiver = message.receiver(network);
    let sender = message.sender_addr.as_deref();

    match &message.body {
        MessageBody::Item(item) => {
            require_receiver(&mut errors, receiver.as_deref());
            validate_item(&mut errors, item, sender, receiver.as_deref());
        }
        MessageBody::Seller(seller) => {
            require_receiver(&mut errors, receiver.as_deref());
            validate_profile(
                &mut errors,
                sender,
                receiver.as_deref(),
                seller.transfer_pkey.as_ref(),
            );
            check_pkey(&mut errors, "communications_pkey", seller.communications_pkey.as_ref());
            check_pkey(&mut errors, "transfer_pkey", seller.transfer_pkey.as_ref());
        }
        MessageBody::Buyer(buyer) => {
            require_receiver(&mut errors, receiver.as_deref());
            validate_profile(
                &mut errors,
                sender,
                receiver.as_deref(),
                buyer.transfer_pkey.as_ref(),
            );
            check_pkey(&mut errors, "transfer_pkey", buyer.transfer_pkey.as_ref());
        }
        MessageBody::Invoice(_) => {
            require_receiver(&mut errors, receiver.as_deref());
            validate_billing(&mut errors, sender, receiver.as_deref());
        }
        MessageBody::Payment(payment) => {
            require_receiver(&mut errors, receiver.as_deref());
            validate_billing(&mut errors, sender, receiver.as_deref());
            validate_payment(&mut errors, payment, receiver.as_deref(), network, lookup);
        }
        MessageBody::Communication(communication) => {
            validate_communication(&mut errors, communication);
        }
    }

    errors
}

fn require_receiver(errors: &mut ValidationErrors, receiver: Option<&str>) {
    if receiver.is_none() {
        errors.add("receiver_addr", "is not present");
    }
}

fn validate_profile(
    errors: &mut ValidationErrors,
    sender: Option<&str>,
    receiver: Option<&str>,
    transfer_pkey: Option<&KeyRef>,
) {
    // Declarations and edits are self-addressed; transfers go to the new owner.
    if sender.is_some() && transfer_pkey.is_none() && receiver != sender {
        errors.add("receiver_addr", "does not match sender_addr");
    }

    if let Some(KeyRef::Address(target)) = transfer_pkey {
        if receiver != Some(target.as_str()) {
            errors.add("transfer_pkey", "does not match receiver_addr");
        }
    }
}

fn check_pkey(errors: &mut ValidationErrors, field: &str, pkey: Option<&KeyRef>) {
    if let Some(KeyRef::Address(addr)) = pkey {
        if !is_valid_address(addr) {
            errors.add(field, "is not a public key");
        }
    }
}

fn validate_billing(errors: &mut ValidationErrors, sender: Option<&str>, receiver: Option<&str>) {
    if sender.is_some() && receiver == sender {
        errors.add("receiver_addr", "matches sender_addr");
    }
}

fn validate_item(
    errors: &mut ValidationErrors,
    item: &Item,
    sender: Option<&str>,
    receiver: Option<&str>,
) {
    if let Some(txid) = &item.create_txid {
        if sender.is_some() && receiver != sender {
            errors.add("receiver_addr", "does not match sender_addr");
        }
        if !is_transaction_id(txid) {
            errors.add("create_txid", "is not a transaction id");
        }
        return;
    }

    check_degrees(errors, "latitude", item.latitude, LATITUDE_LIMIT);
    check_degrees(errors, "longitude", item.longitude, LONGITUDE_LIMIT);

    match item.radius {
        None => errors.add("radius", "is not a number"),
        Some(radius) if radius >= RADIUS_LIMIT => {
            errors.add("radius", format!("must be less than {RADIUS_LIMIT}"));
        }
        Some(_) => {}
    }

    if item.price_in_units.is_some() && item.price_currency.is_none() {
        errors.add("price_currency", "is required if price is specified");
    }
}

fn check_degrees(errors: &mut ValidationErrors, field: &str, value: Option<f64>, limit: f64) {
    match value {
        Some(value) if value.is_finite() => {
            if value < -limit {
                errors.add(field, format!("must be greater than or equal to -{limit}"));
            }
            if value > limit {
                errors.add(field, format!("must be less than or equal to {limit}"));
            }
        }
        _ => errors.add(field, "is not a number"),
    }
}

fn validate_payment(
    errors: &mut ValidationErrors,
    payment: &Payment,
    receiver: Option<&str>,
    network: Network,
    lookup: &dyn Fn(&str) -> Option<Message>,
) {
    for (field, rating) in [
        ("delivery_quality", payment.delivery_quality),
        ("product_quality", payment.product_quality),
        ("communications_quality", payment.communications_quality),
    ] {
        if rating.is_some_and(|rating| rating > MAX_RATING) {
            errors.add(field, format!("is not in set: 0..{MAX_RATING}"));
        }
    }

    let found = payment
        .invoice_txid
        .as_deref()
        .filter(|txid| is_transaction_id(txid))
        .and_then(lookup)
        .is_some_and(|invoice| {
            matches!(invoice.body, MessageBody::Invoice(_))
                && invoice.sender_addr.as_deref() == receiver
                && validate(&invoice, network, lookup).is_empty()
        });
    if !found {
        errors.add("invoice_txid", "can't be found");
    }
}

fn validate_communication(errors: &mut ValidationErrors, communication: &Communication) {
    if communication.der.is_some() && communication.session_pkey.is_none() {
        errors.add("session_pkey", "is not present");
    }
    if communication.contents.is_some() && communication.iv.is_none() {
        errors.add("iv", "is not present");
    }
    if communication.session_pkey.is_none() && communication.contents.is_none() {
        errors.add("contents", "is not present");
    }
}
