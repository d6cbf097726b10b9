//! Integration tests for invoices and the payments made against them.

use bazaar::{InMemoryLedger, Invoice, Market, Message, MessageType, Payment, ProtocolConfig};

const SELLER_KEY: &str = "92UvdTpmxA6cvD6YeJZSiHW8ff8DsZXL2PHZu9Mg7JY3zbaETJw";
const SELLER_ADDR: &str = "mi37WkBomHJpUghCn7Vgh3ah33h6L9Nkqw";
const BUYER_KEY: &str = "92thgQGx77ihBaA56W7B1Qm8nhYHRERo1UqrgT2p6P6QTqkRhRB";
const BUYER_ADDR: &str = "mqVRfjepJTxxoDgDt892tCybhmjfKCFNyp";
const STRANGER_KEY: &str = "92fRkALwcDiqz3WRJKYXUhAw4L1HCdbe1bPeCLbG3W7jjaw4h5j";

fn market() -> Market<InMemoryLedger> {
    Market::new(InMemoryLedger::new(300_000), ProtocolConfig::default())
}

fn invoice(market: &Market<InMemoryLedger>) -> String {
    let invoice = Invoice::new()
        .with_amount_due(100_000_000)
        .with_expiration_in(6);
    market
        .save(&Message::new(invoice).with_receiver(BUYER_ADDR), SELLER_KEY)
        .unwrap()
}

fn pay(market: &Market<InMemoryLedger>, invoice_txid: &str, description: &str, key: &str) {
    let payment = Payment::new(invoice_txid)
        .with_description(description)
        .with_ratings(8, 8, 8);
    market
        .save(&Message::new(payment).with_receiver(SELLER_ADDR), key)
        .unwrap();
}

#[test]
fn test_invoice_has_many_payments() {
    let market = market();
    let invoice_txid = invoice(&market);
    pay(&market, &invoice_txid, "abc", BUYER_KEY);
    market.ledger().increment_block_height().unwrap();
    pay(&market, &invoice_txid, "xyz", BUYER_KEY);

    let invoice = market.find_message(&invoice_txid).unwrap().unwrap();
    let payments = market.invoice_payments(&invoice).unwrap();
    let descriptions: Vec<_> = payments
        .iter()
        .filter_map(|payment| payment.as_payment()?.description.as_deref())
        .collect();
    assert_eq!(descriptions, vec!["xyz", "abc"]);
}

#[test]
fn test_payment_resolves_its_invoice() {
    let market = market();
    let invoice_txid = invoice(&market);
    pay(&market, &invoice_txid, "abc", BUYER_KEY);

    let payments = market
        .messages_by_addr(
            BUYER_ADDR,
            &bazaar::MessageQuery::new().of_type(MessageType::InvoicePaid),
        )
        .unwrap();
    assert_eq!(payments.len(), 1);

    let referenced = payments[0].as_payment().unwrap().invoice_txid.clone().unwrap();
    let invoice = market.find_message(&referenced).unwrap().unwrap();
    let body = invoice.as_invoice().unwrap();
    assert_eq!(body.amount_due, Some(100_000_000));
    assert_eq!(body.expiration_in, Some(6));
    assert_eq!(invoice.receiver_addr.as_deref(), Some(BUYER_ADDR));
}

#[test]
fn test_payment_to_someone_other_than_the_invoicer_is_invalid() {
    let market = market();
    let invoice_txid = invoice(&market);
    let payment = Message::new(Payment::new(&invoice_txid)).with_receiver(BUYER_ADDR);
    let txid = market.save(&payment, STRANGER_KEY).unwrap();

    let found = market.find_message(&txid).unwrap().unwrap();
    let errors = market.validate(&found);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.on("invoice_txid"), vec!["can't be found"]);

    let invoice = market.find_message(&invoice_txid).unwrap().unwrap();
    assert!(market.invoice_payments(&invoice).unwrap().is_empty());
}

#[test]
fn test_payment_for_missing_invoice_is_invalid() {
    let market = market();
    let payment = Message::new(Payment::new("ef".repeat(32))).with_receiver(SELLER_ADDR);
    let txid = market.save(&payment, BUYER_KEY).unwrap();

    let found = market.find_message(&txid).unwrap().unwrap();
    assert_eq!(market.validate(&found).on("invoice_txid"), vec!["can't be found"]);
}

#[test]
fn test_invoice_to_self_is_invalid() {
    let market = market();
    let invoice = Message::new(Invoice::new().with_amount_due(1)).with_receiver(SELLER_ADDR);
    let txid = market.save(&invoice, SELLER_KEY).unwrap();

    let found = market.find_message(&txid).unwrap().unwrap();
    let errors = market.validate(&found);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.on("receiver_addr"), vec!["matches sender_addr"]);
}
