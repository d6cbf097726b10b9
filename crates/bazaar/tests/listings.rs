//! Integration tests for listing accumulation.

use bazaar::{InMemoryLedger, Item, KeyRef, Market, Message, ProtocolConfig, Seller};

const SELLER_KEY: &str = "92UvdTpmxA6cvD6YeJZSiHW8ff8DsZXL2PHZu9Mg7JY3zbaETJw";
const SELLER_ADDR: &str = "mi37WkBomHJpUghCn7Vgh3ah33h6L9Nkqw";
const OTHER_KEY: &str = "92thgQGx77ihBaA56W7B1Qm8nhYHRERo1UqrgT2p6P6QTqkRhRB";

fn market() -> Market<InMemoryLedger> {
    Market::new(InMemoryLedger::new(300_000), ProtocolConfig::default())
}

fn declare_seller(market: &Market<InMemoryLedger>) {
    let seller = Seller::new()
        .with_description("abc")
        .with_alias("Satoshi")
        .with_communications_pkey(KeyRef::address(SELLER_ADDR));
    market
        .save(&Message::new(seller).with_receiver(SELLER_ADDR), SELLER_KEY)
        .unwrap();
}

fn create_item(market: &Market<InMemoryLedger>) -> String {
    let item = Item::new()
        .with_description("Item Description")
        .with_price("BTC", 100_000_000)
        .with_expiration_in(6)
        .with_location(51.500_782, -0.124_669, 1000);
    market.save(&Message::new(item), SELLER_KEY).unwrap()
}

fn update_item(market: &Market<InMemoryLedger>, update: Item, key: &str) -> String {
    market
        .save(&Message::new(update).with_receiver(SELLER_ADDR), key)
        .unwrap()
}

#[test]
fn test_simple_listing() {
    let market = market();
    declare_seller(&market);
    market.ledger().increment_block_height().unwrap();
    let txid = create_item(&market);
    market.ledger().increment_block_height().unwrap();

    let listing = market.listing(&txid).unwrap();
    assert!(listing.is_valid());
    assert!(listing.is_found());
    assert_eq!(listing.description.as_deref(), Some("Item Description"));
    assert_eq!(listing.price_currency.as_deref(), Some("BTC"));
    assert_eq!(listing.price_in_units, Some(100_000_000));
    assert_eq!(listing.expiration_in, Some(6));
    assert_eq!(listing.expiration_at(), Some(300_007));
    assert_eq!(listing.latitude(), Some(51.500_782));
    assert_eq!(listing.longitude(), Some(-0.124_669));
    assert_eq!(listing.radius(), Some(1000));
    assert_eq!(listing.addr(), Some(SELLER_ADDR));
}

#[test]
fn test_updates_are_combined() {
    let market = market();
    declare_seller(&market);
    market.ledger().increment_block_height().unwrap();
    let txid = create_item(&market);
    market.ledger().increment_block_height().unwrap();
    update_item(
        &market,
        Item::update(&txid)
            .with_description("xyz")
            .with_price_in_units(99_999_999)
            .with_expiration_in(12),
        SELLER_KEY,
    );

    let listing = market.listing(&txid).unwrap();
    assert!(listing.is_valid());
    assert_eq!(listing.description.as_deref(), Some("xyz"));
    assert_eq!(listing.price_currency.as_deref(), Some("BTC"));
    assert_eq!(listing.price_in_units, Some(99_999_999));
    assert_eq!(listing.expiration_in, Some(12));
    assert_eq!(listing.expiration_at(), Some(300_013));
    assert_eq!(listing.latitude(), Some(51.500_782));
    assert_eq!(listing.radius(), Some(1000));
    assert_eq!(listing.addr(), Some(SELLER_ADDR));
}

#[test]
fn test_updates_for_other_listings_are_ignored() {
    let market = market();
    declare_seller(&market);
    let txid = create_item(&market);
    update_item(&market, Item::update(&txid).with_description("xyz"), SELLER_KEY);
    update_item(
        &market,
        Item::update("ab".repeat(32)).with_description("123"),
        SELLER_KEY,
    );

    let listing = market.listing(&txid).unwrap();
    assert!(listing.is_valid());
    assert_eq!(listing.description.as_deref(), Some("xyz"));
}

#[test]
fn test_updates_from_other_senders_are_ignored() {
    let market = market();
    declare_seller(&market);
    let txid = create_item(&market);
    update_item(&market, Item::update(&txid).with_description("xyz"), OTHER_KEY);

    let listing = market.listing(&txid).unwrap();
    assert!(listing.is_valid());
    assert_eq!(listing.description.as_deref(), Some("Item Description"));
}

#[test]
fn test_unknown_txid_is_invalid() {
    let market = market();
    let listing = market.listing(&"cd".repeat(32)).unwrap();

    assert!(!listing.is_valid());
    assert!(!listing.is_found());
    let errors = listing.validate();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.on("create_item"), vec!["invalid or missing"]);
    assert_eq!(errors.on("seller_profile"), vec!["invalid or missing"]);
}

#[test]
fn test_update_is_not_a_listing() {
    let market = market();
    declare_seller(&market);
    let txid = update_item(
        &market,
        Item::update("ab".repeat(32)).with_description("123"),
        SELLER_KEY,
    );

    let listing = market.listing(&txid).unwrap();
    let errors = listing.validate();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.on("create_item"), vec!["invalid or missing"]);
    assert_eq!(errors.on("seller_profile"), vec!["invalid or missing"]);
}

#[test]
fn test_listing_requires_seller_declaration() {
    let market = market();
    let txid = create_item(&market);

    let listing = market.listing(&txid).unwrap();
    let errors = listing.validate();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.on("seller_profile"), vec!["invalid or missing"]);
}

#[test]
fn test_listing_requires_active_seller() {
    let market = market();
    declare_seller(&market);
    let txid = create_item(&market);
    market
        .save(
            &Message::new(Seller::new().close()).with_receiver(SELLER_ADDR),
            SELLER_KEY,
        )
        .unwrap();

    let listing = market.listing(&txid).unwrap();
    assert!(listing.is_found());
    let errors = listing.validate();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.on("seller_profile"), vec!["invalid or missing"]);
}
