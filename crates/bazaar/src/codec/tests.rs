use super::*;
use crate::network::{AddressError, Network};

const SCHEMA: &[FieldSpec] = &[
    FieldSpec::new(b'd', "description", FieldKind::Bytes),
    FieldSpec::new(b't', "create_txid", FieldKind::TxRef),
    FieldSpec::new(b'p', "price_in_units", FieldKind::Integer),
    FieldSpec::new(b'k', "transfer_pkey", FieldKind::KeyRef),
];

const TXID: &str = "e5a564d54ab9de50fc6eba4176991b7eb8f84bbeca3482ca032c12c1c0050ae3";

#[test]
fn test_varint_single_byte() {
    assert_eq!(encode_varint(0), vec![0x00]);
    assert_eq!(encode_varint(6), vec![0x06]);
    assert_eq!(encode_varint(0xfc), vec![0xfc]);
}

#[test]
fn test_varint_marker_widths() {
    assert_eq!(encode_varint(0xfd), vec![0xfd, 0xfd, 0x00]);
    assert_eq!(encode_varint(0xffff), vec![0xfd, 0xff, 0xff]);
    assert_eq!(encode_varint(100_000_000), vec![0xfe, 0x00, 0xe1, 0xf5, 0x05]);
    assert_eq!(
        encode_varint(0x1_0000_0000),
        vec![0xff, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
    );
}

#[test]
fn test_varint_decode_accepts_non_minimal() {
    assert_eq!(decode_varint(&[0xfd, 0x05, 0x00]).unwrap(), (5, 3));
    assert_eq!(decode_varint(&[0x07, 0xaa]).unwrap(), (7, 1));
}

#[test]
fn test_varint_decode_truncated() {
    assert_eq!(
        decode_varint(&[]),
        Err(CodecError::Truncated {
            needed: 1,
            available: 0
        })
    );
    assert_eq!(
        decode_varint(&[0xfe, 0x01]),
        Err(CodecError::Truncated {
            needed: 5,
            available: 2
        })
    );
}

#[test]
fn test_var_bytes_length_exceeds_payload() {
    assert!(matches!(
        decode_var_bytes(&[0x05, b'a', b'b']),
        Err(CodecError::Truncated { .. })
    ));
}

#[test]
fn test_encoding_version_cutover() {
    assert_eq!(EncodingVersion::for_block(None, 300_000), EncodingVersion::V1);
    assert_eq!(
        EncodingVersion::for_block(Some(299_999), 300_000),
        EncodingVersion::V0
    );
    assert_eq!(
        EncodingVersion::for_block(Some(300_000), 300_000),
        EncodingVersion::V1
    );
}

#[test]
fn test_encode_payload_skips_absent_fields() {
    let fields = FieldWriter::new()
        .text(b'd', Some("abc"))
        .tx_ref(b't', None)
        .integer(b'p', Some(6))
        .into_fields();
    let encoded = encode_payload("ITCRTE", &fields, EncodingVersion::V1).unwrap();
    assert_eq!(encoded, b"ITCRTE\x01d\x03abc\x01p\x06".to_vec());
}

#[test]
fn test_encode_payload_rejects_bad_tag() {
    assert!(matches!(
        encode_payload("SHORT", &[], EncodingVersion::V1),
        Err(CodecError::InvalidTag(_))
    ));
}

#[test]
fn test_tx_ref_versions() {
    let fields = FieldWriter::new().tx_ref(b't', Some(TXID)).into_fields();

    let v0 = encode_payload("ITUPDT", &fields, EncodingVersion::V0).unwrap();
    assert_eq!(v0[8], 64);
    assert_eq!(&v0[9..], TXID.as_bytes());

    let v1 = encode_payload("ITUPDT", &fields, EncodingVersion::V1).unwrap();
    assert_eq!(v1[8], 32);
    assert_eq!(v1[9..].to_vec(), hex::decode(TXID).unwrap());

    for (encoded, version) in [(v0, EncodingVersion::V0), (v1, EncodingVersion::V1)] {
        let mut decoded =
            decode_fields(&encoded[TAG_LEN..], SCHEMA, version, Network::Testnet).unwrap();
        assert_eq!(decoded.take_tx_ref(b't').as_deref(), Some(TXID));
    }
}

#[test]
fn test_tx_ref_requires_hex_in_v1() {
    let fields = FieldWriter::new().tx_ref(b't', Some("xyz")).into_fields();
    assert!(matches!(
        encode_payload("ITUPDT", &fields, EncodingVersion::V1),
        Err(CodecError::InvalidHex(_))
    ));
}

#[test]
fn test_key_ref_cleared_and_address() {
    let addr = "n3EMs5L3sHcZqRy35cmoPFgw5AzAtWSDUv";
    let fields = FieldWriter::new()
        .key_ref(b'k', Some(&KeyRef::Cleared))
        .into_fields();
    let cleared = encode_payload("SLUPDT", &fields, EncodingVersion::V1).unwrap();
    assert_eq!(cleared, b"SLUPDT\x01k\x01\x00".to_vec());

    let fields = FieldWriter::new()
        .key_ref(b'k', Some(&KeyRef::address(addr)))
        .into_fields();
    let encoded = encode_payload("SLUPDT", &fields, EncodingVersion::V1).unwrap();
    assert_eq!(encoded[8], 20);
    assert_eq!(
        hex::encode(&encoded[9..]),
        "ee2f5ede8128318f2d8c33535f95ebd0b133b046"
    );

    let mut decoded =
        decode_fields(&cleared[TAG_LEN..], SCHEMA, EncodingVersion::V1, Network::Testnet).unwrap();
    assert_eq!(decoded.take_key_ref(b'k'), Some(KeyRef::Cleared));

    let mut decoded =
        decode_fields(&encoded[TAG_LEN..], SCHEMA, EncodingVersion::V1, Network::Testnet).unwrap();
    assert_eq!(decoded.take_key_ref(b'k'), Some(KeyRef::address(addr)));
}

#[test]
fn test_short_address_key_fails_the_payload() {
    let data = b"\x01d\x03abc\x01k\x03xyz";
    assert!(matches!(
        decode_fields(data, SCHEMA, EncodingVersion::V1, Network::Testnet),
        Err(CodecError::Address(AddressError::InvalidHashLength(3)))
    ));
}

#[test]
fn test_decode_skips_unknown_keys() {
    let data = b"\x01z\x03foo\x01d\x03abc\x02xy\x01q";
    let mut decoded =
        decode_fields(data, SCHEMA, EncodingVersion::V1, Network::Testnet).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded.take_text(b'd').as_deref(), Some("abc"));
}

#[test]
fn test_decode_truncated_value_fails() {
    let data = b"\x01d\x09abc";
    assert!(decode_fields(data, SCHEMA, EncodingVersion::V1, Network::Testnet).is_err());
}

#[test]
fn test_read_tag() {
    assert_eq!(read_tag(b"INCRTE\x01p\x01").unwrap(), "INCRTE");
    assert!(read_tag(b"INC").is_err());
    assert!(matches!(
        read_tag(b"IN\x00RTE"),
        Err(CodecError::InvalidTag(_))
    ));
}

quickcheck::quickcheck! {
    fn prop_varint_roundtrip(value: u64) -> bool {
        let encoded = encode_varint(value);
        decode_varint(&encoded) == Ok((value, encoded.len()))
    }

    fn prop_payload_roundtrip(description: Vec<u8>, price: u64) -> bool {
        let fields = FieldWriter::new()
            .bytes(b'd', Some(&description))
            .integer(b'p', Some(price))
            .into_fields();
        let Ok(encoded) = encode_payload("ITCRTE", &fields, EncodingVersion::V1) else {
            return false;
        };
        let Ok(mut decoded) =
            decode_fields(&encoded[TAG_LEN..], SCHEMA, EncodingVersion::V1, Network::Testnet)
        else {
            return false;
        };
        decoded.take_bytes(b'd') == Some(description) && decoded.take_integer(b'p') == Some(price)
    }

    fn prop_decode_never_panics(data: Vec<u8>) -> bool {
        let _ = decode_fields(&data, SCHEMA, EncodingVersion::V0, Network::Mainnet);
        true
    }
}
