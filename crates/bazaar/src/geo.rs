//! Geospatial receiver addresses.
//!
//! An item listing is sent to a synthetic, checksummed address whose base58
//! text spells out the listing's coordinates:
//!
//! ```text
//! mfZ 141500782 179875331 001000 <checksum>
//!     lat + 90  lon + 180 radius
//! ```
//!
//! Digits are stored in micro-degrees and every `0` is written as `X` so the
//! string survives base58 decoding.

use std::sync::LazyLock;

use bitcoin::base58;
use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::network::Network;

pub const EARTH_RADIUS_IN_METERS: f64 = 6_371_000.0;

const MICRO_DEGREES: f64 = 1_000_000.0;
const LATITUDE_OFFSET: i64 = 90;
const LONGITUDE_OFFSET: i64 = 180;
const CHECKSUM_PADDING: &str = "XXXXXXX";
const PAYLOAD_LEN: usize = 21;

static ADDRESS_PARTS: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\A(?:mfZ|1DZ)([1-9X]{9})([1-9X]{9})([1-9X]{6}).+"));

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("coordinate is not a finite number: {0}")]
    NotFinite(f64),

    #[error("address cannot carry coordinates: {0}")]
    Unencodable(String),

    #[error("not a geospatial address: {0}")]
    NotGeoAddress(String),

    #[error("address pattern failed to compile: {0}")]
    Pattern(String),
}

/// A decoded listing location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: u64,
}

/// Encode a location into a checksummed receiver address.
///
/// Range checks belong to message validation; out of range values still
/// produce an address, though one that may not decode back.
pub fn encode_address(
    latitude: f64,
    longitude: f64,
    radius: u64,
    network: Network,
) -> Result<String, GeoError> {
    let digits = format!(
        "{:09}{:09}{:06}",
        to_micro_degrees(latitude, LATITUDE_OFFSET)?,
        to_micro_degrees(longitude, LONGITUDE_OFFSET)?,
        radius
    )
    .replace('0', "X");
    let base = format!("{}{}{}", network.geo_prefix(), digits, CHECKSUM_PADDING);

    let decoded = base58::decode(&base).map_err(|err| GeoError::Unencodable(err.to_string()))?;
    let payload = decoded
        .get(..PAYLOAD_LEN)
        .ok_or_else(|| GeoError::Unencodable(base.clone()))?;

    let checksum = Sha256::digest(Sha256::digest(payload));
    let mut out = payload.to_vec();
    out.extend_from_slice(&checksum[..4]);

    Ok(base58::encode(&out))
}

/// Recover the location spelled out by a receiver address.
pub fn decode_address(address: &str) -> Result<Location, GeoError> {
    let pattern = ADDRESS_PARTS
        .as_ref()
        .map_err(|err| GeoError::Pattern(err.to_string()))?;
    let captures = pattern
        .captures(address)
        .ok_or_else(|| GeoError::NotGeoAddress(address.to_string()))?;

    let part = |index: usize| -> Result<i64, GeoError> {
        captures
            .get(index)
            .map(|m| m.as_str().replace('X', "0"))
            .and_then(|digits| digits.parse::<i64>().ok())
            .ok_or_else(|| GeoError::NotGeoAddress(address.to_string()))
    };

    Ok(Location {
        latitude: from_micro_degrees(part(1)?, LATITUDE_OFFSET),
        longitude: from_micro_degrees(part(2)?, LONGITUDE_OFFSET),
        radius: part(3)?.unsigned_abs(),
    })
}

/// True when the address has the shape of a geospatial receiver.
pub fn is_geo_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

/// Haversine distance in meters.
pub fn distance_between(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + lat1.to_radians().cos()
            * lat2.to_radians().cos()
            * (delta_lambda / 2.0).sin()
            * (delta_lambda / 2.0).sin();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_IN_METERS * c
}

fn to_micro_degrees(value: f64, offset: i64) -> Result<u64, GeoError> {
    if !value.is_finite() {
        return Err(GeoError::NotFinite(value));
    }
    let scaled = ((value + offset as f64) * MICRO_DEGREES).floor();
    Ok(scaled.abs() as u64)
}

/// Exact decimal conversion: the integer micro-degree count is rendered as a
/// decimal string and parsed, so `141500782` becomes exactly `51.500782`.
fn from_micro_degrees(raw: i64, offset: i64) -> f64 {
    let micro = raw - offset * 1_000_000;
    let sign = if micro < 0 { "-" } else { "" };
    let magnitude = micro.unsigned_abs();
    format!("{sign}{}.{:06}", magnitude / 1_000_000, magnitude % 1_000_000)
        .parse()
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_london() {
        let addr = encode_address(51.500782, -0.124669, 1000, Network::Testnet).unwrap();
        assert_eq!(addr, "mfZ1415XX782179875331XX1XXXXXgtzWu");
        assert_eq!(addr.len(), 34);
    }

    #[test]
    fn test_encode_mainnet_prefix() {
        let addr = encode_address(51.500782, -0.124669, 1000, Network::Mainnet).unwrap();
        assert_eq!(addr, "1DZ1415XX782179875331XX1XXXXUkBJQd");
    }

    #[test]
    fn test_encoded_address_is_valid_base58check() {
        let addr = encode_address(35.688533, 139.471436, 20_000, Network::Testnet).unwrap();
        assert_eq!(addr, "mfZ125688533319471436X2XXXXXRvQB8n");
        assert!(crate::network::is_valid_address(&addr));
    }

    #[test]
    fn test_decode_london() {
        let location = decode_address("mfZ1415XX782179875331XX1XXXXXgtzWu").unwrap();
        assert_eq!(location.latitude, 51.500782);
        assert_eq!(location.longitude, -0.124669);
        assert_eq!(location.radius, 1000);
    }

    #[test]
    fn test_decode_rejects_plain_addresses() {
        assert!(decode_address("mi37WkBomHJpUghCn7Vgh3ah33h6L9Nkqw").is_err());
        assert!(!is_geo_address("n3EMs5L3sHcZqRy35cmoPFgw5AzAtWSDUv"));
    }

    #[test]
    fn test_six_digit_radii_and_extremes() {
        for lat in [90.0, 0.0, -90.0, 51.500782, -51.500782] {
            for lon in [180.0, 0.0, -180.0, -0.124669, 0.124669] {
                for radius in [9, 8, 5, 2, 0, 101, 11010, 999_999, 100_000] {
                    let addr = encode_address(lat, lon, radius, Network::Testnet).unwrap();
                    let digits = addr[3..27].replace('X', "0");
                    assert_eq!(
                        digits[..9].parse::<u64>().unwrap(),
                        ((lat + 90.0) * 1_000_000.0).floor() as u64
                    );
                    assert_eq!(
                        digits[9..18].parse::<u64>().unwrap(),
                        ((lon + 180.0) * 1_000_000.0).floor() as u64
                    );
                    assert_eq!(digits[18..].parse::<u64>().unwrap(), radius);
                }
            }
        }
    }

    #[test]
    fn test_encode_rejects_non_finite() {
        assert!(matches!(
            encode_address(f64::NAN, 0.0, 1, Network::Testnet),
            Err(GeoError::NotFinite(_))
        ));
        assert!(encode_address(0.0, f64::INFINITY, 1, Network::Testnet).is_err());
    }

    #[test]
    fn test_distance_between() {
        let nyc_to_london = distance_between(40.712784, -74.005941, 51.507351, -0.127758);
        let texas = distance_between(31.428663, -99.096680, 36.279707, -102.568359);
        let hong_kong = distance_between(22.396428, 114.109497, 22.408489, 113.906937);

        assert_eq!(nyc_to_london.round(), 5_570_224.0);
        assert_eq!(texas.round(), 627_363.0);
        assert_eq!(hong_kong.round(), 20_867.0);
    }

    quickcheck::quickcheck! {
        fn prop_location_roundtrip(lat_micro: u32, lon_micro: u32, radius: u32) -> bool {
            let lat_micro = i64::from(lat_micro % 180_000_001) - 90_000_000;
            let lon_micro = i64::from(lon_micro % 360_000_001) - 180_000_000;
            let radius = u64::from(radius % 1_000_000);
            let latitude = lat_micro as f64 / 1_000_000.0;
            let longitude = lon_micro as f64 / 1_000_000.0;

            let Ok(addr) = encode_address(latitude, longitude, radius, Network::Testnet) else {
                return false;
            };
            match decode_address(&addr) {
                Ok(location) => {
                    (location.latitude - latitude).abs() <= 1.5e-6
                        && (location.longitude - longitude).abs() <= 1.5e-6
                        && location.radius == radius
                }
                Err(_) => false,
            }
        }
    }
}
