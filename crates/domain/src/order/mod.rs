//! Order placement and the order status lifecycle.

mod service;

pub use service::{OrderService, OrderSettings, PlacedOrder};

use chrono::{DateTime, Utc};
use common::Address;
use rand::Rng;

use crate::error::OrderError;

/// Name recorded for lines whose product was deleted before checkout.
pub const DELETED_PRODUCT_NAME: &str = "Deleted product";

/// Image recorded for lines whose product has no image or was deleted.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/80";

/// Builds a human-readable order number: `ORD-<unix millis>-<4 digits>`.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("ORD-{}-{suffix:04}", now.timestamp_millis())
}

/// Checks required address fields and fills in the default province.
pub fn normalize_address(
    mut address: Address,
    default_province: &str,
) -> Result<Address, OrderError> {
    let required = [
        ("fullName", &address.full_name),
        ("mobile", &address.mobile),
        ("city", &address.city),
        ("address", &address.address),
        ("postalCode", &address.postal_code),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(OrderError::Validation(format!(
            "missing shipping address fields: {}",
            missing.join(", ")
        )));
    }

    if address.province.trim().is_empty() {
        address.province = default_province.to_string();
    }
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            full_name: "Sara".to_string(),
            mobile: "09120000000".to_string(),
            province: String::new(),
            city: "Tehran".to_string(),
            address: "Street 1".to_string(),
            postal_code: "1234567890".to_string(),
        }
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number(Utc::now());
        let parts: Vec<_> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 4);
    }

    #[test]
    fn test_empty_province_gets_default() {
        let normalized = normalize_address(address(), "Tehran").unwrap();
        assert_eq!(normalized.province, "Tehran");

        let mut with_province = address();
        with_province.province = "Isfahan".to_string();
        let normalized = normalize_address(with_province, "Tehran").unwrap();
        assert_eq!(normalized.province, "Isfahan");
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let mut bad = address();
        bad.city = " ".to_string();
        bad.postal_code = String::new();
        match normalize_address(bad, "Tehran") {
            Err(OrderError::Validation(msg)) => {
                assert!(msg.contains("city"));
                assert!(msg.contains("postalCode"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
