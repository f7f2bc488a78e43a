//! Input validation tests

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::models::RequestedLine;
use shared::types::{DateRange, Pagination, MAX_PAGE_SIZE};
use shared::validation::*;
use uuid::Uuid;

mod unit_tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_account_fields() {
        assert!(validate_email("owner@shop.example").is_ok());
        assert!(validate_email("owner.shop.example").is_err());
        assert!(validate_password("short").is_err());
        assert!(validate_password("long-enough").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("store_admin-1").is_ok());
        assert!(validate_username("has space").is_err());
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency("usd").is_err());
        assert!(validate_currency("EURO").is_err());
    }

    #[test]
    fn test_prices() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(1999, 2)).is_ok());
        // trailing zeros do not count as precision
        assert!(validate_price(Decimal::new(12500, 3)).is_ok());
        assert!(validate_price(Decimal::new(1001, 3)).is_err());
        assert!(validate_price(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_names() {
        assert!(validate_name("Hardware").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_order_lines() {
        let id = Uuid::new_v4();
        assert!(validate_order_lines(&[]).is_err());
        assert!(validate_order_lines(&[RequestedLine { item_id: id, quantity: 0 }]).is_err());
        assert!(validate_order_lines(&[RequestedLine { item_id: id, quantity: 2 }]).is_ok());
    }

    #[test]
    fn test_date_range() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let range = DateRange {
            start: Some(start),
            end: Some(end),
        };

        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(end + chrono::Duration::seconds(1)));
        assert!(!range.is_inverted());
        assert!(DateRange {
            start: Some(end),
            end: Some(start)
        }
        .is_inverted());
        assert!(DateRange::default().contains(start));
    }
}

mod property_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_stock_quantity_sign(q in any::<i32>()) {
            prop_assert_eq!(validate_stock_quantity(q).is_ok(), q >= 0);
        }

        #[test]
        fn prop_cent_prices_accepted(cents in 0i64..100_000_000) {
            prop_assert!(validate_price(Decimal::new(cents, 2)).is_ok());
        }

        #[test]
        fn prop_pagination_is_clamped(page in any::<u32>(), limit in any::<u32>()) {
            let p = Pagination { page, limit }.normalized();
            prop_assert!(p.page >= 1);
            prop_assert!((1..=MAX_PAGE_SIZE).contains(&p.limit));
            prop_assert!(p.offset() >= 0);
        }
    }
}
