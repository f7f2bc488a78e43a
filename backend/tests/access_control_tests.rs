//! Role and capability tests
//!
//! Admins hold every capability; managers work with the catalog and orders
//! but cannot delete records, read reports, list organizations or manage
//! users.

use proptest::prelude::*;
use shared::models::{Capability, OrderStatus, PaymentStatus, Role};

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Admin), Just(Role::Manager)]
}

fn capability_strategy() -> impl Strategy<Value = Capability> {
    prop::sample::select(Capability::ALL.to_vec())
}

mod unit_tests {
    use super::*;

    #[test]
    fn test_admin_holds_every_capability() {
        for capability in Capability::ALL {
            assert!(Role::Admin.can(capability), "{}", capability.as_str());
        }
    }

    #[test]
    fn test_manager_is_restricted() {
        for capability in Capability::ALL {
            assert!(!Role::Manager.can(capability), "{}", capability.as_str());
        }
    }

    #[test]
    fn test_new_accounts_default_to_admin() {
        assert_eq!(Role::default(), Role::Admin);
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_value(Role::Manager).unwrap(), "manager");
        assert_eq!(
            serde_json::from_str::<Role>("\"admin\"").unwrap(),
            Role::Admin
        );
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(OrderStatus::from_str("canceled"), Some(OrderStatus::Cancelled));
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"canceled\"").unwrap(),
            OrderStatus::Cancelled
        );
        assert_eq!(
            serde_json::to_value(OrderStatus::Cancelled).unwrap(),
            "cancelled"
        );
        assert_eq!(PaymentStatus::from_str("refunded"), None);
    }
}

mod property_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_role_round_trips_through_text(role in role_strategy()) {
            prop_assert_eq!(Role::from_str(role.as_str()), Some(role));
            prop_assert_eq!(role.to_string(), role.as_str());
        }

        /// Only admins pass a capability gate
        #[test]
        fn prop_capability_gate(role in role_strategy(), capability in capability_strategy()) {
            prop_assert_eq!(role.can(capability), role == Role::Admin);
        }
    }
}
