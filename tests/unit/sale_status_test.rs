// Tests for the paid/partial/pending decision
//
// derive_status is the single source of truth: nothing paid is pending,
// paid-in-full (within a one-cent epsilon) is paid, anything in between
// is partial.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use salebook::sales::{derive_status, payment_epsilon, SaleStatus};

#[test]
fn test_nothing_paid_is_pending() {
    assert_eq!(derive_status(dec!(1000), Decimal::ZERO), SaleStatus::Pending);
    assert_eq!(derive_status(dec!(1000), dec!(-5)), SaleStatus::Pending);
}

#[test]
fn test_partial_payment() {
    assert_eq!(derive_status(dec!(1000), dec!(400)), SaleStatus::Partial);
    assert_eq!(derive_status(dec!(1000), dec!(998.98)), SaleStatus::Partial);
}

#[test]
fn test_paid_in_full() {
    assert_eq!(derive_status(dec!(1000), dec!(1000)), SaleStatus::Paid);
    assert_eq!(derive_status(dec!(1000), dec!(1200)), SaleStatus::Paid);
}

#[test]
fn test_epsilon_tolerance_at_boundary() {
    // One cent short still counts as paid; two cents short does not
    assert_eq!(derive_status(dec!(1000), dec!(999.99)), SaleStatus::Paid);
    assert_eq!(derive_status(dec!(1000), dec!(999.98)), SaleStatus::Partial);
}

#[test]
fn test_zero_total_with_any_payment_is_paid() {
    assert_eq!(derive_status(Decimal::ZERO, dec!(0.01)), SaleStatus::Paid);
    assert_eq!(derive_status(Decimal::ZERO, Decimal::ZERO), SaleStatus::Pending);
}

#[test]
fn test_status_round_trips_through_strings() {
    for status in [
        SaleStatus::Draft,
        SaleStatus::Pending,
        SaleStatus::Partial,
        SaleStatus::Paid,
        SaleStatus::Cancelled,
    ] {
        let parsed = SaleStatus::try_from(status.as_str().to_string()).unwrap();
        assert_eq!(parsed, status);
    }
    assert!(SaleStatus::try_from("refunded".to_string()).is_err());
}

proptest! {
    /// The decision partitions every (total, paid) pair into exactly one
    /// of the three derived states
    #[test]
    fn test_decision_partition(
        total_cents in 1u64..=100_000_000,
        paid_cents in 0u64..=100_000_000,
    ) {
        let total = Decimal::new(total_cents as i64, 2);
        let paid = Decimal::new(paid_cents as i64, 2);
        let status = derive_status(total, paid);

        if paid <= Decimal::ZERO {
            prop_assert_eq!(status, SaleStatus::Pending);
        } else if paid >= total || (total - paid).abs() <= payment_epsilon() {
            prop_assert_eq!(status, SaleStatus::Paid);
        } else {
            prop_assert_eq!(status, SaleStatus::Partial);
        }
    }

    /// Paying more never moves the status away from paid
    #[test]
    fn test_status_monotonic_in_payment(
        total_cents in 1u64..=1_000_000,
        paid_cents in 1u64..=1_000_000,
        extra_cents in 0u64..=1_000_000,
    ) {
        let total = Decimal::new(total_cents as i64, 2);
        let paid = Decimal::new(paid_cents as i64, 2);
        let more = paid + Decimal::new(extra_cents as i64, 2);

        if derive_status(total, paid) == SaleStatus::Paid {
            prop_assert_eq!(derive_status(total, more), SaleStatus::Paid);
        }
    }
}
