// Partial payment flow against a sale
//
// Covers the full ledger walk: pending -> partial -> paid, rejection of
// overpayments and payments on cancelled or settled sales, and the
// invariant amount_due = total - amount_paid after every step.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use salebook::sales::{Payment, Sale, SaleStatus};

fn sale(total: Decimal) -> Sale {
    Sale {
        id: Some("s1".to_string()),
        code: Some("SAL-202507-0001".to_string()),
        customer_id: None,
        issue_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        currency_code: "USD".to_string(),
        exchange_rate: Decimal::ONE,
        include_tax: true,
        shipping_amount: Decimal::ZERO,
        subtotal: total,
        discount_amount: Decimal::ZERO,
        tax_amount: Decimal::ZERO,
        total,
        amount_paid: Decimal::ZERO,
        amount_due: total,
        status: SaleStatus::Pending,
        notes: None,
        created_by: None,
        created_at: None,
        updated_at: None,
        deleted_at: None,
        line_items: vec![],
    }
}

#[test]
fn test_partial_then_settling_payment() {
    let mut s = sale(dec!(1000));

    s.apply_payment(dec!(400)).unwrap();
    assert_eq!(s.status, SaleStatus::Partial);
    assert_eq!(s.amount_paid, dec!(400));
    assert_eq!(s.amount_due, dec!(600));

    s.apply_payment(dec!(600)).unwrap();
    assert_eq!(s.status, SaleStatus::Paid);
    assert_eq!(s.amount_due, Decimal::ZERO);

    // Nothing left due, further payments are rejected
    assert!(s.apply_payment(dec!(0.01)).is_err());
}

#[test]
fn test_overpayment_rejected() {
    let mut s = sale(dec!(1000));
    s.apply_payment(dec!(400)).unwrap();
    assert!(s.apply_payment(dec!(600.01)).is_err());
    // State unchanged after the rejection
    assert_eq!(s.amount_paid, dec!(400));
    assert_eq!(s.status, SaleStatus::Partial);
}

#[test]
fn test_non_positive_amounts_rejected() {
    let mut s = sale(dec!(100));
    assert!(s.apply_payment(Decimal::ZERO).is_err());
    assert!(s.apply_payment(dec!(-10)).is_err());
    assert_eq!(s.status, SaleStatus::Pending);
}

#[test]
fn test_cancelled_sale_refuses_payments() {
    let mut s = sale(dec!(100));
    s.cancel().unwrap();
    assert!(s.apply_payment(dec!(50)).is_err());
    // Cancelled is terminal
    assert!(s.cancel().is_err());
    assert!(s.override_status(SaleStatus::Pending).is_err());
}

#[test]
fn test_epsilon_settles_residual_cent() {
    let mut s = sale(dec!(100));
    s.apply_payment(dec!(99.99)).unwrap();
    // Within one cent of the total counts as settled
    assert_eq!(s.status, SaleStatus::Paid);
}

#[test]
fn test_payment_entity_validation() {
    assert!(Payment::new(
        "s1".to_string(),
        dec!(50),
        "cash".to_string(),
        NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
        None,
    )
    .is_ok());
    assert!(Payment::new(
        "s1".to_string(),
        Decimal::ZERO,
        "cash".to_string(),
        NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
        None,
    )
    .is_err());
    assert!(Payment::new(
        "s1".to_string(),
        dec!(50),
        "  ".to_string(),
        NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
        None,
    )
    .is_err());
}

proptest! {
    /// amount_due always equals total - amount_paid after any sequence of
    /// accepted payments
    #[test]
    fn test_due_invariant_over_payment_sequences(
        total_cents in 100u64..=1_000_000,
        payments in prop::collection::vec(1u64..=500_000, 1..=10),
    ) {
        let total = Decimal::new(total_cents as i64, 2);
        let mut s = sale(total);

        for cents in payments {
            let amount = Decimal::new(cents as i64, 2);
            let _ = s.apply_payment(amount);
            prop_assert_eq!(s.amount_due, s.total - s.amount_paid);
            prop_assert!(s.amount_paid <= s.total);
        }
    }
}
