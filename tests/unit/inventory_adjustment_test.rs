// Adjustment ledger sign convention and balance arithmetic
//
// Every stock movement is a typed signed delta: additive types positive,
// deductive types negative, corrections either way. Applying a delta may
// never drive a balance negative; reversing a past entry applies the exact
// inverse delta.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use salebook::inventory::{AdjustmentType, InventoryAdjustment, InventoryLevel};

fn level(quantity: Decimal) -> InventoryLevel {
    InventoryLevel {
        id: "inv1".to_string(),
        product_id: "p1".to_string(),
        variant_id: None,
        warehouse_id: "w1".to_string(),
        batch: None,
        quantity,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn test_sign_convention_per_type() {
    let additive = [AdjustmentType::Addition, AdjustmentType::Initial];
    let deductive = [
        AdjustmentType::Subtraction,
        AdjustmentType::Transfer,
        AdjustmentType::Loss,
        AdjustmentType::Damaged,
        AdjustmentType::Expired,
    ];

    for t in additive {
        assert!(t.validate_quantity(dec!(5)).is_ok());
        assert!(t.validate_quantity(dec!(-5)).is_err());
    }
    for t in deductive {
        assert!(t.validate_quantity(dec!(-5)).is_ok());
        assert!(t.validate_quantity(dec!(5)).is_err());
    }
    // Corrections go either way but never zero
    assert!(AdjustmentType::Correction.validate_quantity(dec!(5)).is_ok());
    assert!(AdjustmentType::Correction.validate_quantity(dec!(-5)).is_ok());
}

#[test]
fn test_zero_quantity_always_rejected() {
    for t in [
        AdjustmentType::Addition,
        AdjustmentType::Subtraction,
        AdjustmentType::Correction,
        AdjustmentType::Transfer,
        AdjustmentType::Loss,
        AdjustmentType::Damaged,
        AdjustmentType::Expired,
        AdjustmentType::Initial,
    ] {
        assert!(t.validate_quantity(Decimal::ZERO).is_err());
    }
}

#[test]
fn test_entry_construction_enforces_sign() {
    assert!(InventoryAdjustment::new(
        "inv1".to_string(),
        dec!(-3),
        AdjustmentType::Loss,
        None,
        Some("broken in transit".to_string()),
        None,
    )
    .is_ok());

    assert!(InventoryAdjustment::new(
        "inv1".to_string(),
        dec!(3),
        AdjustmentType::Loss,
        None,
        None,
        None,
    )
    .is_err());
}

#[test]
fn test_balance_never_driven_negative() {
    let l = level(dec!(10));
    // Removing more than on hand is refused outright
    assert!(l.checked_apply(dec!(-15)).is_err());
    // Removing within the balance lands on the expected remainder
    assert_eq!(l.checked_apply(dec!(-7)).unwrap(), dec!(3));
    // Refusal does not mutate the level
    assert_eq!(l.quantity, dec!(10));
}

#[test]
fn test_reversal_is_the_exact_inverse() {
    let entry = InventoryAdjustment::new(
        "inv1".to_string(),
        dec!(-4),
        AdjustmentType::Subtraction,
        None,
        Some("sale SAL-202507-0001".to_string()),
        None,
    )
    .unwrap();

    let before = dec!(10);
    let after = level(before).checked_apply(entry.quantity).unwrap();
    // Reversal applies -quantity and restores the prior balance
    assert_eq!(after + (-entry.quantity), before);
}

#[test]
fn test_type_strings_round_trip() {
    for t in [
        AdjustmentType::Addition,
        AdjustmentType::Subtraction,
        AdjustmentType::Correction,
        AdjustmentType::Transfer,
        AdjustmentType::Loss,
        AdjustmentType::Damaged,
        AdjustmentType::Expired,
        AdjustmentType::Initial,
    ] {
        assert_eq!(AdjustmentType::try_from(t.as_str().to_string()).unwrap(), t);
    }
    assert!(AdjustmentType::try_from("restock".to_string()).is_err());
}

proptest! {
    /// checked_apply accepts a delta exactly when the result is >= 0
    #[test]
    fn test_checked_apply_boundary(
        balance in 0i64..=10_000,
        delta in -20_000i64..=20_000,
    ) {
        let l = level(Decimal::from(balance));
        let result = l.checked_apply(Decimal::from(delta));
        if balance + delta >= 0 {
            prop_assert_eq!(result.unwrap(), Decimal::from(balance + delta));
        } else {
            prop_assert!(result.is_err());
        }
    }

    /// Applying then reversing any accepted delta is the identity
    #[test]
    fn test_apply_reverse_identity(
        balance in 0i64..=10_000,
        delta in -10_000i64..=10_000,
    ) {
        let l = level(Decimal::from(balance));
        if let Ok(after) = l.checked_apply(Decimal::from(delta)) {
            prop_assert_eq!(after - Decimal::from(delta), Decimal::from(balance));
        }
    }
}
