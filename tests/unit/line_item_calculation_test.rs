// Property-based tests for line item money figures
//
// Properties tested:
// 1. subtotal = quantity * unit_price
// 2. discount_amount = subtotal * discount% / 100
// 3. tax applies to the discounted base, not the raw subtotal
// 4. total = subtotal - discount_amount + tax_amount
// 5. invalid inputs are rejected before any figure is derived

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use salebook::pricing::{LineItem, LineItemInput, TotalsCalculator};

#[test]
fn test_discount_then_tax_ordering() {
    // 3 x 100 with 10% discount and 16% tax: tax base is 270, not 300
    let figures = TotalsCalculator::compute_line_item(
        dec!(3),
        dec!(100),
        dec!(10),
        dec!(16),
    )
    .unwrap();

    assert_eq!(figures.subtotal, dec!(300));
    assert_eq!(figures.discount_amount, dec!(30));
    assert_eq!(figures.tax_amount, dec!(43.2));
    assert_eq!(figures.total, dec!(313.2));
}

#[test]
fn test_fractional_quantity() {
    let figures = TotalsCalculator::compute_line_item(
        dec!(2.5),
        dec!(4.2),
        Decimal::ZERO,
        Decimal::ZERO,
    )
    .unwrap();
    assert_eq!(figures.subtotal, dec!(10.5));
    assert_eq!(figures.total, dec!(10.5));
}

#[test]
fn test_hundred_percent_discount_zeroes_total() {
    let figures = TotalsCalculator::compute_line_item(
        dec!(7),
        dec!(13),
        dec!(100),
        dec!(19),
    )
    .unwrap();
    assert_eq!(figures.discount_amount, figures.subtotal);
    assert_eq!(figures.tax_amount, Decimal::ZERO);
    assert_eq!(figures.total, Decimal::ZERO);
}

#[test]
fn test_invalid_inputs_rejected() {
    assert!(TotalsCalculator::compute_line_item(dec!(0), dec!(10), dec!(0), dec!(0)).is_err());
    assert!(TotalsCalculator::compute_line_item(dec!(-1), dec!(10), dec!(0), dec!(0)).is_err());
    assert!(TotalsCalculator::compute_line_item(dec!(1), dec!(-10), dec!(0), dec!(0)).is_err());
    assert!(TotalsCalculator::compute_line_item(dec!(1), dec!(10), dec!(101), dec!(0)).is_err());
    assert!(TotalsCalculator::compute_line_item(dec!(1), dec!(10), dec!(-5), dec!(0)).is_err());
    assert!(TotalsCalculator::compute_line_item(dec!(1), dec!(10), dec!(0), dec!(-1)).is_err());
}

#[test]
fn test_input_recomputes_submitted_figures() {
    // Client-submitted derived figures are ignored; only the canonical
    // inputs survive into the stored item
    let input = LineItemInput {
        id: None,
        description: "Widget".to_string(),
        product_id: Some("p1".to_string()),
        variant_id: None,
        warehouse_id: Some("w1".to_string()),
        quantity: dec!(2),
        unit_price: dec!(50),
        discount_percentage: Decimal::ZERO,
        tax_percentage: dec!(19),
    };
    let item = input.into_line_item().unwrap();
    assert_eq!(item.subtotal, dec!(100));
    assert_eq!(item.tax_amount, dec!(19));
    assert_eq!(item.total, dec!(119));
    assert_eq!(item.product_id.as_deref(), Some("p1"));
    assert_eq!(item.warehouse_id.as_deref(), Some("w1"));
}

proptest! {
    /// Subtotal is exactly quantity * unit_price at full precision
    #[test]
    fn test_subtotal_formula(
        quantity_cents in 1u64..=1_000_000,
        price_cents in 0u64..=10_000_000,
    ) {
        let quantity = Decimal::new(quantity_cents as i64, 2);
        let unit_price = Decimal::new(price_cents as i64, 2);

        let figures = TotalsCalculator::compute_line_item(
            quantity,
            unit_price,
            Decimal::ZERO,
            Decimal::ZERO,
        ).unwrap();

        prop_assert_eq!(figures.subtotal, quantity * unit_price);
        prop_assert_eq!(figures.total, figures.subtotal);
    }

    /// Figures are internally consistent for any valid input combination
    #[test]
    fn test_figures_consistency(
        quantity in 1i64..=10_000,
        price_cents in 0u64..=1_000_000,
        discount_pct in 0u8..=100,
        tax_pct in 0u8..=50,
    ) {
        let unit_price = Decimal::new(price_cents as i64, 2);
        let discount = Decimal::from(discount_pct);
        let tax = Decimal::from(tax_pct);

        let figures = TotalsCalculator::compute_line_item(
            Decimal::from(quantity),
            unit_price,
            discount,
            tax,
        ).unwrap();

        prop_assert!(figures.discount_amount >= Decimal::ZERO);
        prop_assert!(figures.discount_amount <= figures.subtotal);
        prop_assert_eq!(
            figures.tax_amount,
            (figures.subtotal - figures.discount_amount) * tax / Decimal::ONE_HUNDRED
        );
        prop_assert_eq!(
            figures.total,
            figures.subtotal - figures.discount_amount + figures.tax_amount
        );
        prop_assert!(figures.total >= Decimal::ZERO);
    }

    /// Recalculation after mutating the canonical inputs matches a fresh
    /// construction with the same inputs
    #[test]
    fn test_recalculate_matches_fresh_item(
        quantity in 1i64..=1_000,
        price in 0i64..=10_000,
        new_quantity in 1i64..=1_000,
    ) {
        let mut item = LineItem::new(
            "item".to_string(),
            Decimal::from(quantity),
            Decimal::from(price),
            Decimal::ZERO,
            Decimal::ZERO,
        ).unwrap();

        item.quantity = Decimal::from(new_quantity);
        item.recalculate().unwrap();

        let fresh = LineItem::new(
            "item".to_string(),
            Decimal::from(new_quantity),
            Decimal::from(price),
            Decimal::ZERO,
            Decimal::ZERO,
        ).unwrap();

        prop_assert_eq!(item.subtotal, fresh.subtotal);
        prop_assert_eq!(item.total, fresh.total);
    }
}
