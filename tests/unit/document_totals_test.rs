// Document-level aggregation tests
//
// Totals accumulate line figures at full Decimal precision; currency
// rounding happens once on the aggregates, so many-line documents do not
// compound per-line rounding error.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use salebook::core::Currency;
use salebook::pricing::{LineItem, TotalsCalculator};

fn item(quantity: Decimal, price: Decimal, discount: Decimal, tax: Decimal) -> LineItem {
    LineItem::new("item".to_string(), quantity, price, discount, tax).unwrap()
}

#[test]
fn test_totals_sum_line_figures() {
    let items = vec![
        item(dec!(3), dec!(100), dec!(10), dec!(16)),
        item(dec!(1), dec!(50), dec!(0), dec!(16)),
    ];
    let totals = TotalsCalculator::compute_document_totals(&items, true, Decimal::ZERO).unwrap();

    assert_eq!(totals.subtotal, dec!(350));
    assert_eq!(totals.discount_amount, dec!(30));
    assert_eq!(totals.tax_amount, dec!(51.2));
    assert_eq!(totals.total, dec!(371.2));
}

#[test]
fn test_include_tax_toggle_only_affects_total() {
    let items = vec![item(dec!(2), dec!(100), dec!(0), dec!(19))];
    let on = TotalsCalculator::compute_document_totals(&items, true, Decimal::ZERO).unwrap();
    let off = TotalsCalculator::compute_document_totals(&items, false, Decimal::ZERO).unwrap();

    assert_eq!(on.tax_amount, off.tax_amount);
    assert_eq!(on.total, dec!(238));
    assert_eq!(off.total, dec!(200));
}

#[test]
fn test_shipping_added_after_items() {
    let items = vec![item(dec!(1), dec!(100), dec!(0), dec!(0))];
    let totals =
        TotalsCalculator::compute_document_totals(&items, true, dec!(12.5)).unwrap();
    assert_eq!(totals.total, dec!(112.5));
}

#[test]
fn test_empty_document_is_all_zeroes() {
    let totals = TotalsCalculator::compute_document_totals(&[], true, Decimal::ZERO).unwrap();
    assert_eq!(totals.subtotal, Decimal::ZERO);
    assert_eq!(totals.total, Decimal::ZERO);
}

#[test]
fn test_rounding_once_beats_rounding_per_line() {
    // 10 lines of 1 x 0.333 with 0 tax: full-precision sum is 3.33 after
    // one rounding; per-line rounding to 2dp would also give 3.33 here,
    // but 0.333... style thirds diverge
    let clp = Currency::new("CLP", "$", 0);
    let items: Vec<LineItem> = (0..10)
        .map(|_| item(dec!(1), dec!(0.4), dec!(0), dec!(0)))
        .collect();
    let totals = TotalsCalculator::compute_document_totals(&items, true, Decimal::ZERO).unwrap();

    // Sum is exactly 4; per-line rounding at 0dp would have produced 0
    assert_eq!(totals.total, dec!(4));
    assert_eq!(clp.round(totals.total), dec!(4));
}

proptest! {
    /// Aggregates equal the sums of the line figures for any item mix
    #[test]
    fn test_aggregation_is_a_plain_sum(
        lines in prop::collection::vec(
            (1i64..=100, 0i64..=10_000, 0u8..=100u8, 0u8..=30u8),
            1..=20,
        ),
        include_tax in any::<bool>(),
        shipping_cents in 0u64..=100_000,
    ) {
        let items: Vec<LineItem> = lines
            .iter()
            .map(|(q, p, d, t)| {
                item(
                    Decimal::from(*q),
                    Decimal::from(*p),
                    Decimal::from(*d),
                    Decimal::from(*t),
                )
            })
            .collect();
        let shipping = Decimal::new(shipping_cents as i64, 2);

        let totals =
            TotalsCalculator::compute_document_totals(&items, include_tax, shipping).unwrap();

        let subtotal: Decimal = items.iter().map(|i| i.subtotal).sum();
        let discount: Decimal = items.iter().map(|i| i.discount_amount).sum();
        let tax: Decimal = items.iter().map(|i| i.tax_amount).sum();

        prop_assert_eq!(totals.subtotal, subtotal);
        prop_assert_eq!(totals.discount_amount, discount);
        prop_assert_eq!(totals.tax_amount, tax);

        let mut expected = subtotal - discount + shipping;
        if include_tax {
            expected += tax;
        }
        prop_assert_eq!(totals.total, expected);
    }
}
