// Currency precision and formatting behavior
//
// Arithmetic runs at full Decimal precision; each figure is rounded once,
// to the currency's decimal places, at persistence/display time. Rounding
// uses banker's rounding (round half to even), matching rust_decimal's
// round_dp default.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use salebook::core::Currency;

fn usd() -> Currency {
    Currency::new("USD", "$", 2)
}

fn zero_decimal() -> Currency {
    Currency::new("CLP", "$", 0)
}

#[test]
fn test_round_to_currency_places() {
    assert_eq!(usd().round(dec!(313.2)), dec!(313.2));
    assert_eq!(usd().round(dec!(10.336666)), dec!(10.34));
    assert_eq!(zero_decimal().round(dec!(10.4)), dec!(10));
    assert_eq!(zero_decimal().round(dec!(10.6)), dec!(11));
}

#[test]
fn test_bankers_rounding_at_midpoint() {
    assert_eq!(usd().round(dec!(10.005)), dec!(10.00));
    assert_eq!(usd().round(dec!(10.015)), dec!(10.02));
    assert_eq!(zero_decimal().round(dec!(0.5)), dec!(0));
    assert_eq!(zero_decimal().round(dec!(1.5)), dec!(2));
}

#[test]
fn test_amount_scale_validation() {
    assert!(usd().validate_amount(dec!(19.99)).is_ok());
    assert!(usd().validate_amount(dec!(19)).is_ok());
    assert!(usd().validate_amount(dec!(19.999)).is_err());
    assert!(zero_decimal().validate_amount(dec!(19.9)).is_err());
}

#[test]
fn test_currency_row_validation() {
    let mut c = usd();
    assert!(c.validate().is_ok());

    c.exchange_rate = Decimal::ZERO;
    assert!(c.validate().is_err());
    c.exchange_rate = dec!(-1);
    assert!(c.validate().is_err());

    let blank = Currency::new("  ", "$", 2);
    assert!(blank.validate().is_err());
}

#[test]
fn test_default_currency_cannot_be_removed() {
    let mut currency = usd();
    currency.is_default = true;
    assert!(currency.guard_removal().is_err());

    currency.is_default = false;
    assert!(currency.guard_removal().is_ok());
}

#[test]
fn test_formatting_with_configured_separators() {
    assert_eq!(usd().format_amount(dec!(1234567.5)), "$ 1,234,567.50");
    assert_eq!(usd().format_amount(dec!(0.5)), "$ 0.50");
    assert_eq!(usd().format_amount(dec!(-42)), "-$ 42.00");

    // Latin-style: dot for thousands, comma for decimals
    let mut eur = Currency::new("EUR", "\u{20ac}", 2);
    eur.thousand_separator = ".".to_string();
    eur.decimal_separator = ",".to_string();
    assert_eq!(eur.format_amount(dec!(9876.5)), "\u{20ac} 9.876,50");

    assert_eq!(zero_decimal().format_amount(dec!(1234567)), "$ 1,234,567");
}

proptest! {
    /// Rounding is idempotent and never increases scale past the limit
    #[test]
    fn test_round_idempotent(
        cents in -1_000_000_000i64..=1_000_000_000,
        places in 0u32..=4,
    ) {
        let currency = Currency::new("XXX", "#", places);
        let amount = Decimal::new(cents, 4);
        let rounded = currency.round(amount);

        prop_assert!(rounded.scale() <= places);
        prop_assert_eq!(currency.round(rounded), rounded);
        prop_assert!(currency.validate_amount(rounded).is_ok());
    }

    /// Rounding moves an amount by at most half a unit of the last place
    #[test]
    fn test_round_error_bound(
        cents in -1_000_000_000i64..=1_000_000_000,
    ) {
        let amount = Decimal::new(cents, 4);
        let rounded = usd().round(amount);
        let half_cent = dec!(0.005);
        prop_assert!((amount - rounded).abs() <= half_cent);
    }
}
