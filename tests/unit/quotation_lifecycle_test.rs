// Quotation status machine
//
// draft -> sent -> approved | rejected, approved -> converted. Any
// non-terminal quotation expires once its expiry date passes (lazily, on
// read), and only draft or expired quotations are editable.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use salebook::quotations::{Quotation, QuotationStatus};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
}

fn quotation(status: QuotationStatus) -> Quotation {
    Quotation {
        id: Some("q1".to_string()),
        code: Some("QUO-202507-0001".to_string()),
        customer_id: Some("c1".to_string()),
        issue_date: day(1),
        expiry_date: None,
        currency_code: "USD".to_string(),
        exchange_rate: Decimal::ONE,
        include_tax: true,
        subtotal: dec!(300),
        discount_amount: dec!(30),
        tax_amount: dec!(43.2),
        total: dec!(313.2),
        status,
        converted_to_sale_id: None,
        notes: None,
        created_by: None,
        created_at: None,
        updated_at: None,
        deleted_at: None,
        line_items: vec![],
    }
}

#[test]
fn test_full_happy_path() {
    let mut q = quotation(QuotationStatus::Draft);
    q.update_status(QuotationStatus::Sent).unwrap();
    q.update_status(QuotationStatus::Approved).unwrap();
    q.mark_converted("s1".to_string()).unwrap();

    assert_eq!(q.status, QuotationStatus::Converted);
    assert_eq!(q.converted_to_sale_id.as_deref(), Some("s1"));
}

#[test]
fn test_rejection_path_is_terminal() {
    let mut q = quotation(QuotationStatus::Sent);
    q.update_status(QuotationStatus::Rejected).unwrap();

    assert!(q.update_status(QuotationStatus::Sent).is_err());
    assert!(q.update_status(QuotationStatus::Approved).is_err());
    assert!(!q.is_editable());
}

#[test]
fn test_skipping_states_rejected() {
    let mut q = quotation(QuotationStatus::Draft);
    assert!(q.update_status(QuotationStatus::Approved).is_err());
    assert!(q.update_status(QuotationStatus::Rejected).is_err());
    assert!(q.update_status(QuotationStatus::Converted).is_err());
    assert_eq!(q.status, QuotationStatus::Draft);
}

#[test]
fn test_only_approved_converts() {
    for status in [
        QuotationStatus::Draft,
        QuotationStatus::Sent,
        QuotationStatus::Rejected,
        QuotationStatus::Expired,
    ] {
        let mut q = quotation(status);
        assert!(q.mark_converted("s1".to_string()).is_err());
        assert_eq!(q.converted_to_sale_id, None);
    }
}

#[test]
fn test_conversion_applies_once() {
    // Two racing conversions must not both book a sale; the second one
    // sees converted and fails without touching the recorded sale ID
    let mut q = quotation(QuotationStatus::Approved);
    q.mark_converted("s1".to_string()).unwrap();

    assert!(q.mark_converted("s2".to_string()).is_err());
    assert_eq!(q.status, QuotationStatus::Converted);
    assert_eq!(q.converted_to_sale_id.as_deref(), Some("s1"));
}

#[test]
fn test_lazy_expiry_flips_non_terminal_states() {
    let today = day(10);

    for status in [QuotationStatus::Draft, QuotationStatus::Sent, QuotationStatus::Approved] {
        let mut q = quotation(status);
        q.expiry_date = Some(day(9));
        assert!(q.expire_if_due(today));
        assert_eq!(q.status, QuotationStatus::Expired);
    }

    // Terminal states never flip
    for status in [
        QuotationStatus::Rejected,
        QuotationStatus::Converted,
        QuotationStatus::Expired,
    ] {
        let mut q = quotation(status);
        q.expiry_date = Some(day(9));
        assert!(!q.expire_if_due(today));
        assert_eq!(q.status, status);
    }
}

#[test]
fn test_expiry_on_the_day_is_still_live() {
    let mut q = quotation(QuotationStatus::Sent);
    q.expiry_date = Some(day(10));
    // Expiry date itself is the last valid day
    assert!(!q.expire_if_due(day(10)));
    assert!(q.expire_if_due(day(11)));
}

#[test]
fn test_editability() {
    assert!(quotation(QuotationStatus::Draft).is_editable());
    assert!(quotation(QuotationStatus::Expired).is_editable());
    assert!(!quotation(QuotationStatus::Sent).is_editable());
    assert!(!quotation(QuotationStatus::Approved).is_editable());
    assert!(!quotation(QuotationStatus::Converted).is_editable());

    let mut deleted = quotation(QuotationStatus::Draft);
    deleted.deleted_at = Some(chrono::Utc::now());
    assert!(!deleted.is_editable());
}

#[test]
fn test_header_validation() {
    let mut q = quotation(QuotationStatus::Draft);
    assert!(q.validate_header().is_ok());

    q.expiry_date = Some(day(30));
    assert!(q.validate_header().is_ok());

    // Expiry before issue is nonsense
    q.issue_date = day(15);
    q.expiry_date = Some(day(10));
    assert!(q.validate_header().is_err());

    q.expiry_date = None;
    q.exchange_rate = Decimal::ZERO;
    assert!(q.validate_header().is_err());
}

#[test]
fn test_status_strings_round_trip() {
    for status in [
        QuotationStatus::Draft,
        QuotationStatus::Sent,
        QuotationStatus::Approved,
        QuotationStatus::Rejected,
        QuotationStatus::Expired,
        QuotationStatus::Converted,
    ] {
        assert_eq!(
            QuotationStatus::try_from(status.as_str().to_string()).unwrap(),
            status
        );
    }
    assert!(QuotationStatus::try_from("open".to_string()).is_err());
}
