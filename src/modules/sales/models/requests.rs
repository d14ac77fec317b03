use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::modules::pricing::LineItemInput;

use super::SaleStatus;

/// Payload for creating a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    pub customer_id: Option<String>,
    pub issue_date: NaiveDate,
    pub currency_code: String,
    /// Falls back to the currency's configured rate when omitted
    pub exchange_rate: Option<Decimal>,
    #[serde(default = "default_include_tax")]
    pub include_tax: bool,
    #[serde(default)]
    pub shipping_amount: Decimal,
    pub notes: Option<String>,
    pub line_items: Vec<LineItemInput>,
}

/// Payload for editing a sale; the line item set is replaced wholesale and
/// every figure is recomputed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSaleRequest {
    pub customer_id: Option<String>,
    pub issue_date: NaiveDate,
    pub currency_code: String,
    pub exchange_rate: Option<Decimal>,
    #[serde(default = "default_include_tax")]
    pub include_tax: bool,
    #[serde(default)]
    pub shipping_amount: Decimal,
    pub notes: Option<String>,
    pub line_items: Vec<LineItemInput>,
}

/// Payload for the dedicated status override operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSaleStatusRequest {
    pub status: SaleStatus,
}

/// Payload for registering a payment against a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPaymentRequest {
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_date: NaiveDate,
}

fn default_include_tax() -> bool {
    true
}
