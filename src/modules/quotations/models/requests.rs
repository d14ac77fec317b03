use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::modules::pricing::LineItemInput;

/// Payload for creating or editing a quotation; edits replace the item set
/// and recompute every figure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotationRequest {
    pub customer_id: Option<String>,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub currency_code: String,
    /// Falls back to the currency's configured rate when omitted
    pub exchange_rate: Option<Decimal>,
    #[serde(default = "default_include_tax")]
    pub include_tax: bool,
    pub notes: Option<String>,
    pub line_items: Vec<LineItemInput>,
}

fn default_include_tax() -> bool {
    true
}
