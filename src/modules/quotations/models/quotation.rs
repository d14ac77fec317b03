use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};
use crate::modules::pricing::{DocumentTotals, LineItem};

/// Quotation status lifecycle
///
/// `draft -> sent -> approved | rejected`; any non-terminal state expires
/// once the expiry date passes (terminal set: expired, rejected, converted);
/// `approved -> converted` when a sale is produced. Only `draft` and
/// `expired` quotations are editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    #[default]
    Draft,
    Sent,
    Approved,
    Rejected,
    Expired,
    Converted,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Converted => "converted",
        }
    }

    /// States the system-driven expiry flip leaves alone
    pub fn is_expiry_terminal(&self) -> bool {
        matches!(self, Self::Expired | Self::Rejected | Self::Converted)
    }
}

impl std::fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for QuotationStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            "converted" => Ok(Self::Converted),
            _ => Err(format!("Invalid quotation status: {}", value)),
        }
    }
}

/// A quotation document
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Quotation {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    /// Sequential business code, e.g. `QUO-202507-0001`
    #[serde(skip_deserializing)]
    pub code: Option<String>,

    pub customer_id: Option<String>,

    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub currency_code: String,
    pub exchange_rate: Decimal,
    pub include_tax: bool,

    #[serde(skip_deserializing)]
    pub subtotal: Decimal,
    #[serde(skip_deserializing)]
    pub discount_amount: Decimal,
    #[serde(skip_deserializing)]
    pub tax_amount: Decimal,
    #[serde(skip_deserializing)]
    pub total: Decimal,

    #[serde(skip_deserializing)]
    #[sqlx(try_from = "String")]
    pub status: QuotationStatus,

    /// Set when the quotation is converted into a sale
    #[serde(skip_deserializing)]
    pub converted_to_sale_id: Option<String>,

    pub notes: Option<String>,
    pub created_by: Option<String>,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_deserializing)]
    pub deleted_at: Option<DateTime<Utc>>,

    #[sqlx(skip)]
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Quotation {
    /// Legal user-driven transitions; the expiry flip is system-driven and
    /// handled by [`Quotation::expire_if_due`]
    pub fn update_status(&mut self, new_status: QuotationStatus) -> Result<()> {
        use QuotationStatus::*;
        match (self.status, new_status) {
            (Draft, Sent) | (Sent, Approved) | (Sent, Rejected) | (Approved, Converted) => {
                self.status = new_status;
                self.updated_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(AppError::state(format!(
                "Invalid quotation status transition from {} to {}",
                self.status, new_status
            ))),
        }
    }

    /// Editable only while in draft or after expiring
    pub fn is_editable(&self) -> bool {
        matches!(self.status, QuotationStatus::Draft | QuotationStatus::Expired)
            && self.deleted_at.is_none()
    }

    /// System-driven expiry: flips any non-terminal quotation whose expiry
    /// date has passed. Returns whether a flip happened.
    pub fn expire_if_due(&mut self, today: NaiveDate) -> bool {
        if self.status.is_expiry_terminal() {
            return false;
        }
        match self.expiry_date {
            Some(expiry) if expiry < today => {
                self.status = QuotationStatus::Expired;
                self.updated_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }

    /// Apply freshly computed totals (quotations carry no shipping)
    pub fn set_totals(&mut self, totals: DocumentTotals) {
        self.subtotal = totals.subtotal;
        self.discount_amount = totals.discount_amount;
        self.tax_amount = totals.tax_amount;
        self.total = totals.total;
        self.updated_at = Some(Utc::now());
    }

    pub fn mark_converted(&mut self, sale_id: String) -> Result<()> {
        self.update_status(QuotationStatus::Converted)?;
        self.converted_to_sale_id = Some(sale_id);
        Ok(())
    }

    pub fn validate_header(&self) -> Result<()> {
        if self.exchange_rate <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Exchange rate must be positive, got {}",
                self.exchange_rate
            )));
        }
        if self.currency_code.trim().is_empty() {
            return Err(AppError::validation("Currency code cannot be empty"));
        }
        if let Some(expiry) = self.expiry_date {
            if expiry < self.issue_date {
                return Err(AppError::validation(
                    "Expiry date cannot be before the issue date",
                ));
            }
        }
        Ok(())
    }
}
