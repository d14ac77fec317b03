use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};
use crate::modules::pricing::{DocumentTotals, LineItem};

/// Sale status lifecycle
///
/// `pending`, `partial` and `paid` are derived from the paid/total
/// relationship and never set freely during creation or edit. `cancelled`
/// and other manual overrides go through the dedicated status operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Never produced by `derive_status`; reachable only through the
    /// manual status override (or rows written by external tooling)
    #[default]
    Draft,
    Pending,
    Partial,
    Paid,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Partial => "partial",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for SaleStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "partial" => Ok(Self::Partial),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid sale status: {}", value)),
        }
    }
}

/// Tolerance when comparing paid against total (two cents of drift from
/// rounded partial payments is treated as fully paid)
pub fn payment_epsilon() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

/// Single source of truth for the paid/partial/pending decision
///
/// - `amount_paid <= 0` -> `pending`
/// - `|total - amount_paid| <= 0.01` (or overpaid) -> `paid`
/// - otherwise -> `partial`
pub fn derive_status(total: Decimal, amount_paid: Decimal) -> SaleStatus {
    if amount_paid <= Decimal::ZERO {
        return SaleStatus::Pending;
    }
    if amount_paid >= total || (total - amount_paid).abs() <= payment_epsilon() {
        return SaleStatus::Paid;
    }
    SaleStatus::Partial
}

/// Guard for sale edits when delivery guides exist
///
/// The replacement item set must keep every line item that guides have
/// delivered against, at a quantity no smaller than the delivered sum.
/// Dropping or shrinking such an item would let delivered totals exceed
/// the ordered quantity.
pub fn ensure_items_cover_deliveries(
    items: &[LineItem],
    delivered: &HashMap<String, Decimal>,
) -> Result<()> {
    for (sale_item_id, done) in delivered {
        if *done <= Decimal::ZERO {
            continue;
        }
        let ordered = items
            .iter()
            .find(|item| item.id.as_deref() == Some(sale_item_id.as_str()))
            .map(|item| item.quantity)
            .ok_or_else(|| {
                AppError::state(format!(
                    "Cannot drop line item '{}': {} already delivered against it",
                    sale_item_id, done
                ))
            })?;
        if *done > ordered {
            return Err(AppError::state(format!(
                "Cannot reduce line item '{}' below the {} already delivered",
                sale_item_id, done
            )));
        }
    }
    Ok(())
}

/// A sale document
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sale {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    /// Sequential business code, e.g. `SAL-202507-0001`; assigned once at
    /// creation and never reissued
    #[serde(skip_deserializing)]
    pub code: Option<String>,

    /// Opaque customer reference
    pub customer_id: Option<String>,

    pub issue_date: NaiveDate,
    pub currency_code: String,
    /// Snapshot rate against the base currency, must be > 0
    pub exchange_rate: Decimal,
    /// Whether tax participates in the document total
    pub include_tax: bool,
    /// Added to the total after items, must be >= 0
    pub shipping_amount: Decimal,

    #[serde(skip_deserializing)]
    pub subtotal: Decimal,
    #[serde(skip_deserializing)]
    pub discount_amount: Decimal,
    #[serde(skip_deserializing)]
    pub tax_amount: Decimal,
    #[serde(skip_deserializing)]
    pub total: Decimal,

    #[serde(skip_deserializing)]
    pub amount_paid: Decimal,
    /// Always total - amount_paid, never set independently
    #[serde(skip_deserializing)]
    pub amount_due: Decimal,

    #[serde(skip_deserializing)]
    #[sqlx(try_from = "String")]
    pub status: SaleStatus,

    pub notes: Option<String>,

    /// Acting user attached for the audit trail, opaque to the core
    pub created_by: Option<String>,

    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-delete marker; sales are never hard-purged
    #[serde(skip_deserializing)]
    pub deleted_at: Option<DateTime<Utc>>,

    #[sqlx(skip)]
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Sale {
    /// Apply freshly computed document totals and re-derive the dependent
    /// fields (`amount_due`, status)
    pub fn set_totals(&mut self, totals: DocumentTotals) {
        self.subtotal = totals.subtotal;
        self.discount_amount = totals.discount_amount;
        self.tax_amount = totals.tax_amount;
        self.total = totals.total;
        self.amount_due = self.total - self.amount_paid;
        if self.status != SaleStatus::Cancelled {
            self.status = derive_status(self.total, self.amount_paid);
        }
        self.updated_at = Some(Utc::now());
    }

    /// Record a payment against this sale
    ///
    /// The amount must satisfy `0 < amount <= amount_due`. On success the
    /// paid/due figures shift by exactly `amount` and the status becomes
    /// `paid` when nothing is left due, `partial` otherwise.
    pub fn apply_payment(&mut self, amount: Decimal) -> Result<()> {
        if self.status == SaleStatus::Cancelled {
            return Err(AppError::state("Cannot register a payment on a cancelled sale"));
        }
        if amount <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Payment amount must be positive, got {}",
                amount
            )));
        }
        if self.amount_due <= Decimal::ZERO {
            return Err(AppError::validation("Sale is already fully paid"));
        }
        if amount > self.amount_due {
            return Err(AppError::validation(format!(
                "Payment amount {} exceeds amount due {}",
                amount, self.amount_due
            )));
        }

        self.amount_paid += amount;
        self.amount_due = self.total - self.amount_paid;
        self.status = if self.amount_due <= payment_epsilon() {
            SaleStatus::Paid
        } else {
            SaleStatus::Partial
        };
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        if self.status == SaleStatus::Cancelled {
            return Err(AppError::state("Sale is already cancelled"));
        }
        self.status = SaleStatus::Cancelled;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Manual status override via the dedicated status operation
    ///
    /// Cancelled is terminal; everything else is permitted because the
    /// derived status is recomputed on the next edit or payment anyway.
    pub fn override_status(&mut self, new_status: SaleStatus) -> Result<()> {
        if self.status == SaleStatus::Cancelled && new_status != SaleStatus::Cancelled {
            return Err(AppError::state("Cannot change status of a cancelled sale"));
        }
        self.status = new_status;
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_editable(&self) -> bool {
        self.status != SaleStatus::Cancelled && self.deleted_at.is_none()
    }

    pub fn validate_header(&self) -> Result<()> {
        if self.exchange_rate <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Exchange rate must be positive, got {}",
                self.exchange_rate
            )));
        }
        if self.shipping_amount < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Shipping amount must be non-negative, got {}",
                self.shipping_amount
            )));
        }
        if self.currency_code.trim().is_empty() {
            return Err(AppError::validation("Currency code cannot be empty"));
        }
        Ok(())
    }
}
