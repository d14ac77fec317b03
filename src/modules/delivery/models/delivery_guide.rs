use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};

/// A delivery guide: a partial-fulfillment record against a sale
///
/// Guides form an append-mostly ledger per sale; only the most recently
/// created guide may be edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeliveryGuide {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    /// Sequential business code, e.g. `DEL-202507-0001`
    #[serde(skip_deserializing)]
    pub code: Option<String>,

    pub sale_id: String,
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
    pub items: Vec<DeliveryGuideItem>,
}

/// One delivered quantity against a specific sale line item
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeliveryGuideItem {
    #[serde(skip_deserializing)]
    pub id: Option<String>,
    #[serde(skip_deserializing)]
    pub guide_id: Option<String>,
    pub sale_item_id: String,
    pub quantity: Decimal,
}

impl DeliveryGuideItem {
    pub fn new(sale_item_id: String, quantity: Decimal) -> Result<Self> {
        if quantity <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Delivered quantity must be positive, got {}",
                quantity
            )));
        }
        Ok(Self {
            id: None,
            guide_id: None,
            sale_item_id,
            quantity,
        })
    }
}

/// Quantity still undelivered for a sale item
pub fn pending_quantity(ordered: Decimal, delivered: Decimal) -> Decimal {
    (ordered - delivered).max(Decimal::ZERO)
}

/// Ceiling for a quantity when editing an existing guide: the current
/// pending amount plus whatever this guide already holds, so an edit does
/// not double-count its own prior allocation
pub fn max_allowed_on_edit(pending: Decimal, own_allocation: Decimal) -> Decimal {
    pending + own_allocation
}
