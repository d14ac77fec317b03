use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::{AppError, Result};

/// Running stock balance for one (product, variant?, warehouse, batch?) key
///
/// The quantity is a signed balance. Adjustments may never drive it
/// negative; reversals may (accepted audit-ledger risk, see
/// `AdjustmentService::reverse_adjustment`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryLevel {
    pub id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub warehouse_id: String,
    pub batch: Option<String>,
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryLevel {
    /// Balance after applying a signed delta, rejecting results below zero
    pub fn checked_apply(&self, delta: Decimal) -> Result<Decimal> {
        let next = self.quantity + delta;
        if next < Decimal::ZERO {
            return Err(AppError::conflict(format!(
                "Insufficient stock: balance {} cannot absorb delta {}",
                self.quantity, delta
            )));
        }
        Ok(next)
    }
}
