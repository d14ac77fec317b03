use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};

/// A payment registered against a sale
///
/// Created only through the payment-registration operation, which updates
/// the parent sale's paid/due figures and status in the same transaction.
/// Payments are never mutated or deleted independently of their sale.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub amount: Decimal,
    pub payment_method: String,
    pub payment_date: NaiveDate,
    /// Acting user for the audit trail
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        sale_id: String,
        amount: Decimal,
        payment_method: String,
        payment_date: NaiveDate,
        created_by: Option<String>,
    ) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Payment amount must be positive, got {}",
                amount
            )));
        }
        if payment_method.trim().is_empty() {
            return Err(AppError::validation("Payment method cannot be empty"));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            sale_id,
            amount,
            payment_method,
            payment_date,
            created_by,
            created_at: Utc::now(),
        })
    }
}
