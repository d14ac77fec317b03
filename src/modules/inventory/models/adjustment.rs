use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Typed stock movement with a sign convention
///
/// Additive types carry positive quantities, deductive types negative ones;
/// corrections go either way. The signed quantity is applied verbatim to the
/// parent level, so the convention is validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentType {
    Addition,
    Subtraction,
    Correction,
    Transfer,
    Loss,
    Damaged,
    Expired,
    Initial,
}

impl AdjustmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::Correction => "correction",
            Self::Transfer => "transfer",
            Self::Loss => "loss",
            Self::Damaged => "damaged",
            Self::Expired => "expired",
            Self::Initial => "initial",
        }
    }

    /// Whether this type adds stock, removes stock, or may do either
    pub fn expected_sign(&self) -> ExpectedSign {
        match self {
            Self::Addition | Self::Initial => ExpectedSign::Positive,
            Self::Subtraction | Self::Transfer | Self::Loss | Self::Damaged | Self::Expired => {
                ExpectedSign::Negative
            }
            Self::Correction => ExpectedSign::Either,
        }
    }

    pub fn validate_quantity(&self, quantity: Decimal) -> Result<()> {
        if quantity.is_zero() {
            return Err(AppError::validation("Adjustment quantity cannot be zero"));
        }
        match self.expected_sign() {
            ExpectedSign::Positive if quantity < Decimal::ZERO => Err(AppError::validation(
                format!("{} adjustments must carry a positive quantity", self.as_str()),
            )),
            ExpectedSign::Negative if quantity > Decimal::ZERO => Err(AppError::validation(
                format!("{} adjustments must carry a negative quantity", self.as_str()),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedSign {
    Positive,
    Negative,
    Either,
}

impl std::fmt::Display for AdjustmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for AdjustmentType {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "addition" => Ok(Self::Addition),
            "subtraction" => Ok(Self::Subtraction),
            "correction" => Ok(Self::Correction),
            "transfer" => Ok(Self::Transfer),
            "loss" => Ok(Self::Loss),
            "damaged" => Ok(Self::Damaged),
            "expired" => Ok(Self::Expired),
            "initial" => Ok(Self::Initial),
            _ => Err(format!("Invalid adjustment type: {}", value)),
        }
    }
}

/// Immutable ledger entry recording one stock movement
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryAdjustment {
    pub id: String,
    pub inventory_id: String,
    /// Signed delta applied to the parent level
    pub quantity: Decimal,
    #[sqlx(try_from = "String")]
    pub adjustment_type: AdjustmentType,
    pub supplier_id: Option<String>,
    pub reason: Option<String>,
    /// Acting user for the audit trail
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryAdjustment {
    pub fn new(
        inventory_id: String,
        quantity: Decimal,
        adjustment_type: AdjustmentType,
        supplier_id: Option<String>,
        reason: Option<String>,
        created_by: Option<String>,
    ) -> Result<Self> {
        adjustment_type.validate_quantity(quantity)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            inventory_id,
            quantity,
            adjustment_type,
            supplier_id,
            reason,
            created_by,
            created_at: Utc::now(),
        })
    }
}

/// Input for the adjustment operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentInput {
    pub inventory_id: String,
    pub quantity: Decimal,
    pub adjustment_type: AdjustmentType,
    pub supplier_id: Option<String>,
    pub reason: Option<String>,
    pub created_by: Option<String>,
}
