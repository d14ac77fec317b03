use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Payload for creating or editing a delivery guide; edits replace the
/// item set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryGuideRequest {
    pub notes: Option<String>,
    pub items: Vec<DeliveryItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryItemInput {
    pub sale_item_id: String,
    pub quantity: Decimal,
}
