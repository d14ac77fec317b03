pub mod adjustment;
pub mod inventory_level;

pub use adjustment::{AdjustmentInput, AdjustmentType, ExpectedSign, InventoryAdjustment};
pub use inventory_level::InventoryLevel;
