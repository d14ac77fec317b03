pub mod models;
pub mod repositories;
pub mod services;

pub use models::{AdjustmentInput, AdjustmentType, InventoryAdjustment, InventoryLevel};
pub use repositories::InventoryRepository;
pub use services::AdjustmentService;
