pub mod models;
pub mod repositories;
pub mod services;

pub use models::{DeliveryGuide, DeliveryGuideItem, DeliveryGuideRequest, DeliveryItemInput};
pub use services::DeliveryService;
