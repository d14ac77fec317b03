pub mod models;
pub mod repositories;
pub mod services;

pub use models::{
    derive_status, ensure_items_cover_deliveries, payment_epsilon, Payment, Sale, SaleStatus,
};
pub use repositories::SaleRepository;
pub use services::SaleService;
