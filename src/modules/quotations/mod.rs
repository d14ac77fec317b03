pub mod models;
pub mod repositories;
pub mod services;

pub use models::{Quotation, QuotationRequest, QuotationStatus};
pub use services::QuotationService;
