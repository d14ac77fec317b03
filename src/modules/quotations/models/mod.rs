pub mod quotation;
pub mod requests;

pub use quotation::{Quotation, QuotationStatus};
pub use requests::QuotationRequest;
