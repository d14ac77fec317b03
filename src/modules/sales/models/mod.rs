pub mod payment;
pub mod requests;
pub mod sale;

pub use payment::Payment;
pub use requests::{
    CreateSaleRequest, RegisterPaymentRequest, UpdateSaleRequest, UpdateSaleStatusRequest,
};
pub use sale::{
    derive_status, ensure_items_cover_deliveries, payment_epsilon, Sale, SaleStatus,
};
