//! Salebook Commerce Domain Core Library
//!
//! This library provides the pricing, document numbering, status-transition,
//! payment, and inventory logic behind the salebook back office.

pub mod config;
pub mod core;
pub mod modules;

// Re-export commonly used types
pub use modules::currencies;
pub use modules::delivery;
pub use modules::inventory;
pub use modules::pricing;
pub use modules::quotations;
pub use modules::sales;
pub use modules::sequence;
