pub mod models;
pub mod services;

pub use models::DocumentSeries;
pub use services::{LockedAllocator, ScanAllocator, SequenceAllocator};
