pub mod adjustment_service;

pub use adjustment_service::AdjustmentService;
