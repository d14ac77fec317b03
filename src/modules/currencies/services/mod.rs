pub mod currency_service;

pub use currency_service::CurrencyService;
