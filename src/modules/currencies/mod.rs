pub mod repositories;
pub mod services;

pub use repositories::CurrencyRepository;
pub use services::CurrencyService;
