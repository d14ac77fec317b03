pub mod models;
pub mod repositories;
pub mod services;

pub use models::{LineItem, LineItemFigures, LineItemInput};
pub use services::{DocumentTotals, TotalsCalculator};
