pub mod totals_calculator;

pub use totals_calculator::{DocumentTotals, TotalsCalculator};
