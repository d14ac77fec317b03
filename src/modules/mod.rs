pub mod currencies;
pub mod delivery;
pub mod inventory;
pub mod pricing;
pub mod quotations;
pub mod sales;
pub mod sequence;
