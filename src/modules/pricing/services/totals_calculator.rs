use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};
use crate::modules::pricing::models::{LineItem, LineItemFigures};

/// Document-level money figures aggregated over line items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Pure line-item and document totals arithmetic
///
/// All sums accumulate at full Decimal precision; rounding to the document
/// currency happens once, at persistence/display time, so many-line
/// documents do not compound per-line rounding error.
pub struct TotalsCalculator;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

impl TotalsCalculator {
    /// Derive the four money figures for one line item
    ///
    /// Formulas:
    /// - subtotal        = quantity * unit_price
    /// - discount_amount = subtotal * discount_percentage / 100
    /// - tax_amount      = (subtotal - discount_amount) * tax_percentage / 100
    /// - total           = subtotal - discount_amount + tax_amount
    pub fn compute_line_item(
        quantity: Decimal,
        unit_price: Decimal,
        discount_percentage: Decimal,
        tax_percentage: Decimal,
    ) -> Result<LineItemFigures> {
        Self::validate_inputs(quantity, unit_price, discount_percentage, tax_percentage)?;

        let subtotal = quantity * unit_price;
        let discount_amount = subtotal * discount_percentage / HUNDRED;
        let tax_amount = (subtotal - discount_amount) * tax_percentage / HUNDRED;
        let total = subtotal - discount_amount + tax_amount;

        Ok(LineItemFigures {
            subtotal,
            discount_amount,
            tax_amount,
            total,
        })
    }

    /// Aggregate line items into document totals
    ///
    /// The document total honors the include-tax toggle and, for sales, a
    /// shipping amount:
    /// `total = subtotal - discount (+ tax if include_tax) (+ shipping)`
    pub fn compute_document_totals(
        items: &[LineItem],
        include_tax: bool,
        shipping_amount: Decimal,
    ) -> Result<DocumentTotals> {
        if shipping_amount < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Shipping amount must be non-negative, got {}",
                shipping_amount
            )));
        }

        let mut subtotal = Decimal::ZERO;
        let mut discount_amount = Decimal::ZERO;
        let mut tax_amount = Decimal::ZERO;

        for item in items {
            subtotal += item.subtotal;
            discount_amount += item.discount_amount;
            tax_amount += item.tax_amount;
        }

        let mut total = subtotal - discount_amount;
        if include_tax {
            total += tax_amount;
        }
        total += shipping_amount;

        Ok(DocumentTotals {
            subtotal,
            discount_amount,
            tax_amount,
            total,
        })
    }

    fn validate_inputs(
        quantity: Decimal,
        unit_price: Decimal,
        discount_percentage: Decimal,
        tax_percentage: Decimal,
    ) -> Result<()> {
        if quantity <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Quantity must be positive, got {}",
                quantity
            )));
        }
        if unit_price < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Unit price must be non-negative, got {}",
                unit_price
            )));
        }
        if discount_percentage < Decimal::ZERO || discount_percentage > HUNDRED {
            return Err(AppError::validation(format!(
                "Discount percentage must be between 0 and 100, got {}",
                discount_percentage
            )));
        }
        if tax_percentage < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Tax percentage must be non-negative, got {}",
                tax_percentage
            )));
        }
        Ok(())
    }
}
