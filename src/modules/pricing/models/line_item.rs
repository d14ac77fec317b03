use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::core::Result;
use crate::modules::pricing::services::TotalsCalculator;

/// Derived money figures for a single line item
///
/// Always produced server-side from the four canonical inputs; any figures
/// submitted by a client are display-only and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemFigures {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// A single line of a quotation or sale
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineItem {
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    /// Parent quotation or sale ID
    #[serde(skip_deserializing)]
    pub document_id: Option<String>,

    pub description: String,

    /// Opaque external references; the core never interprets them
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub warehouse_id: Option<String>,

    /// Must be > 0 (fractional quantities are allowed)
    pub quantity: Decimal,
    /// Must be >= 0
    pub unit_price: Decimal,
    /// 0..=100, defaults to 0
    #[serde(default)]
    pub discount_percentage: Decimal,
    /// >= 0, defaults to 0
    #[serde(default)]
    pub tax_percentage: Decimal,

    /// quantity * unit_price
    #[serde(skip_deserializing)]
    pub subtotal: Decimal,
    /// subtotal * discount_percentage / 100
    #[serde(skip_deserializing)]
    pub discount_amount: Decimal,
    /// (subtotal - discount_amount) * tax_percentage / 100
    #[serde(skip_deserializing)]
    pub tax_amount: Decimal,
    /// subtotal - discount_amount + tax_amount
    #[serde(skip_deserializing)]
    pub total: Decimal,
}

impl LineItem {
    /// Create a line item with validated inputs and freshly derived figures
    pub fn new(
        description: String,
        quantity: Decimal,
        unit_price: Decimal,
        discount_percentage: Decimal,
        tax_percentage: Decimal,
    ) -> Result<Self> {
        let figures = TotalsCalculator::compute_line_item(
            quantity,
            unit_price,
            discount_percentage,
            tax_percentage,
        )?;

        Ok(Self {
            id: None,
            document_id: None,
            description,
            product_id: None,
            variant_id: None,
            warehouse_id: None,
            quantity,
            unit_price,
            discount_percentage,
            tax_percentage,
            subtotal: figures.subtotal,
            discount_amount: figures.discount_amount,
            tax_amount: figures.tax_amount,
            total: figures.total,
        })
    }

    /// Recompute the derived figures from the canonical inputs
    ///
    /// Called before every persistence so stored figures can never drift
    /// from their inputs, whatever the row looked like when loaded.
    pub fn recalculate(&mut self) -> Result<()> {
        let figures = TotalsCalculator::compute_line_item(
            self.quantity,
            self.unit_price,
            self.discount_percentage,
            self.tax_percentage,
        )?;
        self.subtotal = figures.subtotal;
        self.discount_amount = figures.discount_amount;
        self.tax_amount = figures.tax_amount;
        self.total = figures.total;
        Ok(())
    }

    pub fn with_references(
        mut self,
        product_id: Option<String>,
        variant_id: Option<String>,
        warehouse_id: Option<String>,
    ) -> Self {
        self.product_id = product_id;
        self.variant_id = variant_id;
        self.warehouse_id = warehouse_id;
        self
    }
}

/// Client-submitted line item; only the four canonical inputs and opaque
/// references are accepted, derived figures are recomputed server-side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    /// Existing row ID, echoed back on edit; keeps delivery guide items
    /// pointing at the same line item across edits
    #[serde(default)]
    pub id: Option<String>,
    pub description: String,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub warehouse_id: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub tax_percentage: Decimal,
}

impl LineItemInput {
    pub fn into_line_item(self) -> Result<LineItem> {
        let mut item = LineItem::new(
            self.description,
            self.quantity,
            self.unit_price,
            self.discount_percentage,
            self.tax_percentage,
        )?
        .with_references(self.product_id, self.variant_id, self.warehouse_id);
        item.id = self.id;
        Ok(item)
    }
}
