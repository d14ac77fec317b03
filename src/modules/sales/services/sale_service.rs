use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::mysql::MySqlPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};
use crate::modules::currencies::repositories::CurrencyRepository;
use crate::modules::delivery::repositories::DeliveryRepository;
use crate::modules::inventory::AdjustmentService;
use crate::modules::pricing::{DocumentTotals, LineItem, LineItemInput, TotalsCalculator};
use crate::modules::sales::models::{
    derive_status, ensure_items_cover_deliveries, CreateSaleRequest, Payment,
    RegisterPaymentRequest, Sale, SaleStatus, UpdateSaleRequest,
};
use crate::modules::sales::repositories::SaleRepository;
use crate::modules::sequence::{DocumentSeries, SequenceAllocator};

/// Bounded retries when an allocated code loses the insert race
const CODE_RETRY_LIMIT: u32 = 3;

/// Service for sale business logic
///
/// Creation runs as one transaction in a fixed order: line items are
/// recomputed, the status derived, inventory drawn down through the
/// adjustment ledger, and finally the header inserted under its allocated
/// code. Any failure rolls the whole transaction back.
pub struct SaleService {
    pool: MySqlPool,
    repository: SaleRepository,
    currencies: CurrencyRepository,
    inventory: AdjustmentService,
    deliveries: DeliveryRepository,
    allocator: Arc<dyn SequenceAllocator>,
}

impl SaleService {
    pub fn new(pool: MySqlPool, allocator: Arc<dyn SequenceAllocator>) -> Self {
        Self {
            repository: SaleRepository::new(pool.clone()),
            currencies: CurrencyRepository::new(pool.clone()),
            inventory: AdjustmentService::new(pool.clone()),
            deliveries: DeliveryRepository::new(pool.clone()),
            pool,
            allocator,
        }
    }

    /// Create a sale: recompute figures, derive status, decrement stock and
    /// assign a document code, all atomically
    pub async fn create_sale(
        &self,
        request: CreateSaleRequest,
        created_by: Option<String>,
    ) -> Result<Sale> {
        let currency = self.load_currency(&request.currency_code).await?;
        let exchange_rate = request.exchange_rate.unwrap_or(currency.exchange_rate);
        let line_items = Self::build_line_items(request.line_items)?;
        let totals = Self::rounded_totals(
            &line_items,
            request.include_tax,
            request.shipping_amount,
            &currency,
        )?;

        let now = chrono::Utc::now();
        let mut sale = Sale {
            id: Some(Uuid::new_v4().to_string()),
            code: None,
            customer_id: request.customer_id,
            issue_date: request.issue_date,
            currency_code: currency.code.clone(),
            exchange_rate,
            include_tax: request.include_tax,
            shipping_amount: request.shipping_amount,
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            tax_amount: totals.tax_amount,
            total: totals.total,
            amount_paid: Decimal::ZERO,
            amount_due: totals.total,
            status: derive_status(totals.total, Decimal::ZERO),
            notes: request.notes,
            created_by: created_by.clone(),
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
            line_items,
        };
        sale.validate_header()?;

        for attempt in 0..CODE_RETRY_LIMIT {
            let code = self
                .allocator
                .next_code(DocumentSeries::Sale, sale.issue_date)
                .await?;
            sale.code = Some(code.clone());

            let mut tx = self.pool.begin().await?;

            // Stock draw-down goes through the adjustment ledger so sales
            // share the audit trail with manual adjustments
            for item in &sale.line_items {
                if let (Some(product_id), Some(warehouse_id)) =
                    (item.product_id.as_deref(), item.warehouse_id.as_deref())
                {
                    self.inventory
                        .record_sale_decrement_with_tx(
                            &mut tx,
                            product_id,
                            item.variant_id.as_deref(),
                            warehouse_id,
                            item.quantity,
                            &code,
                            created_by.clone(),
                        )
                        .await?;
                }
            }

            match self.repository.insert_with_tx(&mut tx, &mut sale).await {
                Ok(()) => {
                    tx.commit().await?;
                    info!(
                        sale_id = sale.id.as_deref().unwrap_or(""),
                        code = code.as_str(),
                        total = %sale.total,
                        status = %sale.status,
                        "Created sale"
                    );
                    return Ok(sale);
                }
                Err(e) if e.is_retryable() && attempt + 1 < CODE_RETRY_LIMIT => {
                    // Dropping the transaction rolls back the stock writes
                    warn!(code = code.as_str(), "Lost document code race, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::conflict(format!(
            "Could not create sale after {} code allocation attempts",
            CODE_RETRY_LIMIT
        )))
    }

    /// Edit a sale: the item set is replaced and every figure recomputed;
    /// the status is re-derived against what has already been paid
    ///
    /// Items that echo their row ID keep it, so delivery guides stay
    /// attached; an item that guides have delivered against may not be
    /// dropped or shrunk below the delivered sum. Stock is decremented at
    /// creation only, so edits do not touch the inventory ledger.
    pub async fn update_sale(&self, id: &str, request: UpdateSaleRequest) -> Result<Sale> {
        let currency = self.load_currency(&request.currency_code).await?;

        let mut tx = self.pool.begin().await?;
        let mut sale = self
            .repository
            .find_by_id_for_update_with_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale with id '{}' not found", id)))?;

        if !sale.is_editable() {
            return Err(AppError::state("Cannot edit a cancelled sale"));
        }

        sale.customer_id = request.customer_id;
        sale.issue_date = request.issue_date;
        sale.currency_code = currency.code.clone();
        sale.exchange_rate = request.exchange_rate.unwrap_or(currency.exchange_rate);
        sale.include_tax = request.include_tax;
        sale.shipping_amount = request.shipping_amount;
        sale.notes = request.notes;
        sale.line_items = Self::build_line_items(request.line_items)?;
        sale.validate_header()?;

        let delivered = self
            .deliveries
            .delivered_by_sale_item_with_tx(&mut tx, id)
            .await?;
        ensure_items_cover_deliveries(&sale.line_items, &delivered)?;

        let totals = Self::rounded_totals(
            &sale.line_items,
            sale.include_tax,
            sale.shipping_amount,
            &currency,
        )?;
        sale.set_totals(totals);

        self.repository.update_with_tx(&mut tx, &mut sale).await?;
        tx.commit().await?;

        info!(sale_id = id, total = %sale.total, status = %sale.status, "Updated sale");
        Ok(sale)
    }

    /// Register a payment and shift the sale's paid/due/status atomically
    pub async fn register_payment(
        &self,
        sale_id: &str,
        request: RegisterPaymentRequest,
        created_by: Option<String>,
    ) -> Result<Payment> {
        let mut tx = self.pool.begin().await?;
        let mut sale = self
            .repository
            .find_by_id_for_update_with_tx(&mut tx, sale_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale with id '{}' not found", sale_id)))?;

        sale.apply_payment(request.amount)?;

        let payment = Payment::new(
            sale_id.to_string(),
            request.amount,
            request.payment_method,
            request.payment_date,
            created_by,
        )?;

        self.repository.insert_payment_with_tx(&mut tx, &payment).await?;
        self.repository
            .update_payment_fields_with_tx(&mut tx, &sale)
            .await?;
        tx.commit().await?;

        info!(
            sale_id = sale_id,
            amount = %payment.amount,
            amount_due = %sale.amount_due,
            status = %sale.status,
            "Registered payment"
        );
        Ok(payment)
    }

    pub async fn cancel_sale(&self, id: &str) -> Result<Sale> {
        let mut tx = self.pool.begin().await?;
        let mut sale = self
            .repository
            .find_by_id_for_update_with_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale with id '{}' not found", id)))?;

        sale.cancel()?;
        self.repository
            .update_payment_fields_with_tx(&mut tx, &sale)
            .await?;
        tx.commit().await?;

        info!(sale_id = id, "Cancelled sale");
        Ok(sale)
    }

    /// Dedicated manual status override
    pub async fn set_status(&self, id: &str, status: SaleStatus) -> Result<Sale> {
        let mut tx = self.pool.begin().await?;
        let mut sale = self
            .repository
            .find_by_id_for_update_with_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale with id '{}' not found", id)))?;

        sale.override_status(status)?;
        self.repository
            .update_payment_fields_with_tx(&mut tx, &sale)
            .await?;
        tx.commit().await?;
        Ok(sale)
    }

    pub async fn get_sale(&self, id: &str) -> Result<Sale> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale with id '{}' not found", id)))
    }

    pub async fn list_sales(&self, limit: i64, offset: i64) -> Result<Vec<Sale>> {
        self.repository.list(limit, offset).await
    }

    pub async fn list_payments(&self, sale_id: &str) -> Result<Vec<Payment>> {
        self.repository.list_payments(sale_id).await
    }

    /// Soft delete; decremented stock is deliberately NOT restored
    pub async fn delete_sale(&self, id: &str) -> Result<()> {
        self.repository.soft_delete(id).await?;
        info!(sale_id = id, "Soft-deleted sale");
        Ok(())
    }

    async fn load_currency(&self, code: &str) -> Result<Currency> {
        self.currencies
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Currency '{}' not found", code)))
    }

    fn build_line_items(inputs: Vec<LineItemInput>) -> Result<Vec<LineItem>> {
        if inputs.is_empty() {
            return Err(AppError::validation("Sale must have at least one line item"));
        }
        inputs.into_iter().map(LineItemInput::into_line_item).collect()
    }

    fn rounded_totals(
        items: &[LineItem],
        include_tax: bool,
        shipping_amount: Decimal,
        currency: &Currency,
    ) -> Result<DocumentTotals> {
        let totals = TotalsCalculator::compute_document_totals(items, include_tax, shipping_amount)?;
        Ok(DocumentTotals {
            subtotal: currency.round(totals.subtotal),
            discount_amount: currency.round(totals.discount_amount),
            tax_amount: currency.round(totals.tax_amount),
            total: currency.round(totals.total),
        })
    }
}
