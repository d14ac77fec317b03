use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::mysql::MySqlPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{AppError, Currency, Result};
use crate::modules::currencies::repositories::CurrencyRepository;
use crate::modules::pricing::{
    DocumentTotals, LineItem, LineItemInput, TotalsCalculator,
};
use crate::modules::quotations::models::{Quotation, QuotationRequest, QuotationStatus};
use crate::modules::quotations::repositories::QuotationRepository;
use crate::modules::sales::models::CreateSaleRequest;
use crate::modules::sales::SaleService;
use crate::modules::sequence::{DocumentSeries, SequenceAllocator};

const CODE_RETRY_LIMIT: u32 = 3;

/// Service for quotation business logic
///
/// Expiry is evaluated lazily: every list/show flips past-due non-terminal
/// quotations to expired before returning them, so no background job is
/// needed.
pub struct QuotationService {
    pool: MySqlPool,
    repository: QuotationRepository,
    currencies: CurrencyRepository,
    sales: SaleService,
    allocator: Arc<dyn SequenceAllocator>,
}

impl QuotationService {
    pub fn new(pool: MySqlPool, allocator: Arc<dyn SequenceAllocator>) -> Self {
        Self {
            repository: QuotationRepository::new(pool.clone()),
            currencies: CurrencyRepository::new(pool.clone()),
            sales: SaleService::new(pool.clone(), allocator.clone()),
            pool,
            allocator,
        }
    }

    pub async fn create_quotation(
        &self,
        request: QuotationRequest,
        created_by: Option<String>,
    ) -> Result<Quotation> {
        let currency = self.load_currency(&request.currency_code).await?;
        let line_items = Self::build_line_items(request.line_items)?;
        let totals = Self::rounded_totals(&line_items, request.include_tax, &currency)?;

        let now = Utc::now();
        let mut quotation = Quotation {
            id: Some(Uuid::new_v4().to_string()),
            code: None,
            customer_id: request.customer_id,
            issue_date: request.issue_date,
            expiry_date: request.expiry_date,
            currency_code: currency.code.clone(),
            exchange_rate: request.exchange_rate.unwrap_or(currency.exchange_rate),
            include_tax: request.include_tax,
            subtotal: totals.subtotal,
            discount_amount: totals.discount_amount,
            tax_amount: totals.tax_amount,
            total: totals.total,
            status: QuotationStatus::Draft,
            converted_to_sale_id: None,
            notes: request.notes,
            created_by,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
            line_items,
        };
        quotation.validate_header()?;

        for attempt in 0..CODE_RETRY_LIMIT {
            let code = self
                .allocator
                .next_code(DocumentSeries::Quotation, quotation.issue_date)
                .await?;
            quotation.code = Some(code.clone());

            let mut tx = self.pool.begin().await?;
            match self.repository.insert_with_tx(&mut tx, &mut quotation).await {
                Ok(()) => {
                    tx.commit().await?;
                    info!(
                        quotation_id = quotation.id.as_deref().unwrap_or(""),
                        code = code.as_str(),
                        total = %quotation.total,
                        "Created quotation"
                    );
                    return Ok(quotation);
                }
                Err(e) if e.is_retryable() && attempt + 1 < CODE_RETRY_LIMIT => {
                    warn!(code = code.as_str(), "Lost document code race, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::conflict(format!(
            "Could not create quotation after {} code allocation attempts",
            CODE_RETRY_LIMIT
        )))
    }

    /// Edit a quotation; only draft and expired quotations are editable
    ///
    /// An expired quotation whose new expiry date is no longer in the past
    /// returns to draft, re-entering the normal lifecycle.
    pub async fn update_quotation(&self, id: &str, request: QuotationRequest) -> Result<Quotation> {
        let currency = self.load_currency(&request.currency_code).await?;

        let mut tx = self.pool.begin().await?;
        let mut quotation = self
            .repository
            .find_by_id_for_update_with_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Quotation with id '{}' not found", id)))?;

        if !quotation.is_editable() {
            return Err(AppError::state(format!(
                "Quotation can only be edited in draft or expired status, current: {}",
                quotation.status
            )));
        }

        quotation.customer_id = request.customer_id;
        quotation.issue_date = request.issue_date;
        quotation.expiry_date = request.expiry_date;
        quotation.currency_code = currency.code.clone();
        quotation.exchange_rate = request.exchange_rate.unwrap_or(currency.exchange_rate);
        quotation.include_tax = request.include_tax;
        quotation.notes = request.notes;
        quotation.line_items = Self::build_line_items(request.line_items)?;
        quotation.validate_header()?;

        let totals =
            Self::rounded_totals(&quotation.line_items, quotation.include_tax, &currency)?;
        quotation.set_totals(totals);

        if quotation.status == QuotationStatus::Expired {
            let today = Utc::now().date_naive();
            let revived = quotation.expiry_date.map_or(true, |expiry| expiry >= today);
            if revived {
                quotation.status = QuotationStatus::Draft;
            }
        }

        self.repository.update_with_tx(&mut tx, &mut quotation).await?;
        tx.commit().await?;

        info!(quotation_id = id, status = %quotation.status, "Updated quotation");
        Ok(quotation)
    }

    /// Show one quotation, expiring it first when its date has passed
    pub async fn get_quotation(&self, id: &str) -> Result<Quotation> {
        let mut quotation = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Quotation with id '{}' not found", id)))?;

        if quotation.expire_if_due(Utc::now().date_naive()) {
            self.repository
                .update_status(id, QuotationStatus::Expired)
                .await?;
            info!(quotation_id = id, "Expired quotation on show");
        }
        Ok(quotation)
    }

    /// List quotations, expiring the past-due ones before returning them
    pub async fn list_quotations(&self, limit: i64, offset: i64) -> Result<Vec<Quotation>> {
        let mut quotations = self.repository.list(limit, offset).await?;
        let today = Utc::now().date_naive();

        for quotation in quotations.iter_mut() {
            if quotation.expire_if_due(today) {
                if let Some(id) = quotation.id.as_deref() {
                    self.repository
                        .update_status(id, QuotationStatus::Expired)
                        .await?;
                }
            }
        }
        Ok(quotations)
    }

    pub async fn send(&self, id: &str) -> Result<Quotation> {
        self.transition(id, QuotationStatus::Sent).await
    }

    pub async fn approve(&self, id: &str) -> Result<Quotation> {
        self.transition(id, QuotationStatus::Approved).await
    }

    pub async fn reject(&self, id: &str) -> Result<Quotation> {
        self.transition(id, QuotationStatus::Rejected).await
    }

    /// Convert an approved quotation into a sale
    ///
    /// The quotation row stays locked for the whole conversion: the sale is
    /// created through the sales service (own transaction, stock decrement
    /// and code allocation included), then the quotation is marked converted
    /// with the resulting sale ID. A concurrent conversion blocks on the
    /// lock and fails the status recheck instead of booking stock twice.
    pub async fn convert_to_sale(
        &self,
        id: &str,
        created_by: Option<String>,
    ) -> Result<(Quotation, String)> {
        let mut tx = self.pool.begin().await?;
        let mut quotation = self
            .repository
            .find_by_id_for_update_with_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Quotation with id '{}' not found", id)))?;

        quotation.expire_if_due(Utc::now().date_naive());
        if quotation.status != QuotationStatus::Approved {
            return Err(AppError::state(format!(
                "Only approved quotations can be converted, current: {}",
                quotation.status
            )));
        }

        let sale_request = CreateSaleRequest {
            customer_id: quotation.customer_id.clone(),
            issue_date: Utc::now().date_naive(),
            currency_code: quotation.currency_code.clone(),
            exchange_rate: Some(quotation.exchange_rate),
            include_tax: quotation.include_tax,
            shipping_amount: Decimal::ZERO,
            notes: quotation.notes.clone(),
            line_items: quotation
                .line_items
                .iter()
                .map(|item| LineItemInput {
                    id: None,
                    description: item.description.clone(),
                    product_id: item.product_id.clone(),
                    variant_id: item.variant_id.clone(),
                    warehouse_id: item.warehouse_id.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    discount_percentage: item.discount_percentage,
                    tax_percentage: item.tax_percentage,
                })
                .collect(),
        };

        let sale = self.sales.create_sale(sale_request, created_by).await?;
        let sale_id = sale
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Created sale has no ID"))?;

        quotation.mark_converted(sale_id.clone())?;
        self.repository
            .mark_converted_with_tx(&mut tx, id, &sale_id)
            .await?;
        tx.commit().await?;

        info!(quotation_id = id, sale_id = sale_id.as_str(), "Converted quotation to sale");
        Ok((quotation, sale_id))
    }

    pub async fn delete_quotation(&self, id: &str) -> Result<()> {
        self.repository.soft_delete(id).await?;
        info!(quotation_id = id, "Soft-deleted quotation");
        Ok(())
    }

    /// Apply a status transition with the row locked, so concurrent
    /// transitions serialize instead of both passing the check
    async fn transition(&self, id: &str, target: QuotationStatus) -> Result<Quotation> {
        let mut tx = self.pool.begin().await?;
        let mut quotation = self
            .repository
            .find_by_id_for_update_with_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Quotation with id '{}' not found", id)))?;

        quotation.expire_if_due(Utc::now().date_naive());
        quotation.update_status(target)?;
        self.repository
            .update_status_with_tx(&mut tx, id, target)
            .await?;
        tx.commit().await?;

        info!(quotation_id = id, status = %target, "Quotation status changed");
        Ok(quotation)
    }

    async fn load_currency(&self, code: &str) -> Result<Currency> {
        self.currencies
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Currency '{}' not found", code)))
    }

    fn build_line_items(inputs: Vec<LineItemInput>) -> Result<Vec<LineItem>> {
        if inputs.is_empty() {
            return Err(AppError::validation(
                "Quotation must have at least one line item",
            ));
        }
        inputs.into_iter().map(LineItemInput::into_line_item).collect()
    }

    fn rounded_totals(
        items: &[LineItem],
        include_tax: bool,
        currency: &Currency,
    ) -> Result<DocumentTotals> {
        // Quotations carry no shipping amount
        let totals = TotalsCalculator::compute_document_totals(items, include_tax, Decimal::ZERO)?;
        Ok(DocumentTotals {
            subtotal: currency.round(totals.subtotal),
            discount_amount: currency.round(totals.discount_amount),
            tax_amount: currency.round(totals.tax_amount),
            total: currency.round(totals.total),
        })
    }
}
