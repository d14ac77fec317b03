use sqlx::mysql::MySqlPool;
use sqlx::{MySql, Transaction};

use crate::core::{AppError, Result};
use crate::modules::pricing::repositories::LineItemRepository;
use crate::modules::quotations::models::{Quotation, QuotationStatus};

const QUOTATION_COLUMNS: &str = "id, code, customer_id, issue_date, expiry_date, currency_code, \
     exchange_rate, include_tax, subtotal, discount_amount, tax_amount, total, status, \
     converted_to_sale_id, notes, created_by, created_at, updated_at, deleted_at";

/// MySQL access for quotations
pub struct QuotationRepository {
    pool: MySqlPool,
    line_items: LineItemRepository,
}

impl QuotationRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            line_items: LineItemRepository::new(pool.clone()),
            pool,
        }
    }

    /// Insert the quotation header and its line items
    ///
    /// A unique violation on the code column is a lost allocation race,
    /// surfaced as a retryable conflict.
    pub async fn insert_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        quotation: &mut Quotation,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO quotations \
             (id, code, customer_id, issue_date, expiry_date, currency_code, exchange_rate, \
              include_tax, subtotal, discount_amount, tax_amount, total, status, \
              converted_to_sale_id, notes, created_by, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&quotation.id)
        .bind(&quotation.code)
        .bind(&quotation.customer_id)
        .bind(quotation.issue_date)
        .bind(quotation.expiry_date)
        .bind(&quotation.currency_code)
        .bind(quotation.exchange_rate)
        .bind(quotation.include_tax)
        .bind(quotation.subtotal)
        .bind(quotation.discount_amount)
        .bind(quotation.tax_amount)
        .bind(quotation.total)
        .bind(quotation.status.as_str())
        .bind(&quotation.converted_to_sale_id)
        .bind(&quotation.notes)
        .bind(&quotation.created_by)
        .bind(quotation.created_at)
        .bind(quotation.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::conflict(format!(
                    "Quotation code '{}' already exists",
                    quotation.code.as_deref().unwrap_or("")
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        let id = quotation.id.clone().unwrap_or_default();
        self.line_items
            .insert_all_with_tx(tx, &id, &mut quotation.line_items)
            .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Quotation>> {
        let sql = format!(
            "SELECT {} FROM quotations WHERE id = ? AND deleted_at IS NULL",
            QUOTATION_COLUMNS
        );
        let quotation: Option<Quotation> =
            sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;

        let Some(mut quotation) = quotation else {
            return Ok(None);
        };
        quotation.line_items = self.line_items.find_by_document(id).await?;
        Ok(Some(quotation))
    }

    pub async fn find_by_id_for_update_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<Option<Quotation>> {
        let sql = format!(
            "SELECT {} FROM quotations WHERE id = ? AND deleted_at IS NULL FOR UPDATE",
            QUOTATION_COLUMNS
        );
        let quotation: Option<Quotation> =
            sqlx::query_as(&sql).bind(id).fetch_optional(&mut **tx).await?;

        let Some(mut quotation) = quotation else {
            return Ok(None);
        };
        quotation.line_items = self.line_items.find_by_document_with_tx(tx, id).await?;
        Ok(Some(quotation))
    }

    /// Update the header after an edit; the item set is replaced
    pub async fn update_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        quotation: &mut Quotation,
    ) -> Result<()> {
        let id = quotation
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Cannot update a quotation without an ID"))?;

        sqlx::query(
            "UPDATE quotations SET customer_id = ?, issue_date = ?, expiry_date = ?, \
             currency_code = ?, exchange_rate = ?, include_tax = ?, subtotal = ?, \
             discount_amount = ?, tax_amount = ?, total = ?, status = ?, \
             converted_to_sale_id = ?, notes = ?, updated_at = NOW() \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(&quotation.customer_id)
        .bind(quotation.issue_date)
        .bind(quotation.expiry_date)
        .bind(&quotation.currency_code)
        .bind(quotation.exchange_rate)
        .bind(quotation.include_tax)
        .bind(quotation.subtotal)
        .bind(quotation.discount_amount)
        .bind(quotation.tax_amount)
        .bind(quotation.total)
        .bind(quotation.status.as_str())
        .bind(&quotation.converted_to_sale_id)
        .bind(&quotation.notes)
        .bind(&id)
        .execute(&mut **tx)
        .await?;

        self.line_items.delete_by_document_with_tx(tx, &id).await?;
        self.line_items
            .insert_all_with_tx(tx, &id, &mut quotation.line_items)
            .await?;
        Ok(())
    }

    pub async fn update_status(&self, id: &str, status: QuotationStatus) -> Result<()> {
        let result = sqlx::query(
            "UPDATE quotations SET status = ?, updated_at = NOW() \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Quotation with id '{}' not found",
                id
            )));
        }
        Ok(())
    }

    pub async fn update_status_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
        status: QuotationStatus,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE quotations SET status = ?, updated_at = NOW() \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(status.as_str())
        .bind(id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Quotation with id '{}' not found",
                id
            )));
        }
        Ok(())
    }

    /// Flip an approved quotation to converted, recording the sale
    ///
    /// Conditional on the current status so the write cannot apply twice;
    /// zero rows affected means the quotation is no longer approved.
    pub async fn mark_converted_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
        sale_id: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE quotations SET status = ?, converted_to_sale_id = ?, updated_at = NOW() \
             WHERE id = ? AND status = ? AND deleted_at IS NULL",
        )
        .bind(QuotationStatus::Converted.as_str())
        .bind(sale_id)
        .bind(id)
        .bind(QuotationStatus::Approved.as_str())
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::state(format!(
                "Quotation '{}' is no longer approved, conversion aborted",
                id
            )));
        }
        Ok(())
    }

    pub async fn soft_delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE quotations SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Quotation with id '{}' not found",
                id
            )));
        }
        Ok(())
    }

    /// List headers without items, newest first
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Quotation>> {
        let sql = format!(
            "SELECT {} FROM quotations WHERE deleted_at IS NULL \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
            QUOTATION_COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(limit.min(100))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }
}
