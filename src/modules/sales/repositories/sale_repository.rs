use sqlx::mysql::MySqlPool;
use sqlx::{MySql, Transaction};

use crate::core::{AppError, Result};
use crate::modules::pricing::repositories::LineItemRepository;
use crate::modules::sales::models::{Payment, Sale};

const SALE_COLUMNS: &str = "id, code, customer_id, issue_date, currency_code, exchange_rate, \
     include_tax, shipping_amount, subtotal, discount_amount, tax_amount, total, \
     amount_paid, amount_due, status, notes, created_by, created_at, updated_at, deleted_at";

const PAYMENT_COLUMNS: &str =
    "id, sale_id, amount, payment_method, payment_date, created_by, created_at";

/// MySQL access for sales and their payments
pub struct SaleRepository {
    pool: MySqlPool,
    line_items: LineItemRepository,
}

impl SaleRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            line_items: LineItemRepository::new(pool.clone()),
            pool,
        }
    }

    /// Insert the sale header and its line items
    ///
    /// A unique violation on the code column means another transaction won
    /// the allocation race; surfaced as a retryable conflict.
    pub async fn insert_with_tx(&self, tx: &mut Transaction<'_, MySql>, sale: &mut Sale) -> Result<()> {
        sqlx::query(
            "INSERT INTO sales \
             (id, code, customer_id, issue_date, currency_code, exchange_rate, include_tax, \
              shipping_amount, subtotal, discount_amount, tax_amount, total, amount_paid, \
              amount_due, status, notes, created_by, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&sale.id)
        .bind(&sale.code)
        .bind(&sale.customer_id)
        .bind(sale.issue_date)
        .bind(&sale.currency_code)
        .bind(sale.exchange_rate)
        .bind(sale.include_tax)
        .bind(sale.shipping_amount)
        .bind(sale.subtotal)
        .bind(sale.discount_amount)
        .bind(sale.tax_amount)
        .bind(sale.total)
        .bind(sale.amount_paid)
        .bind(sale.amount_due)
        .bind(sale.status.as_str())
        .bind(&sale.notes)
        .bind(&sale.created_by)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::conflict(format!(
                    "Sale code '{}' already exists",
                    sale.code.as_deref().unwrap_or("")
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        let id = sale.id.clone().unwrap_or_default();
        self.line_items
            .insert_all_with_tx(tx, &id, &mut sale.line_items)
            .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE id = ? AND deleted_at IS NULL",
            SALE_COLUMNS
        );
        let sale: Option<Sale> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;

        let Some(mut sale) = sale else {
            return Ok(None);
        };
        sale.line_items = self.line_items.find_by_document(id).await?;
        Ok(Some(sale))
    }

    /// Lock and load a sale for a read-modify-write (payment registration,
    /// edit); line items come along for recomputation
    pub async fn find_by_id_for_update_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<Option<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE id = ? AND deleted_at IS NULL FOR UPDATE",
            SALE_COLUMNS
        );
        let sale: Option<Sale> = sqlx::query_as(&sql).bind(id).fetch_optional(&mut **tx).await?;

        let Some(mut sale) = sale else {
            return Ok(None);
        };
        sale.line_items = self.line_items.find_by_document_with_tx(tx, id).await?;
        Ok(Some(sale))
    }

    /// Update the sale header after an edit; the item set is replaced
    pub async fn update_with_tx(&self, tx: &mut Transaction<'_, MySql>, sale: &mut Sale) -> Result<()> {
        let id = sale
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Cannot update a sale without an ID"))?;

        sqlx::query(
            "UPDATE sales SET customer_id = ?, issue_date = ?, currency_code = ?, \
             exchange_rate = ?, include_tax = ?, shipping_amount = ?, subtotal = ?, \
             discount_amount = ?, tax_amount = ?, total = ?, amount_paid = ?, amount_due = ?, \
             status = ?, notes = ?, updated_at = NOW() \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(&sale.customer_id)
        .bind(sale.issue_date)
        .bind(&sale.currency_code)
        .bind(sale.exchange_rate)
        .bind(sale.include_tax)
        .bind(sale.shipping_amount)
        .bind(sale.subtotal)
        .bind(sale.discount_amount)
        .bind(sale.tax_amount)
        .bind(sale.total)
        .bind(sale.amount_paid)
        .bind(sale.amount_due)
        .bind(sale.status.as_str())
        .bind(&sale.notes)
        .bind(&id)
        .execute(&mut **tx)
        .await?;

        self.line_items.delete_by_document_with_tx(tx, &id).await?;
        self.line_items
            .insert_all_with_tx(tx, &id, &mut sale.line_items)
            .await?;
        Ok(())
    }

    /// Persist payment-derived fields after a registration or override
    pub async fn update_payment_fields_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        sale: &Sale,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE sales SET amount_paid = ?, amount_due = ?, status = ?, updated_at = NOW() \
             WHERE id = ?",
        )
        .bind(sale.amount_paid)
        .bind(sale.amount_due)
        .bind(sale.status.as_str())
        .bind(&sale.id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Soft delete; the audit trail (and any decremented stock) stays
    pub async fn soft_delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE sales SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Sale with id '{}' not found", id)));
        }
        Ok(())
    }

    /// List headers without items, newest first
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE deleted_at IS NULL \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
            SALE_COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(limit.min(100))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn insert_payment_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        payment: &Payment,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO payments \
             (id, sale_id, amount, payment_method, payment_date, created_by, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.amount)
        .bind(&payment.payment_method)
        .bind(payment.payment_date)
        .bind(&payment.created_by)
        .bind(payment.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn list_payments(&self, sale_id: &str) -> Result<Vec<Payment>> {
        let sql = format!(
            "SELECT {} FROM payments WHERE sale_id = ? ORDER BY created_at",
            PAYMENT_COLUMNS
        );
        Ok(sqlx::query_as(&sql).bind(sale_id).fetch_all(&self.pool).await?)
    }
}
