use sqlx::mysql::MySqlPool;
use sqlx::{MySql, Transaction};
use uuid::Uuid;

use crate::core::Result;
use crate::modules::pricing::models::LineItem;

const LINE_ITEM_COLUMNS: &str = "id, document_id, description, product_id, variant_id, \
     warehouse_id, quantity, unit_price, discount_percentage, tax_percentage, \
     subtotal, discount_amount, tax_amount, total";

/// Persistence for line items, shared by quotations and sales
///
/// Rows live in one `line_items` table keyed by the owning document's ID.
/// Documents replace their item set on edit, but items carrying their row
/// ID keep it so that external references (delivery guide items) stay
/// attached. Derived figures are recomputed before every insert, so stored
/// figures always match their inputs.
pub struct LineItemRepository {
    pool: MySqlPool,
}

impl LineItemRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert a document's items; items without a row ID get a fresh one
    pub async fn insert_all_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        document_id: &str,
        items: &mut [LineItem],
    ) -> Result<()> {
        for item in items.iter_mut() {
            item.recalculate()?;
            if item.id.is_none() {
                item.id = Some(Uuid::new_v4().to_string());
            }
            item.document_id = Some(document_id.to_string());

            sqlx::query(
                "INSERT INTO line_items \
                 (id, document_id, description, product_id, variant_id, warehouse_id, \
                  quantity, unit_price, discount_percentage, tax_percentage, \
                  subtotal, discount_amount, tax_amount, total) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&item.id)
            .bind(&item.document_id)
            .bind(&item.description)
            .bind(&item.product_id)
            .bind(&item.variant_id)
            .bind(&item.warehouse_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.discount_percentage)
            .bind(item.tax_percentage)
            .bind(item.subtotal)
            .bind(item.discount_amount)
            .bind(item.tax_amount)
            .bind(item.total)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn find_by_document(&self, document_id: &str) -> Result<Vec<LineItem>> {
        let sql = format!(
            "SELECT {} FROM line_items WHERE document_id = ? ORDER BY id",
            LINE_ITEM_COLUMNS
        );
        Ok(sqlx::query_as::<_, LineItem>(&sql)
            .bind(document_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn find_by_document_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        document_id: &str,
    ) -> Result<Vec<LineItem>> {
        let sql = format!(
            "SELECT {} FROM line_items WHERE document_id = ? ORDER BY id",
            LINE_ITEM_COLUMNS
        );
        Ok(sqlx::query_as::<_, LineItem>(&sql)
            .bind(document_id)
            .fetch_all(&mut **tx)
            .await?)
    }

    pub async fn delete_by_document_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        document_id: &str,
    ) -> Result<()> {
        sqlx::query("DELETE FROM line_items WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
