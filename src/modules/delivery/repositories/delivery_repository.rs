use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::mysql::MySqlPool;
use sqlx::{FromRow, MySql, Transaction};
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::delivery::models::{DeliveryGuide, DeliveryGuideItem};

const GUIDE_COLUMNS: &str =
    "id, code, sale_id, notes, created_by, created_at, updated_at, deleted_at";

const ITEM_COLUMNS: &str = "id, guide_id, sale_item_id, quantity";

#[derive(FromRow)]
struct DeliveredSumRow {
    sale_item_id: String,
    delivered: Decimal,
}

/// MySQL access for delivery guides and their items
pub struct DeliveryRepository {
    pool: MySqlPool,
}

impl DeliveryRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert the guide header and its items
    ///
    /// A unique violation on the code column is a lost allocation race,
    /// surfaced as a retryable conflict.
    pub async fn insert_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        guide: &mut DeliveryGuide,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO delivery_guides \
             (id, code, sale_id, notes, created_by, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&guide.id)
        .bind(&guide.code)
        .bind(&guide.sale_id)
        .bind(&guide.notes)
        .bind(&guide.created_by)
        .bind(guide.created_at)
        .bind(guide.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::conflict(format!(
                    "Delivery guide code '{}' already exists",
                    guide.code.as_deref().unwrap_or("")
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        let guide_id = guide.id.clone().unwrap_or_default();
        self.insert_items_with_tx(tx, &guide_id, &mut guide.items)
            .await
    }

    async fn insert_items_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        guide_id: &str,
        items: &mut [DeliveryGuideItem],
    ) -> Result<()> {
        for item in items.iter_mut() {
            item.id = Some(Uuid::new_v4().to_string());
            item.guide_id = Some(guide_id.to_string());
            sqlx::query(
                "INSERT INTO delivery_guide_items (id, guide_id, sale_item_id, quantity) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(&item.id)
            .bind(&item.guide_id)
            .bind(&item.sale_item_id)
            .bind(item.quantity)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<DeliveryGuide>> {
        let sql = format!(
            "SELECT {} FROM delivery_guides WHERE id = ? AND deleted_at IS NULL",
            GUIDE_COLUMNS
        );
        let guide: Option<DeliveryGuide> =
            sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;

        let Some(mut guide) = guide else {
            return Ok(None);
        };
        let items_sql = format!(
            "SELECT {} FROM delivery_guide_items WHERE guide_id = ? ORDER BY id",
            ITEM_COLUMNS
        );
        guide.items = sqlx::query_as(&items_sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(Some(guide))
    }

    pub async fn find_by_id_for_update_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<Option<DeliveryGuide>> {
        let sql = format!(
            "SELECT {} FROM delivery_guides WHERE id = ? AND deleted_at IS NULL FOR UPDATE",
            GUIDE_COLUMNS
        );
        let guide: Option<DeliveryGuide> =
            sqlx::query_as(&sql).bind(id).fetch_optional(&mut **tx).await?;

        let Some(mut guide) = guide else {
            return Ok(None);
        };
        let items_sql = format!(
            "SELECT {} FROM delivery_guide_items WHERE guide_id = ? ORDER BY id",
            ITEM_COLUMNS
        );
        guide.items = sqlx::query_as(&items_sql)
            .bind(id)
            .fetch_all(&mut **tx)
            .await?;
        Ok(Some(guide))
    }

    /// Replace a guide's notes and item set after an edit
    pub async fn update_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        guide: &mut DeliveryGuide,
    ) -> Result<()> {
        let id = guide
            .id
            .clone()
            .ok_or_else(|| AppError::internal("Cannot update a delivery guide without an ID"))?;

        sqlx::query(
            "UPDATE delivery_guides SET notes = ?, updated_at = NOW() \
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(&guide.notes)
        .bind(&id)
        .execute(&mut **tx)
        .await?;

        sqlx::query("DELETE FROM delivery_guide_items WHERE guide_id = ?")
            .bind(&id)
            .execute(&mut **tx)
            .await?;
        self.insert_items_with_tx(tx, &id, &mut guide.items).await
    }

    pub async fn soft_delete_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE delivery_guides SET deleted_at = NOW() WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Delivery guide with id '{}' not found",
                id
            )));
        }
        Ok(())
    }

    /// ID of the most recently created live guide for a sale
    pub async fn latest_guide_id_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        sale_id: &str,
    ) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT id FROM delivery_guides WHERE sale_id = ? AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(sale_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Delivered quantity per sale item across all live guides of a sale
    pub async fn delivered_by_sale_item_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        sale_id: &str,
    ) -> Result<HashMap<String, Decimal>> {
        let rows: Vec<DeliveredSumRow> = sqlx::query_as(
            "SELECT i.sale_item_id AS sale_item_id, \
                    CAST(SUM(i.quantity) AS DECIMAL(20, 6)) AS delivered \
             FROM delivery_guide_items i \
             JOIN delivery_guides g ON g.id = i.guide_id \
             WHERE g.sale_id = ? AND g.deleted_at IS NULL \
             GROUP BY i.sale_item_id",
        )
        .bind(sale_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.sale_item_id, row.delivered))
            .collect())
    }

    /// List a sale's guides with their items, oldest first
    pub async fn list_by_sale(&self, sale_id: &str) -> Result<Vec<DeliveryGuide>> {
        let sql = format!(
            "SELECT {} FROM delivery_guides WHERE sale_id = ? AND deleted_at IS NULL \
             ORDER BY created_at ASC, id ASC",
            GUIDE_COLUMNS
        );
        let mut guides: Vec<DeliveryGuide> = sqlx::query_as(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        let items_sql = format!(
            "SELECT {} FROM delivery_guide_items WHERE guide_id = ? ORDER BY id",
            ITEM_COLUMNS
        );
        for guide in guides.iter_mut() {
            if let Some(id) = guide.id.as_deref() {
                guide.items = sqlx::query_as(&items_sql)
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await?;
            }
        }
        Ok(guides)
    }
}
