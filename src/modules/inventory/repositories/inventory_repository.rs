use rust_decimal::Decimal;
use sqlx::mysql::MySqlPool;
use sqlx::{MySql, Transaction};

use crate::core::Result;
use crate::modules::inventory::models::{InventoryAdjustment, InventoryLevel};

/// MySQL access for inventory levels and the adjustment ledger
///
/// Every read-modify-write against a level goes through the `FOR UPDATE`
/// variants so concurrent sale creation, manual adjustments and reversals
/// serialize on the level row.
pub struct InventoryRepository {
    pool: MySqlPool,
}

const LEVEL_COLUMNS: &str =
    "id, product_id, variant_id, warehouse_id, batch, quantity, created_at, updated_at";

const ADJUSTMENT_COLUMNS: &str =
    "id, inventory_id, quantity, adjustment_type, supplier_id, reason, created_by, created_at";

impl InventoryRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn find_level_by_id(&self, id: &str) -> Result<Option<InventoryLevel>> {
        let sql = format!("SELECT {} FROM inventory_levels WHERE id = ?", LEVEL_COLUMNS);
        Ok(sqlx::query_as::<_, InventoryLevel>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Lock and load a level row for a read-modify-write
    pub async fn find_level_for_update_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<Option<InventoryLevel>> {
        let sql = format!(
            "SELECT {} FROM inventory_levels WHERE id = ? FOR UPDATE",
            LEVEL_COLUMNS
        );
        Ok(sqlx::query_as::<_, InventoryLevel>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?)
    }

    /// Lock and load the level matching a sale item's stock key
    ///
    /// `<=>` keeps NULL variants matchable.
    pub async fn find_level_by_key_for_update_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        product_id: &str,
        variant_id: Option<&str>,
        warehouse_id: &str,
    ) -> Result<Option<InventoryLevel>> {
        let sql = format!(
            "SELECT {} FROM inventory_levels \
             WHERE product_id = ? AND variant_id <=> ? AND warehouse_id = ? \
             FOR UPDATE",
            LEVEL_COLUMNS
        );
        Ok(sqlx::query_as::<_, InventoryLevel>(&sql)
            .bind(product_id)
            .bind(variant_id)
            .bind(warehouse_id)
            .fetch_optional(&mut **tx)
            .await?)
    }

    pub async fn update_level_quantity_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
        quantity: Decimal,
    ) -> Result<()> {
        sqlx::query("UPDATE inventory_levels SET quantity = ?, updated_at = NOW() WHERE id = ?")
            .bind(quantity)
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn insert_adjustment_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        adjustment: &InventoryAdjustment,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO inventory_adjustments \
             (id, inventory_id, quantity, adjustment_type, supplier_id, reason, created_by, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&adjustment.id)
        .bind(&adjustment.inventory_id)
        .bind(adjustment.quantity)
        .bind(adjustment.adjustment_type.as_str())
        .bind(&adjustment.supplier_id)
        .bind(&adjustment.reason)
        .bind(&adjustment.created_by)
        .bind(adjustment.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn find_adjustment(&self, id: &str) -> Result<Option<InventoryAdjustment>> {
        let sql = format!(
            "SELECT {} FROM inventory_adjustments WHERE id = ?",
            ADJUSTMENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, InventoryAdjustment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn delete_adjustment_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<()> {
        sqlx::query("DELETE FROM inventory_adjustments WHERE id = ?")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn list_adjustments(&self, inventory_id: &str) -> Result<Vec<InventoryAdjustment>> {
        let sql = format!(
            "SELECT {} FROM inventory_adjustments WHERE inventory_id = ? ORDER BY created_at",
            ADJUSTMENT_COLUMNS
        );
        Ok(sqlx::query_as::<_, InventoryAdjustment>(&sql)
            .bind(inventory_id)
            .fetch_all(&self.pool)
            .await?)
    }
}
