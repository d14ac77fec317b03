use rust_decimal::Decimal;
use sqlx::mysql::MySqlPool;
use sqlx::{MySql, Transaction};
use tracing::{info, warn};

use crate::core::{AppError, Result};
use crate::modules::inventory::models::{
    AdjustmentInput, AdjustmentType, InventoryAdjustment, InventoryLevel,
};
use crate::modules::inventory::repositories::InventoryRepository;

/// Service for the inventory adjustment ledger
///
/// Every stock mutation runs through here: explicit adjustments, manual
/// quantity edits (which produce a correction entry for the difference) and
/// sale-driven decrements, so the ledger is the one audit trail for all
/// stock movement.
pub struct AdjustmentService {
    pool: MySqlPool,
    repository: InventoryRepository,
}

impl AdjustmentService {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            repository: InventoryRepository::new(pool.clone()),
            pool,
        }
    }

    /// Apply a typed adjustment in its own transaction
    pub async fn apply_adjustment(&self, input: AdjustmentInput) -> Result<InventoryAdjustment> {
        let mut tx = self.pool.begin().await?;
        let adjustment = self.apply_with_tx(&mut tx, input).await?;
        tx.commit().await?;
        Ok(adjustment)
    }

    /// Apply a typed adjustment inside a caller-owned transaction
    ///
    /// Locks the level row, rejects negative deltas the balance cannot
    /// absorb, then writes the ledger entry and the new balance together.
    pub async fn apply_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        input: AdjustmentInput,
    ) -> Result<InventoryAdjustment> {
        let adjustment = InventoryAdjustment::new(
            input.inventory_id.clone(),
            input.quantity,
            input.adjustment_type,
            input.supplier_id,
            input.reason,
            input.created_by,
        )?;

        let level = self
            .repository
            .find_level_for_update_with_tx(tx, &input.inventory_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Inventory level '{}' not found", input.inventory_id))
            })?;

        let next_quantity = level.checked_apply(adjustment.quantity)?;

        self.repository
            .update_level_quantity_with_tx(tx, &level.id, next_quantity)
            .await?;
        self.repository
            .insert_adjustment_with_tx(tx, &adjustment)
            .await?;

        info!(
            inventory_id = level.id.as_str(),
            adjustment_type = adjustment.adjustment_type.as_str(),
            delta = %adjustment.quantity,
            balance = %next_quantity,
            "Applied inventory adjustment"
        );

        Ok(adjustment)
    }

    /// Reverse (delete) an adjustment by applying its exact inverse delta
    ///
    /// The inverse is applied unchecked: if later movements already consumed
    /// the stock an addition brought in, the balance can go negative. That
    /// is the accepted trade-off of an audit-oriented ledger; it is logged
    /// rather than rejected.
    pub async fn reverse_adjustment(&self, adjustment_id: &str) -> Result<()> {
        let adjustment = self
            .repository
            .find_adjustment(adjustment_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Adjustment '{}' not found", adjustment_id))
            })?;

        let mut tx = self.pool.begin().await?;

        let level = self
            .repository
            .find_level_for_update_with_tx(&mut tx, &adjustment.inventory_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Inventory level '{}' not found",
                    adjustment.inventory_id
                ))
            })?;

        let next_quantity = level.quantity - adjustment.quantity;
        if next_quantity < Decimal::ZERO {
            warn!(
                inventory_id = level.id.as_str(),
                adjustment_id = adjustment_id,
                balance = %next_quantity,
                "Reversal drove inventory balance negative"
            );
        }

        self.repository
            .update_level_quantity_with_tx(&mut tx, &level.id, next_quantity)
            .await?;
        self.repository
            .delete_adjustment_with_tx(&mut tx, adjustment_id)
            .await?;

        tx.commit().await?;

        info!(
            inventory_id = level.id.as_str(),
            adjustment_id = adjustment_id,
            "Reversed inventory adjustment"
        );
        Ok(())
    }

    /// Manual quantity edit with an auto-adjustment audit entry
    ///
    /// The level is set to `new_quantity` and a correction entry records the
    /// difference, so manual edits stay visible in the ledger.
    pub async fn set_quantity(
        &self,
        inventory_id: &str,
        new_quantity: Decimal,
        created_by: Option<String>,
    ) -> Result<Option<InventoryAdjustment>> {
        if new_quantity < Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Inventory quantity must be non-negative, got {}",
                new_quantity
            )));
        }

        let mut tx = self.pool.begin().await?;

        let level = self
            .repository
            .find_level_for_update_with_tx(&mut tx, inventory_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Inventory level '{}' not found", inventory_id))
            })?;

        let delta = new_quantity - level.quantity;
        if delta.is_zero() {
            return Ok(None);
        }

        let adjustment = InventoryAdjustment::new(
            level.id.clone(),
            delta,
            AdjustmentType::Correction,
            None,
            Some("manual quantity edit".to_string()),
            created_by,
        )?;

        self.repository
            .update_level_quantity_with_tx(&mut tx, &level.id, new_quantity)
            .await?;
        self.repository
            .insert_adjustment_with_tx(&mut tx, &adjustment)
            .await?;

        tx.commit().await?;
        Ok(Some(adjustment))
    }

    /// Decrement stock for one sale line inside the sale's transaction
    ///
    /// Routed through the ledger as a subtraction entry referencing the sale
    /// code, so sale-driven draw-down shares the audit trail with manual
    /// adjustments. Items without a matching level are skipped (stock is not
    /// tracked for every product/warehouse pair).
    pub async fn record_sale_decrement_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        product_id: &str,
        variant_id: Option<&str>,
        warehouse_id: &str,
        quantity: Decimal,
        sale_code: &str,
        created_by: Option<String>,
    ) -> Result<Option<InventoryAdjustment>> {
        let Some(level) = self
            .repository
            .find_level_by_key_for_update_with_tx(tx, product_id, variant_id, warehouse_id)
            .await?
        else {
            return Ok(None);
        };

        let adjustment = InventoryAdjustment::new(
            level.id.clone(),
            -quantity,
            AdjustmentType::Subtraction,
            None,
            Some(format!("sale {}", sale_code)),
            created_by,
        )?;

        let next_quantity = level.checked_apply(adjustment.quantity)?;

        self.repository
            .update_level_quantity_with_tx(tx, &level.id, next_quantity)
            .await?;
        self.repository
            .insert_adjustment_with_tx(tx, &adjustment)
            .await?;

        Ok(Some(adjustment))
    }

    pub async fn get_level(&self, inventory_id: &str) -> Result<InventoryLevel> {
        self.repository
            .find_level_by_id(inventory_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Inventory level '{}' not found", inventory_id))
            })
    }

    pub async fn list_adjustments(&self, inventory_id: &str) -> Result<Vec<InventoryAdjustment>> {
        self.repository.list_adjustments(inventory_id).await
    }
}
