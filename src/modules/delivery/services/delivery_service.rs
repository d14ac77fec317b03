use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::mysql::MySqlPool;
use sqlx::{MySql, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::delivery::models::{
    max_allowed_on_edit, pending_quantity, DeliveryGuide, DeliveryGuideItem,
    DeliveryGuideRequest,
};
use crate::modules::delivery::repositories::DeliveryRepository;
use crate::modules::sales::models::Sale;
use crate::modules::sales::repositories::SaleRepository;
use crate::modules::sequence::{DocumentSeries, SequenceAllocator};

const CODE_RETRY_LIMIT: u32 = 3;

/// Service for delivery guide fulfillment tracking
///
/// Guides record partial deliveries against a sale's line items. The sale
/// row is locked for every mutation so concurrent guides cannot oversubscribe
/// a line item's pending quantity.
pub struct DeliveryService {
    pool: MySqlPool,
    repository: DeliveryRepository,
    sales: SaleRepository,
    allocator: Arc<dyn SequenceAllocator>,
}

impl DeliveryService {
    pub fn new(pool: MySqlPool, allocator: Arc<dyn SequenceAllocator>) -> Self {
        Self {
            repository: DeliveryRepository::new(pool.clone()),
            sales: SaleRepository::new(pool.clone()),
            pool,
            allocator,
        }
    }

    pub async fn create_guide(
        &self,
        sale_id: &str,
        request: DeliveryGuideRequest,
        created_by: Option<String>,
    ) -> Result<DeliveryGuide> {
        let items = Self::build_items(&request)?;

        let now = Utc::now();
        let mut guide = DeliveryGuide {
            id: Some(Uuid::new_v4().to_string()),
            code: None,
            sale_id: sale_id.to_string(),
            notes: request.notes,
            created_by,
            created_at: Some(now),
            updated_at: Some(now),
            deleted_at: None,
            items,
        };

        for attempt in 0..CODE_RETRY_LIMIT {
            let code = self
                .allocator
                .next_code(DocumentSeries::DeliveryGuide, now.date_naive())
                .await?;
            guide.code = Some(code.clone());

            let mut tx = self.pool.begin().await?;
            let sale = self.lock_sale(&mut tx, sale_id).await?;
            let delivered = self
                .repository
                .delivered_by_sale_item_with_tx(&mut tx, sale_id)
                .await?;
            Self::validate_quantities(&sale, &guide.items, &delivered, None)?;

            match self.repository.insert_with_tx(&mut tx, &mut guide).await {
                Ok(()) => {
                    tx.commit().await?;
                    info!(
                        guide_id = guide.id.as_deref().unwrap_or(""),
                        code = code.as_str(),
                        sale_id,
                        "Created delivery guide"
                    );
                    return Ok(guide);
                }
                Err(e) if e.is_retryable() && attempt + 1 < CODE_RETRY_LIMIT => {
                    warn!(code = code.as_str(), "Lost document code race, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::conflict(format!(
            "Could not create delivery guide after {} code allocation attempts",
            CODE_RETRY_LIMIT
        )))
    }

    /// Edit a guide; only the most recently created guide of a sale is
    /// editable
    pub async fn update_guide(
        &self,
        id: &str,
        request: DeliveryGuideRequest,
    ) -> Result<DeliveryGuide> {
        let items = Self::build_items(&request)?;

        let mut tx = self.pool.begin().await?;
        let mut guide = self
            .repository
            .find_by_id_for_update_with_tx(&mut tx, id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Delivery guide with id '{}' not found", id))
            })?;

        self.ensure_latest(&mut tx, &guide, "edited").await?;

        let sale = self.lock_sale(&mut tx, &guide.sale_id).await?;
        let delivered = self
            .repository
            .delivered_by_sale_item_with_tx(&mut tx, &guide.sale_id)
            .await?;
        // The guide's own prior allocation stays reusable on edit
        let own_allocation: HashMap<String, Decimal> = guide
            .items
            .iter()
            .map(|item| (item.sale_item_id.clone(), item.quantity))
            .collect();
        Self::validate_quantities(&sale, &items, &delivered, Some(&own_allocation))?;

        guide.notes = request.notes;
        guide.items = items;
        guide.updated_at = Some(Utc::now());
        self.repository.update_with_tx(&mut tx, &mut guide).await?;
        tx.commit().await?;

        info!(guide_id = id, "Updated delivery guide");
        Ok(guide)
    }

    /// Delete a guide, freeing its quantities; only the most recent guide
    /// of a sale may be deleted
    pub async fn delete_guide(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let guide = self
            .repository
            .find_by_id_for_update_with_tx(&mut tx, id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Delivery guide with id '{}' not found", id))
            })?;

        self.ensure_latest(&mut tx, &guide, "deleted").await?;
        self.repository.soft_delete_with_tx(&mut tx, id).await?;
        tx.commit().await?;

        info!(guide_id = id, sale_id = guide.sale_id.as_str(), "Deleted delivery guide");
        Ok(())
    }

    pub async fn get_guide(&self, id: &str) -> Result<DeliveryGuide> {
        self.repository.find_by_id(id).await?.ok_or_else(|| {
            AppError::not_found(format!("Delivery guide with id '{}' not found", id))
        })
    }

    pub async fn list_guides(&self, sale_id: &str) -> Result<Vec<DeliveryGuide>> {
        self.repository.list_by_sale(sale_id).await
    }

    /// Undelivered quantity per line item of a sale
    pub async fn pending_quantities(&self, sale_id: &str) -> Result<HashMap<String, Decimal>> {
        let mut tx = self.pool.begin().await?;
        let sale = self.lock_sale(&mut tx, sale_id).await?;
        let delivered = self
            .repository
            .delivered_by_sale_item_with_tx(&mut tx, sale_id)
            .await?;
        tx.commit().await?;

        Ok(sale
            .line_items
            .iter()
            .filter_map(|item| item.id.clone().map(|id| (id, item.quantity)))
            .map(|(id, ordered)| {
                let done = delivered.get(&id).copied().unwrap_or(Decimal::ZERO);
                (id, pending_quantity(ordered, done))
            })
            .collect())
    }

    async fn lock_sale(&self, tx: &mut Transaction<'_, MySql>, sale_id: &str) -> Result<Sale> {
        self.sales
            .find_by_id_for_update_with_tx(tx, sale_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Sale with id '{}' not found", sale_id)))
    }

    async fn ensure_latest(
        &self,
        tx: &mut Transaction<'_, MySql>,
        guide: &DeliveryGuide,
        action: &str,
    ) -> Result<()> {
        let latest = self
            .repository
            .latest_guide_id_with_tx(tx, &guide.sale_id)
            .await?;
        if latest.as_deref() != guide.id.as_deref() {
            return Err(AppError::state(format!(
                "Only the most recent delivery guide of a sale can be {}",
                action
            )));
        }
        Ok(())
    }

    fn build_items(request: &DeliveryGuideRequest) -> Result<Vec<DeliveryGuideItem>> {
        if request.items.is_empty() {
            return Err(AppError::validation(
                "Delivery guide must have at least one item",
            ));
        }
        request
            .items
            .iter()
            .map(|input| DeliveryGuideItem::new(input.sale_item_id.clone(), input.quantity))
            .collect()
    }

    /// Each delivered quantity must fit within the sale item's pending
    /// amount (plus the guide's own prior allocation when editing)
    fn validate_quantities(
        sale: &Sale,
        items: &[DeliveryGuideItem],
        delivered: &HashMap<String, Decimal>,
        own_allocation: Option<&HashMap<String, Decimal>>,
    ) -> Result<()> {
        let ordered: HashMap<&str, Decimal> = sale
            .line_items
            .iter()
            .filter_map(|item| item.id.as_deref().map(|id| (id, item.quantity)))
            .collect();

        let mut requested: HashMap<&str, Decimal> = HashMap::new();
        for item in items {
            let entry = requested
                .entry(item.sale_item_id.as_str())
                .or_insert(Decimal::ZERO);
            *entry += item.quantity;
        }

        for (sale_item_id, quantity) in requested {
            let ordered_quantity = ordered.get(sale_item_id).copied().ok_or_else(|| {
                AppError::validation(format!(
                    "Sale item '{}' does not belong to sale '{}'",
                    sale_item_id,
                    sale.code.as_deref().unwrap_or("")
                ))
            })?;

            let done = delivered.get(sale_item_id).copied().unwrap_or(Decimal::ZERO);
            let pending = pending_quantity(ordered_quantity, done);
            let allowed = match own_allocation.and_then(|own| own.get(sale_item_id)) {
                Some(own) => max_allowed_on_edit(pending, *own),
                None => pending,
            };

            if quantity > allowed {
                return Err(AppError::validation(format!(
                    "Cannot deliver {} of sale item '{}': only {} pending",
                    quantity, sale_item_id, allowed
                )));
            }
        }
        Ok(())
    }
}
