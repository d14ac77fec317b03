use sqlx::mysql::MySqlPool;
use tracing::info;

use crate::core::{AppError, Currency, Result};
use crate::modules::currencies::repositories::CurrencyRepository;

/// Service for currency lookup and the default-currency singleton
pub struct CurrencyService {
    pool: MySqlPool,
    repository: CurrencyRepository,
}

impl CurrencyService {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            repository: CurrencyRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn get(&self, code: &str) -> Result<Currency> {
        self.repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Currency '{}' not found", code)))
    }

    pub async fn default_currency(&self) -> Result<Currency> {
        self.repository
            .find_default()
            .await?
            .ok_or_else(|| AppError::state("No default currency is configured"))
    }

    pub async fn list(&self) -> Result<Vec<Currency>> {
        self.repository.list().await
    }

    pub async fn save(&self, currency: &Currency) -> Result<()> {
        currency.validate()?;
        self.repository.upsert(currency).await
    }

    /// Atomically make `code` the single default currency
    pub async fn set_default(&self, code: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        self.repository.set_default_with_tx(&mut tx, code).await?;
        tx.commit().await?;

        info!(currency = code, "Changed default currency");
        Ok(())
    }

    /// Remove a currency; the active default cannot be removed
    pub async fn remove(&self, code: &str) -> Result<()> {
        self.repository.delete(code).await
    }
}
