use sqlx::mysql::MySqlPool;
use sqlx::{MySql, Transaction};

use crate::core::{AppError, Currency, Result};

const CURRENCY_COLUMNS: &str = "code, symbol, decimal_places, decimal_separator, \
     thousand_separator, exchange_rate, is_default";

/// MySQL access for currency rows
pub struct CurrencyRepository {
    pool: MySqlPool,
}

impl CurrencyRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Option<Currency>> {
        let sql = format!("SELECT {} FROM currencies WHERE code = ?", CURRENCY_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(code).fetch_optional(&self.pool).await?)
    }

    pub async fn find_default(&self) -> Result<Option<Currency>> {
        let sql = format!(
            "SELECT {} FROM currencies WHERE is_default = 1",
            CURRENCY_COLUMNS
        );
        Ok(sqlx::query_as(&sql).fetch_optional(&self.pool).await?)
    }

    pub async fn list(&self) -> Result<Vec<Currency>> {
        let sql = format!("SELECT {} FROM currencies ORDER BY code", CURRENCY_COLUMNS);
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn upsert(&self, currency: &Currency) -> Result<()> {
        sqlx::query(
            "INSERT INTO currencies \
             (code, symbol, decimal_places, decimal_separator, thousand_separator, \
              exchange_rate, is_default) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE symbol = VALUES(symbol), \
               decimal_places = VALUES(decimal_places), \
               decimal_separator = VALUES(decimal_separator), \
               thousand_separator = VALUES(thousand_separator), \
               exchange_rate = VALUES(exchange_rate)",
        )
        .bind(&currency.code)
        .bind(&currency.symbol)
        .bind(currency.decimal_places)
        .bind(&currency.decimal_separator)
        .bind(&currency.thousand_separator)
        .bind(currency.exchange_rate)
        .bind(currency.is_default)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Clear every default flag then set the target, inside one transaction
    ///
    /// Enforces the at-most-one-default invariant transactionally instead
    /// of relying on callers sequencing two updates.
    pub async fn set_default_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        code: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE currencies SET is_default = 0 WHERE is_default = 1")
            .execute(&mut **tx)
            .await?;

        let result = sqlx::query("UPDATE currencies SET is_default = 1 WHERE code = ?")
            .bind(code)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Currency '{}' not found", code)));
        }
        Ok(())
    }

    /// Remove a currency; guarded in the statement itself so a concurrent
    /// `set_default` cannot slip the active default past a prior check
    pub async fn delete(&self, code: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM currencies WHERE code = ? AND is_default = 0")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            if let Some(currency) = self.find_by_code(code).await? {
                currency.guard_removal()?;
            }
            return Err(AppError::not_found(format!("Currency '{}' not found", code)));
        }
        Ok(())
    }
}
