use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::mysql::MySqlPool;
use sqlx::{Executor, MySql};
use tracing::{debug, warn};

use crate::core::{AppError, Result};
use crate::modules::sequence::models::DocumentSeries;

/// Upper bound on existence probes before giving up
///
/// Only reachable when the counter state is badly out of sync with the
/// document tables; failing loudly beats spinning.
const MAX_PROBES: u32 = 1000;

/// Strategy seam for sequential document code allocation
///
/// Two implementations ship: [`ScanAllocator`], the naive max-scan with an
/// existence-check loop, and [`LockedAllocator`], the production default
/// backed by a row-locked counter table. Creation flows additionally retry
/// on duplicate-code conflicts, with a UNIQUE constraint on every code
/// column as the final backstop.
#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Produce the next code for a series in the period containing `date`
    async fn next_code(&self, series: DocumentSeries, date: NaiveDate) -> Result<String>;
}

async fn code_exists<'e, E>(executor: E, series: DocumentSeries, code: &str) -> Result<bool>
where
    E: Executor<'e, Database = MySql>,
{
    // Table names come from a closed enum, never from input
    let sql = format!("SELECT COUNT(*) FROM {} WHERE code = ?", series.table());
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(code)
        .fetch_one(executor)
        .await?;
    Ok(count > 0)
}

/// Naive read-then-check allocator
///
/// Scans for the highest existing suffix under the period prefix, proposes
/// max + 1, then increments past any code that already exists. Two callers
/// can read the same max before either commits, so this strategy alone is
/// race-prone; it survives as the fallback semantics the locked allocator
/// also carries, and as the low-dependency choice for tooling.
pub struct ScanAllocator {
    pool: MySqlPool,
}

impl ScanAllocator {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceAllocator for ScanAllocator {
    async fn next_code(&self, series: DocumentSeries, date: NaiveDate) -> Result<String> {
        let prefix = series.code_prefix(date);

        let sql = format!(
            "SELECT code FROM {} WHERE code LIKE ? \
             ORDER BY CAST(SUBSTRING(code, ?) AS UNSIGNED) DESC LIMIT 1",
            series.table()
        );
        let max_code: Option<String> = sqlx::query_scalar(&sql)
            .bind(format!("{}%", prefix))
            .bind((prefix.len() + 1) as i64)
            .fetch_optional(&self.pool)
            .await?;

        let mut value = max_code
            .as_deref()
            .and_then(|code| series.parse_suffix(code, date))
            .map_or(1, |max| max + 1);

        let mut probes = 0;
        loop {
            let code = series.format_code(date, value);
            if !code_exists(&self.pool, series, &code).await? {
                debug!(series = %series, code = code.as_str(), "Allocated document code");
                return Ok(code);
            }
            probes += 1;
            if probes >= MAX_PROBES {
                return Err(AppError::conflict(format!(
                    "Could not allocate a {} code after {} probes",
                    series, MAX_PROBES
                )));
            }
            value += 1;
        }
    }
}

/// Row-locked counter allocator (production default)
///
/// Holds `SELECT ... FOR UPDATE` on the per-(series, period) counter row for
/// the duration of the increment, so concurrent creations serialize instead
/// of reading the same max. The existence-check loop is kept as defense in
/// depth for counters that lag behind manually inserted codes. Counter
/// increments commit independently of the caller's document transaction, so
/// a rolled-back creation may leave a gap; gaps are allowed, duplicates are
/// not.
pub struct LockedAllocator {
    pool: MySqlPool,
}

impl LockedAllocator {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceAllocator for LockedAllocator {
    async fn next_code(&self, series: DocumentSeries, date: NaiveDate) -> Result<String> {
        let period = DocumentSeries::period_key(date);
        let mut tx = self.pool.begin().await?;

        let current: Option<u32> = sqlx::query_scalar(
            "SELECT next_value FROM document_counters \
             WHERE series = ? AND period = ? FOR UPDATE",
        )
        .bind(series.prefix())
        .bind(&period)
        .fetch_optional(&mut *tx)
        .await?;

        let mut value = match current {
            Some(v) => v,
            None => {
                sqlx::query(
                    "INSERT INTO document_counters (series, period, next_value) \
                     VALUES (?, ?, 1)",
                )
                .bind(series.prefix())
                .bind(&period)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if e.as_database_error()
                        .is_some_and(|db| db.is_unique_violation())
                    {
                        // Another caller created the counter first; retryable
                        AppError::conflict(format!("Counter for {}-{} already created", series, period))
                    } else {
                        AppError::Database(e)
                    }
                })?;
                1
            }
        };

        let mut probes = 0;
        let code = loop {
            let candidate = series.format_code(date, value);
            if !code_exists(&mut *tx, series, &candidate).await? {
                break candidate;
            }
            warn!(
                series = %series,
                code = candidate.as_str(),
                "Counter lagged behind existing codes, probing forward"
            );
            probes += 1;
            if probes >= MAX_PROBES {
                return Err(AppError::conflict(format!(
                    "Could not allocate a {} code after {} probes",
                    series, MAX_PROBES
                )));
            }
            value += 1;
        };

        sqlx::query(
            "UPDATE document_counters SET next_value = ? \
             WHERE series = ? AND period = ?",
        )
        .bind(value + 1)
        .bind(series.prefix())
        .bind(&period)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(series = %series, code = code.as_str(), "Allocated document code");
        Ok(code)
    }
}
