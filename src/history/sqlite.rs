use super::HistoryStore;
use crate::amount::Amount;
use crate::error::StoreError;
use crate::types::{AccountId, HistoricalAggregate};
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::time::Duration;

pub const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS account_statistics (
    account_id TEXT PRIMARY KEY,
    daily_outcome INTEGER NOT NULL DEFAULT 0,
    monthly_outcome INTEGER NOT NULL DEFAULT 0,
    annual_outcome INTEGER NOT NULL DEFAULT 0,
    annual_income INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL,
    ledger INTEGER NOT NULL
)";

/// History store reading the API server's own database.
#[derive(Clone)]
pub struct SqliteHistory {
    pool: SqlitePool,
}

impl SqliteHistory {
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteHistory {
    async fn account_aggregate(&self, id: &AccountId) -> Result<HistoricalAggregate, StoreError> {
        let row = sqlx::query(
            "SELECT daily_outcome, monthly_outcome, annual_outcome, annual_income, updated_at, ledger
             FROM account_statistics WHERE account_id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(HistoricalAggregate::empty(id.clone()));
        };

        let updated_at: i64 = row.try_get("updated_at")?;
        let updated_at = DateTime::from_timestamp(updated_at, 0).ok_or_else(|| StoreError::Corrupt {
            table: "account_statistics",
            reason: format!("bad updated_at {}", updated_at),
        })?;

        Ok(HistoricalAggregate {
            account_id: id.clone(),
            daily_outcome: Amount::from_units(row.try_get("daily_outcome")?),
            monthly_outcome: Amount::from_units(row.try_get("monthly_outcome")?),
            annual_outcome: Amount::from_units(row.try_get("annual_outcome")?),
            annual_income: Amount::from_units(row.try_get("annual_income")?),
            updated_at,
            ledger: ledger_number(row.try_get("ledger")?)?,
        })
    }

    async fn latest_ledger(&self) -> Result<u32, StoreError> {
        let latest: Option<i64> = sqlx::query_scalar("SELECT MAX(ledger) FROM account_statistics")
            .fetch_one(&self.pool)
            .await?;
        latest.map_or(Ok(0), ledger_number)
    }

    async fn changed_since(&self, after: u32) -> Result<Vec<(u32, AccountId)>, StoreError> {
        let rows = sqlx::query(
            "SELECT account_id, ledger FROM account_statistics
             WHERE ledger > ? ORDER BY ledger, account_id",
        )
        .bind(after as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<(u32, AccountId), StoreError> {
                let ledger = ledger_number(row.try_get("ledger")?)?;
                let account: String = row.try_get("account_id")?;
                Ok((ledger, AccountId::new(account)))
            })
            .collect()
    }
}

fn ledger_number(value: i64) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt {
        table: "account_statistics",
        reason: format!("bad ledger {}", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteHistory {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteHistory::from_pool(pool);
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_missing_account_is_empty() {
        let store = store().await;
        let aggregate = store.account_aggregate(&AccountId::new("GA")).await.unwrap();
        assert_eq!(aggregate, HistoricalAggregate::empty(AccountId::new("GA")));
    }

    #[tokio::test]
    async fn test_reads_row() {
        let store = store().await;
        sqlx::query(
            "INSERT INTO account_statistics
             (account_id, daily_outcome, monthly_outcome, annual_outcome, annual_income, updated_at, ledger)
             VALUES ('GA', 4000000000, 5000000000, 6000000000, 70000000, 1700000000, 12)",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let aggregate = store.account_aggregate(&AccountId::new("GA")).await.unwrap();
        assert_eq!(aggregate.daily_outcome, Amount::from_whole(400).unwrap());
        assert_eq!(aggregate.annual_income, Amount::from_whole(7).unwrap());
        assert_eq!(aggregate.updated_at.timestamp(), 1_700_000_000);
        assert_eq!(aggregate.ledger, 12);
    }

    #[tokio::test]
    async fn test_change_feed() {
        let store = store().await;
        assert_eq!(store.latest_ledger().await.unwrap(), 0);

        sqlx::query(
            "INSERT INTO account_statistics (account_id, updated_at, ledger)
             VALUES ('GA', 1700000000, 12), ('GB', 1700000000, 14), ('GC', 1700000000, 13)",
        )
        .execute(store.pool())
        .await
        .unwrap();

        assert_eq!(store.latest_ledger().await.unwrap(), 14);
        assert_eq!(
            store.changed_since(12).await.unwrap(),
            vec![(13, AccountId::new("GC")), (14, AccountId::new("GB"))]
        );
    }
}
