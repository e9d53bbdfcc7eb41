//! SQLite store and the single-writer gate
//!
//! Every mutating ledger operation runs inside a [`WriteTx`]: the in-process
//! write gate is held for the lifetime of one SQLite transaction, so at most
//! one writer touches the batch tables at a time. Dropping a `WriteTx` without
//! calling [`WriteTx::commit`] rolls the transaction back.

use std::{str::FromStr, sync::Arc, time::Duration};

use rust_decimal::Decimal;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Sqlite, SqliteConnection, SqlitePool, Transaction,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

/// Handle to the ledger database
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
}

impl Store {
    /// Open (creating if needed) the database described by `config`
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Apply the embedded migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Pool for read-only queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Wait for the write gate and open a transaction
    pub async fn begin_write(&self) -> AppResult<WriteTx> {
        let guard = self.writer.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok(WriteTx { tx, _guard: guard })
    }

    /// Cheap round trip used by the health check
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A write transaction holding the store's write gate.
///
/// The transaction is declared before the guard so it is rolled back before
/// the gate is released.
pub struct WriteTx {
    tx: Transaction<'static, Sqlite>,
    _guard: OwnedMutexGuard<()>,
}

impl WriteTx {
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Parse a decimal stored as TEXT
pub(crate) fn parse_decimal(column: &str, raw: &str) -> AppResult<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| AppError::Internal(format!("corrupt decimal in {}: {:?} ({})", column, raw, e)))
}

pub(crate) fn parse_optional_decimal(column: &str, raw: Option<&str>) -> AppResult<Option<Decimal>> {
    raw.map(|r| parse_decimal(column, r)).transpose()
}

/// Canonical TEXT form of a decimal
pub(crate) fn decimal_text(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_text_is_canonical() {
        assert_eq!(decimal_text(Decimal::new(5500, 3)), "5.5");
        assert_eq!(decimal_text(Decimal::new(0, 2)), "0");
        assert_eq!(parse_decimal("remaining", "15.5").unwrap(), Decimal::new(155, 1));
        assert!(parse_decimal("remaining", "abc").is_err());
        assert_eq!(parse_optional_decimal("min_stock", None).unwrap(), None);
    }
}
