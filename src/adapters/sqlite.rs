//! SQLite-backed sequence store.
//!
//! Counters live in `gate_pass_sequences`, one row per (financial_year,
//! pass_type). Every mutation runs in an IMMEDIATE transaction, so SQLite
//! holds the write lock from BEGIN until COMMIT and concurrent writers on any
//! connection or process queue behind `busy_timeout` instead of interleaving.

use crate::config::toml_config::DatabaseConfig;
use crate::domain::model::{FinancialYear, PassType, SequenceCounter};
use crate::domain::ports::SequenceStore;
use crate::utils::error::{GatePassError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::time::Duration;

pub const SCHEMA_VERSION: i32 = 1;

const ALLOCATE_SQL: &str = "INSERT INTO gate_pass_sequences
         (financial_year, pass_type, current_sequence, created_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT(financial_year, pass_type)
         DO UPDATE SET
            current_sequence = current_sequence + 1,
            updated_at = excluded.created_at
         RETURNING current_sequence";

const SELECT_COLUMNS: &str =
    "SELECT id, financial_year, pass_type, current_sequence, created_at, updated_at
     FROM gate_pass_sequences";

#[derive(Clone)]
pub struct SqliteSequenceStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteSequenceStore {
    /// 開啟資料庫、建立連線池並執行遷移
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        config.validate_path()?;
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let manager = SqliteConnectionManager::file(&config.path).with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")
        });

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
            .build(manager)?;

        let mut conn = pool.get()?;
        migrate_to_latest(&mut conn)?;
        drop(conn);

        tracing::debug!(
            "Opened sequence store at {} (pool size {})",
            config.path,
            config.pool_size
        );
        Ok(Self { pool })
    }

    async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await?
    }
}

/// Run `operation` inside a transaction; commits on `Ok`, rolls back on drop otherwise.
pub fn execute_in_transaction<F, T>(
    conn: &mut Connection,
    behavior: TransactionBehavior,
    operation: F,
) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction_with_behavior(behavior)?;
    let result = operation(&tx)?;
    tx.commit()?;
    Ok(result)
}

pub fn migrate_to_latest(conn: &mut Connection) -> Result<()> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    execute_in_transaction(conn, TransactionBehavior::Immediate, |tx| {
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS gate_pass_sequences (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                financial_year TEXT NOT NULL,
                pass_type TEXT NOT NULL,
                current_sequence INTEGER NOT NULL DEFAULT 0 CHECK (current_sequence >= 0),
                created_at TEXT NOT NULL,
                updated_at TEXT
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_fy_pass_type
                ON gate_pass_sequences (financial_year, pass_type);",
        )?;
        tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        Ok(())
    })?;

    tracing::info!("📦 Sequence store migrated to schema v{}", SCHEMA_VERSION);
    Ok(())
}

struct RawCounter {
    id: i64,
    financial_year: String,
    pass_type: String,
    current_sequence: i64,
    created_at: String,
    updated_at: Option<String>,
}

impl RawCounter {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            financial_year: row.get(1)?,
            pass_type: row.get(2)?,
            current_sequence: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_counter(self) -> Result<SequenceCounter> {
        Ok(SequenceCounter {
            id: self.id,
            financial_year: self.financial_year.parse()?,
            pass_type: self.pass_type.parse()?,
            current_sequence: to_sequence(self.current_sequence)?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: self.updated_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn to_sequence(value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| GatePassError::storage(format!("stored sequence {} is out of range", value)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| GatePassError::storage(format!("bad timestamp '{}': {}", value, e)))
}

fn query_counters(conn: &Connection, filter: Option<&str>) -> Result<Vec<SequenceCounter>> {
    let sql = match filter {
        Some(_) => format!(
            "{} WHERE financial_year = ?1 ORDER BY pass_type",
            SELECT_COLUMNS
        ),
        None => format!("{} ORDER BY financial_year, pass_type", SELECT_COLUMNS),
    };

    let mut stmt = conn.prepare(&sql)?;
    let raw: Vec<RawCounter> = match filter {
        Some(year) => stmt
            .query_map([year], RawCounter::from_row)?
            .collect::<rusqlite::Result<_>>()?,
        None => stmt
            .query_map([], RawCounter::from_row)?
            .collect::<rusqlite::Result<_>>()?,
    };

    raw.into_iter().map(RawCounter::into_counter).collect()
}

#[async_trait]
impl SequenceStore for SqliteSequenceStore {
    async fn allocate(&self, financial_year: FinancialYear, pass_type: PassType) -> Result<u32> {
        let year = financial_year.code();
        let kind = pass_type.code();

        let sequence = self
            .with_connection(move |conn| {
                execute_in_transaction(conn, TransactionBehavior::Immediate, |tx| {
                    let now = Utc::now().to_rfc3339();
                    let value: i64 =
                        tx.query_row(ALLOCATE_SQL, params![year, kind, now], |row| row.get(0))?;
                    to_sequence(value)
                })
            })
            .await?;

        tracing::debug!("Allocated {} {} -> {}", financial_year, pass_type, sequence);
        Ok(sequence)
    }

    async fn list(&self) -> Result<Vec<SequenceCounter>> {
        self.with_connection(|conn| query_counters(conn, None)).await
    }

    async fn list_by_year(&self, financial_year: FinancialYear) -> Result<Vec<SequenceCounter>> {
        let year = financial_year.code();
        self.with_connection(move |conn| query_counters(conn, Some(&year)))
            .await
    }

    async fn set_sequence(&self, id: i64, value: u32) -> Result<SequenceCounter> {
        self.with_connection(move |conn| {
            execute_in_transaction(conn, TransactionBehavior::Immediate, |tx| {
                let now = Utc::now().to_rfc3339();
                let changed = tx.execute(
                    "UPDATE gate_pass_sequences
                     SET current_sequence = ?1, updated_at = ?2
                     WHERE id = ?3",
                    params![i64::from(value), now, id],
                )?;
                if changed == 0 {
                    return Err(GatePassError::NotFoundError { id });
                }

                let raw = tx
                    .query_row(
                        &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                        [id],
                        RawCounter::from_row,
                    )
                    .optional()?
                    .ok_or(GatePassError::NotFoundError { id })?;
                raw.into_counter()
            })
        })
        .await
    }
}
