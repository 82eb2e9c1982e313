//! SQLite warehouse layer.
//!
//! RULE: Only the store talks to the database.
//! Reports hand SQL text and parameters to `run_query` and get a
//! `ResultTable` back; they never hold a connection themselves.

use crate::{
    config::BucketConfig,
    error::{ReportError, ReportResult},
    query::QueryParams,
    table::{ResultTable, Value},
};
use rusqlite::{params, Connection, OpenFlags};
mod evaluation;

pub use evaluation::{EvaluationRecord, IncomeUpdateRecord};

pub struct WarehouseStore {
    conn: Connection,
    path: Option<String>, // None for :memory:
}

impl WarehouseStore {
    /// Open (or create) the warehouse at `path`.
    pub fn open(path: &str) -> ReportResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only matters for real files.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open a warehouse that must already exist. Reports use this so a
    /// mistyped path fails instead of producing empty tables.
    pub fn open_existing(path: &str) -> ReportResult<Self> {
        if !std::path::Path::new(path).exists() {
            return Err(ReportError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                Some(format!("warehouse not found at {path}")),
            )));
        }
        let store = Self::open(path)?;
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory warehouse (used in tests).
    pub fn in_memory() -> ReportResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ReportResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_warehouse.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_report_bucket.sql"))?;
        Ok(())
    }

    // ── Buckets ────────────────────────────────────────────────

    /// Replace the statement buckets the report queries join against.
    pub fn install_buckets(&self, buckets: &[BucketConfig]) -> ReportResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM report_bucket", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO report_bucket (code, label, min_statement, max_statement, sort_order)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (order, b) in buckets.iter().enumerate() {
                stmt.execute(params![
                    b.code,
                    b.label,
                    b.min_statement,
                    b.max_statement,
                    order as i64
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("installed {} statement buckets", buckets.len());
        Ok(())
    }

    pub fn bucket_count(&self) -> ReportResult<i64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM report_bucket", [], |row| row.get(0))?;
        Ok(n)
    }

    // ── Query execution ────────────────────────────────────────

    /// Execute `sql`, binding only the named parameters the text uses,
    /// and materialize every row.
    pub fn run_query(&self, sql: &str, query_params: &QueryParams) -> ReportResult<ResultTable> {
        let mut stmt = self.conn.prepare(sql)?;
        for (name, value) in query_params.bindings() {
            if let Some(idx) = stmt.parameter_index(name)? {
                stmt.raw_bind_parameter(idx, value)?;
            }
        }

        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();
        let mut table = ResultTable::new(columns);

        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(Value::from(row.get_ref(i)?));
            }
            table.push(values);
        }
        log::debug!("query returned {} rows", table.len());
        Ok(table)
    }
}
