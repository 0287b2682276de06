//! SQLite adapter

use std::path::Path;
use rusqlite::{Connection, params_from_iter};
use rusqlite::types::Value;
use tracing::{error, trace};
use crate::config::DatabaseConfig;
use crate::error::{Result, TrackerError};
use super::adapter::{Adapter, Row};
use super::helper::{filter_query, quote_table_name};

/// Database name that opens a private in-memory database
pub const MEMORY_DATABASE: &str = ":memory:";

/// Quote an identifier with double quotes, part by part for dotted names
pub fn quote_ansi_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Adapter backed by a SQLite connection
pub struct SqliteAdapter {
    conn: Connection,
    table_prefix: String,
}

impl SqliteAdapter {
    /// Open the database named in `config`
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let conn = if config.database == MEMORY_DATABASE {
            Connection::open_in_memory()
        } else {
            Connection::open(Path::new(&config.database))
        }
        .map_err(|e| TrackerError::Connection(format!("{}: {}", config.database, e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON")
            .map_err(|e| TrackerError::Connection(e.to_string()))?;

        Ok(Self {
            conn,
            table_prefix: config.table_prefix.clone(),
        })
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: Connection, table_prefix: &str) -> Self {
        Self {
            conn,
            table_prefix: table_prefix.to_string(),
        }
    }

    fn prepare_sql(&self, sql: &str) -> String {
        quote_table_name(self, &self.table_prefix, sql)
    }

    fn log_failure<T>(sql: &str, result: rusqlite::Result<T>) -> Result<T> {
        result.map_err(|e| {
            error!(query = %filter_query(sql), error = %e, "query failed");
            TrackerError::from(e)
        })
    }

    fn fetch(&self, sql: &str, params: &[Value]) -> rusqlite::Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            (0..width)
                .map(|idx| row.get::<_, Value>(idx))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?;

        rows.map(|values| values.map(|v| Row::new(columns.clone(), v)))
            .collect()
    }
}

impl Adapter for SqliteAdapter {
    fn name(&self) -> &'static str {
        "SqliteAdapter"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_ansi_identifier(name)
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<usize> {
        let sql = self.prepare_sql(sql);
        trace!(query = %filter_query(&sql), "execute");
        Self::log_failure(&sql, self.conn.execute(&sql, params_from_iter(params.iter())))
    }

    fn get_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let sql = self.prepare_sql(sql);
        trace!(query = %filter_query(&sql), "fetch");
        Self::log_failure(&sql, self.fetch(&sql, params))
    }

    fn last_insert_id(&self) -> Result<i64> {
        Ok(self.conn.last_insert_rowid())
    }

    fn begin(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
