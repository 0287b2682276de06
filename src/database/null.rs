//! Offline adapter: every query succeeds with an empty result

use rusqlite::types::Value;
use tracing::debug;
use crate::error::Result;
use super::adapter::{Adapter, Row};
use super::sqlite::quote_ansi_identifier;

/// Stand-in used when no database connection could be made
pub struct NullAdapter {
    table_prefix: String,
}

impl NullAdapter {
    pub fn new(table_prefix: &str) -> Self {
        Self { table_prefix: table_prefix.to_string() }
    }
}

impl Adapter for NullAdapter {
    fn name(&self) -> &'static str {
        "NullAdapter"
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_ansi_identifier(name)
    }

    fn query(&self, sql: &str, _params: &[Value]) -> Result<usize> {
        debug!(query = sql, "offline, statement ignored");
        Ok(0)
    }

    fn get_all(&self, _sql: &str, _params: &[Value]) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    fn last_insert_id(&self) -> Result<i64> {
        Ok(0)
    }

    fn begin(&self) -> Result<()> {
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        Ok(())
    }
}
