//! Uniform query interface implemented by every database adapter

use rusqlite::types::Value;
use crate::error::{Result, TrackerError};

/// One fetched row: values addressable by position or by column name
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row from parallel column and value lists
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Value at position `idx`
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Value of the column named `name`
    pub fn by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Integer column; text holding a number is accepted too
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.by_name(name)? {
            Value::Integer(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Real(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Integer column that must be present
    pub fn require_i64(&self, name: &str) -> Result<i64> {
        self.get_i64(name).ok_or_else(|| {
            TrackerError::Database(format!("Column {} is missing or not an integer", name))
        })
    }

    /// Text column; integers are rendered, NULL is `None`
    pub fn get_string(&self, name: &str) -> Option<String> {
        match self.by_name(name)? {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(n) => Some(n.to_string()),
            Value::Real(f) => Some(f.to_string()),
            Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Value::Null => None,
        }
    }

    /// Blob column; text is returned as its bytes
    pub fn get_blob(&self, name: &str) -> Option<Vec<u8>> {
        match self.by_name(name)? {
            Value::Blob(b) => Some(b.clone()),
            Value::Text(s) => Some(s.as_bytes().to_vec()),
            _ => None,
        }
    }

    /// Split off the first value, keeping the remaining columns as a row
    pub fn split_first(mut self) -> Option<(Value, Row)> {
        if self.values.is_empty() {
            return None;
        }
        let key = self.values.remove(0);
        self.columns.remove(0);
        Some((key, self))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// Ordered first-column to second-column pairs
pub type Pairs = Vec<(Value, Value)>;

/// Concrete database driver behind a uniform query interface
///
/// SQL passed to any method may use `{{%table}}` and `[[column]]` tokens;
/// adapters expand them with [`crate::database::helper::quote_table_name`]
/// before execution. Parameters bind to `?` placeholders in order.
pub trait Adapter {
    /// Adapter class name, e.g. "SqliteAdapter"
    fn name(&self) -> &'static str;

    /// Prefix substituted for `%` in table tokens
    fn table_prefix(&self) -> &str;

    /// Quote a table or column identifier for this driver
    fn quote_identifier(&self, name: &str) -> String;

    /// Execute a statement, returning the number of affected rows
    fn query(&self, sql: &str, params: &[Value]) -> Result<usize>;

    /// Execute a query and fetch every row
    fn get_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// ID of the most recently inserted row
    fn last_insert_id(&self) -> Result<i64>;

    fn begin(&self) -> Result<()>;

    fn commit(&self) -> Result<()>;

    fn rollback(&self) -> Result<()>;

    /// First row, if any
    fn get_row(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        Ok(self.get_all(sql, params)?.into_iter().next())
    }

    /// First column of the first row; `None` when there are no rows
    fn get_one(&self, sql: &str, params: &[Value]) -> Result<Option<Value>> {
        Ok(self
            .get_row(sql, params)?
            .and_then(|row| row.into_values().into_iter().next()))
    }

    /// First column of every row
    fn get_column(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>> {
        Ok(self
            .get_all(sql, params)?
            .into_iter()
            .filter_map(|row| row.into_values().into_iter().next())
            .collect())
    }

    /// First column mapped to second column, in row order
    fn get_pair(&self, sql: &str, params: &[Value]) -> Result<Pairs> {
        let mut pairs = Vec::new();
        for row in self.get_all(sql, params)? {
            let mut values = row.into_values().into_iter();
            let key = values.next().unwrap_or(Value::Null);
            let value = values.next().unwrap_or(Value::Null);
            pairs.push((key, value));
        }
        Ok(pairs)
    }

    /// Rows keyed by their first column, in row order
    ///
    /// The remaining columns always stay a [`Row`]; use
    /// [`get_pair`](Adapter::get_pair) for key to single value results.
    fn get_assoc(&self, sql: &str, params: &[Value]) -> Result<Vec<(Value, Row)>> {
        Ok(self
            .get_all(sql, params)?
            .into_iter()
            .filter_map(Row::split_first)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_row() -> Row {
        Row::new(
            vec!["usr_id".into(), "usr_full_name".into(), "usr_lang".into()],
            vec![Value::Integer(2), Value::Text("Admin User".into()), Value::Null],
        )
    }

    #[test]
    fn test_row_access_by_index_and_name() {
        let row = user_row();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(1), Some(&Value::Text("Admin User".into())));
        assert_eq!(row.by_name("usr_id"), Some(&Value::Integer(2)));
        assert_eq!(row.get_i64("usr_id"), Some(2));
        assert_eq!(row.get_string("usr_full_name").as_deref(), Some("Admin User"));
        assert_eq!(row.get_string("usr_lang"), None);
        assert!(row.by_name("missing").is_none());
    }

    #[test]
    fn test_numeric_text_is_integer() {
        let row = Row::new(vec!["n".into()], vec![Value::Text(" 42 ".into())]);
        assert_eq!(row.get_i64("n"), Some(42));
    }

    #[test]
    fn test_require_i64_missing() {
        let row = user_row();
        assert!(row.require_i64("usr_full_name").is_err());
    }

    #[test]
    fn test_split_first() {
        let (key, rest) = user_row().split_first().unwrap();
        assert_eq!(key, Value::Integer(2));
        assert_eq!(rest.columns(), &["usr_full_name".to_string(), "usr_lang".to_string()]);
        assert!(Row::new(vec![], vec![]).split_first().is_none());
    }
}
