//! Adapter selection and SQL helpers
//!
//! [`Connector`] resolves the configured adapter name, connects once and
//! caches the adapter. When connecting fails it caches a [`NullAdapter`]
//! instead and reports itself offline, so pages that only need to render a
//! diagnostic can still run.

use std::cell::{Cell, OnceCell};
use std::rc::Rc;
use std::sync::LazyLock;
use regex::{Captures, Regex};
use tracing::{error, info};
use crate::config::DatabaseConfig;
use crate::error::{Result, TrackerError};
use super::adapter::Adapter;
use super::null::NullAdapter;
use super::sqlite::SqliteAdapter;

/// Adapter used when the config names none
pub const DEFAULT_ADAPTER: &str = "Sqlite";

/// Implementations the connector can instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Sqlite,
    Null,
}

impl AdapterKind {
    /// Map a normalized class name to an adapter
    pub fn from_class_name(class_name: &str) -> Result<Self> {
        match class_name {
            "SqliteAdapter" => Ok(AdapterKind::Sqlite),
            "NullAdapter" => Ok(AdapterKind::Null),
            other => Err(TrackerError::UnknownAdapter(other.to_string())),
        }
    }
}

/// Normalize a configured adapter name to its class name
///
/// Legacy names carried a `Db` prefix (`DbSqlite`); current names may omit
/// the `Adapter` suffix. `None` selects [`DEFAULT_ADAPTER`].
pub fn adapter_class_name(configured: Option<&str>) -> String {
    let mut name = configured
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_ADAPTER);

    if let Some(stripped) = name.strip_prefix("Db") {
        name = stripped;
    }

    if name.ends_with("Adapter") {
        name.to_string()
    } else {
        format!("{}Adapter", name)
    }
}

/// Resolves, instantiates and caches the database adapter
pub struct Connector {
    config: DatabaseConfig,
    instance: OnceCell<Rc<dyn Adapter>>,
    offline: Cell<bool>,
}

impl Connector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            instance: OnceCell::new(),
            offline: Cell::new(false),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// True once a connection attempt failed and the null adapter took over
    pub fn is_offline(&self) -> bool {
        self.offline.get()
    }

    /// Get the cached adapter, connecting on first use
    ///
    /// On connection failure the null adapter is cached. With `fallback`
    /// it is returned and the caller should render the offline page;
    /// without it the connection error is returned.
    pub fn get_instance(&self, fallback: bool) -> Result<Rc<dyn Adapter>> {
        if let Some(adapter) = self.instance.get() {
            return Ok(Rc::clone(adapter));
        }

        let class_name = adapter_class_name(self.config.classname.as_deref());
        let kind = AdapterKind::from_class_name(&class_name)?;

        match Self::instantiate(kind, &self.config) {
            Ok(adapter) => {
                info!(adapter = adapter.name(), "database adapter ready");
                Ok(Rc::clone(self.instance.get_or_init(|| adapter)))
            }
            Err(e) => {
                error!(adapter = %class_name, error = %e, "database connection failed, going offline");
                let null: Rc<dyn Adapter> = Rc::new(NullAdapter::new(&self.config.table_prefix));
                let cached = Rc::clone(self.instance.get_or_init(|| null));
                self.offline.set(true);

                if fallback { Ok(cached) } else { Err(e) }
            }
        }
    }

    fn instantiate(kind: AdapterKind, config: &DatabaseConfig) -> Result<Rc<dyn Adapter>> {
        let adapter: Rc<dyn Adapter> = match kind {
            AdapterKind::Sqlite => Rc::new(SqliteAdapter::connect(config)?),
            AdapterKind::Null => Rc::new(NullAdapter::new(&config.table_prefix)),
        };
        Ok(adapter)
    }
}

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\{\{(%?[\w\-\. ]+%?)\}\}|\[\[([\w\-\. ]+)\]\])").expect("token pattern")
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Quote `{{table}}` and `[[column]]` tokens in `sql`
///
/// A `%` at either end of a table token is replaced with `table_prefix`.
pub fn quote_table_name(db: &dyn Adapter, table_prefix: &str, sql: &str) -> String {
    TOKEN_PATTERN
        .replace_all(sql, |caps: &Captures| {
            if let Some(column) = caps.get(3) {
                db.quote_identifier(column.as_str())
            } else {
                let table = caps.get(2).map_or("", |m| m.as_str());
                db.quote_identifier(table).replace('%', table_prefix)
            }
        })
        .into_owned()
}

/// Collapse whitespace runs so statements log on one line
pub fn filter_query(query: &str) -> String {
    WHITESPACE.replace_all(query, " ").into_owned()
}

/// `a=?, b=?` for an UPDATE SET clause
pub fn build_set(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("{}=?", c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `?, ?, ?` with one placeholder per item
pub fn build_list<T>(items: &[T]) -> String {
    vec!["?"; items.len()].join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_adapter_class_name() {
        assert_eq!(adapter_class_name(None), "SqliteAdapter");
        assert_eq!(adapter_class_name(Some("")), "SqliteAdapter");
        assert_eq!(adapter_class_name(Some("Sqlite")), "SqliteAdapter");
        assert_eq!(adapter_class_name(Some("DbSqlite")), "SqliteAdapter");
        assert_eq!(adapter_class_name(Some("SqliteAdapter")), "SqliteAdapter");
        assert_eq!(adapter_class_name(Some("DbNullAdapter")), "NullAdapter");
    }

    #[test]
    fn test_unknown_adapter() {
        let err = AdapterKind::from_class_name(&adapter_class_name(Some("Pear"))).unwrap_err();
        assert!(matches!(err, TrackerError::UnknownAdapter(name) if name == "PearAdapter"));
    }

    #[test]
    fn test_instance_is_cached() {
        let connector = Connector::new(DatabaseConfig::sqlite(":memory:", ""));
        let first = connector.get_instance(false).unwrap();
        let second = connector.get_instance(false).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "SqliteAdapter");
        assert!(!connector.is_offline());
    }

    #[test]
    fn test_fallback_to_null_adapter() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("no/such/dir/tracker.db");
        let connector = Connector::new(DatabaseConfig::sqlite(missing.to_str().unwrap(), "ev_"));

        let adapter = connector.get_instance(true).unwrap();
        assert_eq!(adapter.name(), "NullAdapter");
        assert!(connector.is_offline());
    }

    #[test]
    fn test_no_fallback_returns_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("no/such/dir/tracker.db");
        let connector = Connector::new(DatabaseConfig::sqlite(missing.to_str().unwrap(), ""));

        let err = connector.get_instance(false).err().unwrap();
        assert!(matches!(err, TrackerError::Connection(_)));
        assert!(connector.is_offline());

        // the null adapter stays cached for later callers
        assert_eq!(connector.get_instance(true).unwrap().name(), "NullAdapter");
    }

    #[test]
    fn test_quote_table_name() {
        let db = NullAdapter::new("ev_");
        assert_eq!(
            quote_table_name(&db, "ev_", "SELECT [[usr_id]] FROM {{%user}} WHERE usr_id=?"),
            r#"SELECT "usr_id" FROM "ev_user" WHERE usr_id=?"#
        );
        assert_eq!(quote_table_name(&db, "ev_", "{{user}}"), r#""user""#);
        assert_eq!(quote_table_name(&db, "ev_", "{{log%}}"), r#""logev_""#);
    }

    #[test]
    fn test_filter_query() {
        assert_eq!(
            filter_query("SELECT\n    iat_id\n FROM\t{{%issue_attachment}}"),
            "SELECT iat_id FROM {{%issue_attachment}}"
        );
    }

    #[test]
    fn test_build_set_and_list() {
        assert_eq!(build_set(&["res_title", "res_rank"]), "res_title=?, res_rank=?");
        assert_eq!(build_list(&[1, 2, 3]), "?, ?, ?");
        assert_eq!(build_list::<i64>(&[]), "");
    }
}
