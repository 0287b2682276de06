//! Main tracker API
//!
//! A [`Tracker`] binds a database adapter to the request it serves. The
//! request identity travels in an explicit [`RequestContext`].

use std::rc::Rc;
use tracing::{error, warn};
use crate::database::{Adapter, Connector, Role, schema};
use crate::error::Result;
use crate::DEFAULT_MAX_ATTACHMENT_SIZE;
use super::Code;
use super::notification::{LogNotifier, Notifier};

/// Who is making the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    /// Authenticated user
    pub usr_id: i64,
    /// Currently selected project
    pub prj_id: i64,
    /// Role in the current project
    pub role: Role,
}

impl RequestContext {
    pub fn new(usr_id: i64, prj_id: i64, role: Role) -> Self {
        Self { usr_id, prj_id, role }
    }
}

/// Domain services for one request
pub struct Tracker {
    pub(crate) db: Rc<dyn Adapter>,
    pub(crate) context: RequestContext,
    pub(crate) notifier: Rc<dyn Notifier>,
    pub(crate) max_attachment_size: u64,
}

impl Tracker {
    /// Create a tracker over an adapter, logging notifications
    pub fn new(db: Rc<dyn Adapter>, context: RequestContext) -> Self {
        Self {
            db,
            context,
            notifier: Rc::new(LogNotifier),
            max_attachment_size: DEFAULT_MAX_ATTACHMENT_SIZE,
        }
    }

    /// Create a tracker from a connector; fails when the database is unreachable
    pub fn connect(connector: &Connector, context: RequestContext) -> Result<Self> {
        let db = connector.get_instance(false)?;
        Ok(Self::new(db, context))
    }

    /// Replace the notifier
    pub fn with_notifier(mut self, notifier: Rc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Set the largest accepted upload in bytes; 0 disables the check
    pub fn with_max_attachment_size(mut self, bytes: u64) -> Self {
        self.max_attachment_size = bytes;
        self
    }

    pub fn db(&self) -> &dyn Adapter {
        self.db.as_ref()
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Create any missing tables
    pub fn install_schema(&self) -> Result<()> {
        schema::install(self.db())
    }

    /// Run `f` inside a transaction, committing on success
    pub(crate) fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn Adapter) -> Result<T>,
    {
        let db = self.db();
        db.begin()?;
        match f(db) {
            Ok(value) => {
                if let Err(e) = db.commit() {
                    Self::rollback_quietly(db);
                    return Err(e);
                }
                Ok(value)
            }
            Err(e) => {
                Self::rollback_quietly(db);
                Err(e)
            }
        }
    }

    fn rollback_quietly(db: &dyn Adapter) {
        if let Err(e) = db.rollback() {
            error!(error = %e, "rollback failed");
        }
    }

    /// Map a write result to its code, logging failures
    pub(crate) fn code_for<T>(&self, result: Result<T>, action: &str) -> Code {
        match result {
            Ok(_) => Code::Success,
            Err(e) => {
                warn!(usr_id = self.context.usr_id, error = %e, "{} failed", action);
                Code::Failed
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::{queries, SqliteAdapter, Value};
    use crate::error::TrackerError;

    /// Fixture IDs created by [`create_test_tracker`]
    pub struct Fixture {
        pub prj_id: i64,
        pub iss_id: i64,
        pub admin_id: i64,
        pub developer_id: i64,
        pub customer_id: i64,
    }

    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// In-memory tracker with one project, one issue and three users
    pub fn create_test_tracker() -> (Tracker, Fixture) {
        init_tracing();
        let db = SqliteAdapter::connect(&DatabaseConfig::sqlite(":memory:", "ev_")).unwrap();
        schema::install(&db).unwrap();

        let prj_id = queries::insert_project(&db, "Default Project", Some("example")).unwrap();
        let admin_id = queries::insert_user(&db, "Admin User", "admin@example.com").unwrap();
        let developer_id = queries::insert_user(&db, "Dev User", "dev@example.com").unwrap();
        let customer_id = queries::insert_user(&db, "Customer User", "customer@example.com").unwrap();
        queries::set_project_role(&db, prj_id, admin_id, Role::Administrator).unwrap();
        queries::set_project_role(&db, prj_id, developer_id, Role::Developer).unwrap();
        queries::set_project_role(&db, prj_id, customer_id, Role::Customer).unwrap();
        let iss_id = queries::insert_issue(&db, prj_id, "Crash on save").unwrap();

        let tracker = Tracker::new(
            Rc::new(db),
            RequestContext::new(admin_id, prj_id, Role::Administrator),
        );
        (tracker, Fixture { prj_id, iss_id, admin_id, developer_id, customer_id })
    }

    /// Same database, acting as another user
    pub fn as_user(tracker: &Tracker, usr_id: i64, role: Role) -> Tracker {
        Tracker {
            db: Rc::clone(&tracker.db),
            context: RequestContext::new(usr_id, tracker.context.prj_id, role),
            notifier: Rc::clone(&tracker.notifier),
            max_attachment_size: tracker.max_attachment_size,
        }
    }

    #[test]
    fn test_transaction_commits() {
        let (tracker, fixture) = create_test_tracker();
        let id = tracker
            .transaction(|db| queries::insert_issue(db, fixture.prj_id, "second"))
            .unwrap();
        assert!(queries::get_issue(tracker.db(), id).unwrap().is_some());
    }

    #[test]
    fn test_transaction_rolls_back() {
        let (tracker, fixture) = create_test_tracker();
        let result: Result<()> = tracker.transaction(|db| {
            queries::insert_issue(db, fixture.prj_id, "doomed")?;
            Err(TrackerError::InvalidOperation("stop".into()))
        });
        assert!(result.is_err());

        let count = tracker.db().get_one("SELECT COUNT(*) FROM {{%issue}}", &[]).unwrap();
        assert_eq!(count, Some(Value::Integer(1)));
    }

    #[test]
    fn test_code_for() {
        let (tracker, _fixture) = create_test_tracker();
        assert_eq!(tracker.code_for(Ok(()), "test"), Code::Success);
        let failed: Result<()> = Err(TrackerError::Database("locked".into()));
        assert_eq!(tracker.code_for(failed, "test"), Code::Failed);
    }
}
