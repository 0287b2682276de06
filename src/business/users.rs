//! User, project and role operations

use crate::database::{queries, Project, Role};
use crate::error::Result;
use super::tracker::Tracker;

/// Role ID to title, skipping `excluded`
pub fn role_titles(excluded: &[Role]) -> Vec<(i64, &'static str)> {
    Role::ALL
        .into_iter()
        .filter(|role| !excluded.contains(role))
        .map(|role| (role.id(), role.title()))
        .collect()
}

impl Tracker {
    /// Create a user account
    pub fn add_user(&self, full_name: &str, email: &str) -> Result<i64> {
        queries::insert_user(self.db(), full_name, email)
    }

    /// Create a project; a customer backend enables customer integration
    pub fn add_project(&self, title: &str, customer_backend: Option<&str>) -> Result<i64> {
        queries::insert_project(self.db(), title, customer_backend)
    }

    /// Give a user a role in a project
    pub fn assign_role(&self, prj_id: i64, usr_id: i64, role: Role) -> Result<()> {
        queries::set_project_role(self.db(), prj_id, usr_id, role)
    }

    /// A user's role in a project; users without membership are viewers
    pub fn role_by_user(&self, usr_id: i64, prj_id: i64) -> Result<Role> {
        let role = queries::get_project_role(self.db(), usr_id, prj_id)?
            .and_then(Role::from_id)
            .unwrap_or(Role::Viewer);
        Ok(role)
    }

    /// A user's full name
    pub fn full_name(&self, usr_id: i64) -> Result<Option<String>> {
        queries::get_user_full_name(self.db(), usr_id)
    }

    /// Whether the project is linked to a customer backend
    pub fn has_customer_integration(&self, prj_id: i64) -> Result<bool> {
        Ok(queries::get_project(self.db(), prj_id)?
            .is_some_and(|p| p.customer_backend.is_some()))
    }

    /// All projects ordered by title
    pub fn projects(&self) -> Result<Vec<Project>> {
        queries::get_projects(self.db())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::tracker::tests::create_test_tracker;

    #[test]
    fn test_role_by_user() {
        let (tracker, fixture) = create_test_tracker();
        assert_eq!(tracker.role_by_user(fixture.customer_id, fixture.prj_id).unwrap(), Role::Customer);
        assert_eq!(tracker.role_by_user(fixture.developer_id, fixture.prj_id).unwrap(), Role::Developer);

        let other = tracker.add_project("Other", None).unwrap();
        assert_eq!(tracker.role_by_user(fixture.developer_id, other).unwrap(), Role::Viewer);
    }

    #[test]
    fn test_customer_integration() {
        let (tracker, fixture) = create_test_tracker();
        assert!(tracker.has_customer_integration(fixture.prj_id).unwrap());
        let plain = tracker.add_project("Plain", None).unwrap();
        assert!(!tracker.has_customer_integration(plain).unwrap());
        assert!(!tracker.has_customer_integration(999).unwrap());
    }

    #[test]
    fn test_full_name() {
        let (tracker, fixture) = create_test_tracker();
        assert_eq!(tracker.full_name(fixture.admin_id).unwrap().as_deref(), Some("Admin User"));
        assert_eq!(tracker.full_name(999).unwrap(), None);
    }

    #[test]
    fn test_role_titles() {
        let roles = role_titles(&[Role::Customer]);
        assert_eq!(roles.len(), 6);
        assert!(roles.iter().all(|(id, _)| *id != Role::Customer.id()));
        assert_eq!(roles[2], (4, "Standard User"));
    }
}
