//! Bundled offline dataset
//!
//! Stands in for the listing endpoints when the service cannot be reached.
//! Same shape as the service's user records.

use std::path::Path;

use crate::error::Result;
use crate::identity::Identifier;
use crate::models::{Application, DatabaseUser};

const BUNDLED: &str = include_str!("../fixtures/sample_api_call_db.json");

/// A static collection of users and their applications
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    users: Vec<DatabaseUser>,
}

impl Fixture {
    /// The dataset compiled into the crate
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED)
    }

    /// Parse a dataset from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let users = serde_json::from_str(json)?;
        Ok(Self { users })
    }

    /// Load a dataset from a file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn users(&self) -> &[DatabaseUser] {
        &self.users
    }

    /// First user whose name and identifier match
    pub fn find_user(&self, name: &str, identifier: &str) -> Option<&DatabaseUser> {
        self.users.iter().find(|u| u.matches(name, identifier))
    }

    /// Applications owned by the user with this identifier or (case-insensitive) name
    pub fn applications_for(&self, identifier_or_name: &str) -> Vec<Application> {
        let digits = Identifier::normalize(identifier_or_name);
        let lowered = identifier_or_name.trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| {
                (!digits.is_empty() && Identifier::normalize(&u.identifier) == digits)
                    || u.name.trim().to_lowercase() == lowered
            })
            .flat_map(|u| u.applications.iter().cloned())
            .collect()
    }

    /// Every application, each tagged with its owner's name when missing
    pub fn all_applications(&self) -> Vec<Application> {
        self.users
            .iter()
            .flat_map(|u| {
                u.applications.iter().cloned().map(move |mut app| {
                    if app.applicant_name.is_none() {
                        app.applicant_name = Some(u.name.clone());
                    }
                    if app.applicant_identifier.is_none() {
                        app.applicant_identifier = Some(u.identifier.clone());
                    }
                    app
                })
            })
            .collect()
    }

    /// Look up a single application by id
    pub fn application(&self, application_id: &str) -> Option<Application> {
        self.all_applications()
            .into_iter()
            .find(|a| a.application_id == application_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recommendation;

    #[test]
    fn bundled_fixture_parses() {
        let fixture = Fixture::bundled().unwrap();
        assert_eq!(fixture.users().len(), 3);
        assert_eq!(fixture.all_applications().len(), 3);
    }

    #[test]
    fn lookups_normalize_identifiers() {
        let fixture = Fixture::bundled().unwrap();
        let user = fixture.find_user("maria gonzalez", "123456789").unwrap();
        assert_eq!(user.applications.len(), 1);

        assert_eq!(fixture.applications_for("987654321").len(), 2);
        assert_eq!(fixture.applications_for("James Whitfield").len(), 2);
        assert!(fixture.applications_for("555-12-3456").is_empty());
        assert!(fixture.applications_for("nobody").is_empty());
    }

    #[test]
    fn application_by_id() {
        let fixture = Fixture::bundled().unwrap();
        let app = fixture
            .application("b2e7f9a1-3c4d-4e5f-8a9b-7c6d5e4f3a2b")
            .unwrap();
        assert_eq!(app.recommendation, Recommendation::Deny);
        assert!(app.documents.is_empty());
        assert!(fixture.application("missing").is_none());
    }

    #[test]
    fn dataset_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"[{"name":"Jane Doe","ssn":"123-45-6789"}]"#).unwrap();

        let fixture = Fixture::from_path(&path).unwrap();
        assert!(fixture.find_user("jane doe", "123456789").is_some());
        assert!(Fixture::from_path(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn empty_fixture_has_no_users() {
        let fixture = Fixture::from_json("[]").unwrap();
        assert!(fixture.find_user("Jane", "1").is_none());
    }
}
