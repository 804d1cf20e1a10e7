//! Identity resolution
//!
//! Maps a submitted or stored `(name, identifier)` pair onto a known user
//! record. Names compare case-insensitively after trimming; identifiers
//! compare on their digits only. Not finding anyone is the normal outcome
//! for a first-time applicant and is never an error.

use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::ClientOptions;
use crate::error::Result;
use crate::fetch::Fetch;
use crate::fixture::Fixture;
use crate::identity::Role;
use crate::models::DatabaseUser;

/// User name that, together with the configured admin credential, grants the admin role
pub const ADMIN_USER_NAME: &str = "admin";

/// Outcome of resolving an identity
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The configured admin credential was presented
    Admin,
    /// A known applicant
    Applicant(DatabaseUser),
    /// Nobody matched
    Unregistered,
}

impl Resolution {
    /// The role the signed-in identity should carry
    pub fn role(&self) -> Role {
        match self {
            Resolution::Admin => Role::Admin,
            _ => Role::User,
        }
    }

    /// The matched user, if any
    pub fn user(&self) -> Option<&DatabaseUser> {
        match self {
            Resolution::Applicant(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Resolution::Admin)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserListing {
    Bare(Vec<DatabaseUser>),
    Wrapped { users: Vec<DatabaseUser> },
}

impl UserListing {
    fn into_users(self) -> Vec<DatabaseUser> {
        match self {
            UserListing::Bare(users) | UserListing::Wrapped { users } => users,
        }
    }
}

/// Resolves identities against a candidate list
pub struct IdentityResolver {
    url: String,
    client: Client,
    options: ClientOptions,
    fixture: Arc<Fixture>,
}

impl IdentityResolver {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions, fixture: Arc<Fixture>) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
            fixture,
        }
    }

    fn is_admin_credential(&self, name: &str, identifier: &str) -> bool {
        match &self.options.admin_identifier {
            Some(secret) => {
                name.trim().eq_ignore_ascii_case(ADMIN_USER_NAME) && identifier.trim() == secret.as_str()
            }
            None => false,
        }
    }

    /// Resolve against an already-fetched candidate list.
    ///
    /// When several candidates match, the first one wins.
    pub fn resolve(&self, name: &str, identifier: &str, candidates: &[DatabaseUser]) -> Resolution {
        if self.is_admin_credential(name, identifier) {
            debug!("admin credential presented");
            return Resolution::Admin;
        }

        let mut matches = candidates.iter().filter(|u| u.matches(name, identifier));
        let first = match matches.next() {
            Some(user) => user,
            None => return Resolution::Unregistered,
        };

        let extra = matches.count();
        if extra > 0 {
            warn!(
                "{} additional users match {:?}; using the first",
                extra,
                name.trim()
            );
        }
        Resolution::Applicant(first.clone())
    }

    /// Fetch the remote user listing.
    ///
    /// Falls back to the bundled fixture on transport failure when enabled.
    pub async fn candidates(&self, cancel: Option<&CancellationToken>) -> Result<Vec<DatabaseUser>> {
        let url = format!("{}/api/users", self.url);
        let result = Fetch::get(&self.client, &url)
            .timeout(self.options.request_timeout)
            .cancel_on(cancel)
            .execute::<UserListing>()
            .await;

        match result {
            Ok(listing) => Ok(listing.into_users()),
            Err(e) if self.options.fallback_to_fixture && e.is_transport() => {
                warn!("user listing unavailable ({}), using bundled fixture", e);
                Ok(self.fixture.users().to_vec())
            }
            Err(e) => Err(e),
        }
    }

    /// Resolve against the remote listing.
    ///
    /// The admin credential is checked before any request is made.
    pub async fn resolve_remote(
        &self,
        name: &str,
        identifier: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Resolution> {
        if self.is_admin_credential(name, identifier) {
            return Ok(Resolution::Admin);
        }
        let candidates = self.candidates(cancel).await?;
        Ok(self.resolve(name, identifier, &candidates))
    }
}
