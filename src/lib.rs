//! Claimd Rust Client Library
//!
//! A Rust client for the Claimd disability-benefit review service: identity
//! resolution, the applicant and reviewer dashboards, approve/deny actions
//! and application submission.

pub mod applications;
pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod fixture;
pub mod identity;
pub mod models;
pub mod resolver;
pub mod review;
pub mod session;
pub mod submission;
pub mod view;

use std::sync::Arc;

use log::warn;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::applications::ApplicationRepository;
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fixture::Fixture;
use crate::resolver::IdentityResolver;
use crate::review::ReviewActions;
use crate::session::{FileSessionStore, SessionContext};
use crate::submission::{HealthStatus, SubmissionClient};
use crate::view::Dashboard;

/// The main entry point for the Claimd client
pub struct Claimd {
    /// The base URL of the Claimd service, without a trailing slash
    pub url: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    session: SessionContext,
    fixture: Arc<Fixture>,
}

impl Claimd {
    /// Create a new Claimd client with default options
    ///
    /// # Example
    ///
    /// ```
    /// use claimd::Claimd;
    ///
    /// let claimd = Claimd::new("http://localhost:8000/");
    /// assert_eq!(claimd.url, "http://localhost:8000");
    /// ```
    pub fn new(url: &str) -> Self {
        Self::new_with_options(url, ClientOptions::default())
    }

    /// Create a new Claimd client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use claimd::{Claimd, config::{ClientOptions, SESSION_TTL_MONTH}};
    ///
    /// let options = ClientOptions::default()
    ///     .with_session_ttl(SESSION_TTL_MONTH)
    ///     .with_fallback_to_fixture(false);
    /// let claimd = Claimd::new_with_options("http://localhost:8000", options);
    /// assert_eq!(claimd.session().ttl(), SESSION_TTL_MONTH);
    /// ```
    pub fn new_with_options(url: &str, options: ClientOptions) -> Self {
        let fixture = Fixture::bundled().unwrap_or_else(|e| {
            warn!("bundled fixture unreadable, fallback data disabled: {}", e);
            Fixture::default()
        });
        Self::with_fixture(url, options, fixture)
    }

    /// Create a client that falls back to `fixture` instead of the bundled data
    pub fn with_fixture(url: &str, options: ClientOptions, fixture: Fixture) -> Self {
        let session = match &options.session_path {
            Some(path) => SessionContext::new(
                Arc::new(FileSessionStore::new(path.clone())),
                options.session_ttl,
            ),
            None => SessionContext::in_memory(options.session_ttl),
        };

        Self {
            url: url.trim_end_matches('/').to_string(),
            http_client: Client::new(),
            options,
            session,
            fixture: Arc::new(fixture),
        }
    }

    /// Create a client from `CLAIMD_URL` and the `CLAIMD_*` option variables
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("CLAIMD_URL")
            .map_err(|_| Error::config("CLAIMD_URL environment variable is required"))?;
        let options = ClientOptions::from_env()?;
        Ok(Self::new_with_options(&url, options))
    }

    /// The session shared by every dashboard of this client
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The fallback data set
    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    /// Identity resolution against `/api/users`
    pub fn resolver(&self) -> IdentityResolver {
        IdentityResolver::new(
            &self.url,
            self.http_client.clone(),
            self.options.clone(),
            self.fixture.clone(),
        )
    }

    /// Read-only access to applications
    pub fn applications(&self) -> ApplicationRepository {
        ApplicationRepository::new(
            &self.url,
            self.http_client.clone(),
            self.options.clone(),
            self.fixture.clone(),
        )
    }

    /// Approve and deny actions
    pub fn review(&self) -> ReviewActions {
        ReviewActions::new(&self.url, self.http_client.clone(), self.options.clone())
    }

    /// Benefit application submission
    pub fn submissions(&self) -> SubmissionClient {
        SubmissionClient::new(&self.url, self.http_client.clone(), self.options.clone())
    }

    /// A dashboard with its own cancellation token.
    ///
    /// With `parent`, the dashboard's token is a child of it, so cancelling the
    /// parent also cancels the dashboard's requests.
    pub fn dashboard(&self, parent: Option<&CancellationToken>) -> Dashboard {
        let cancel = match parent {
            Some(token) => token.child_token(),
            None => CancellationToken::new(),
        };
        Dashboard::new(
            self.session.clone(),
            self.resolver(),
            self.applications(),
            self.review(),
            cancel,
        )
    }

    /// Probe `GET /api/health`
    pub async fn health(&self) -> Result<HealthStatus> {
        self.submissions().health().await
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::applications::ApplicationFilter;
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::identity::{Role, UserIdentity};
    pub use crate::models::{AdminStatus, Application, Recommendation};
    pub use crate::resolver::Resolution;
    pub use crate::review::ReviewDecision;
    pub use crate::submission::{Attachment, BenefitApplicationForm};
    pub use crate::view::{Dashboard, DashboardView, Route};
    pub use crate::Claimd;
}
