//! Read-only access to benefit applications

use log::{debug, warn};
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::{encode_segment, Fetch};
use crate::fixture::Fixture;
use crate::models::{Application, ApplicationsEnvelope, Recommendation};

/// Client for the application listing endpoints
pub struct ApplicationRepository {
    url: String,
    client: Client,
    options: ClientOptions,
    fixture: Arc<Fixture>,
}

impl ApplicationRepository {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions, fixture: Arc<Fixture>) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
            fixture,
        }
    }

    fn get_url(&self, path: &str) -> String {
        format!("{}/api{}", self.url, path)
    }

    fn may_fall_back(&self, err: &Error) -> bool {
        self.options.fallback_to_fixture && err.is_transport()
    }

    /// Applications belonging to one user, in service order.
    ///
    /// An unknown user yields an empty list rather than an error.
    pub async fn list_for_user(
        &self,
        identifier_or_name: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<Application>> {
        let key = identifier_or_name.trim();
        if key.is_empty() {
            return Err(Error::invalid_input("identifier or name is required"));
        }

        let url = self.get_url(&format!("/user/applications/{}", encode_segment(key)));
        let result = Fetch::get(&self.client, &url)
            .timeout(self.options.request_timeout)
            .cancel_on(cancel)
            .execute::<ApplicationsEnvelope>()
            .await;

        match result {
            Ok(envelope) if envelope.success => Ok(envelope.applications),
            Ok(envelope) => {
                debug!(
                    "no applications for user: {}",
                    envelope.error.as_deref().unwrap_or("unsuccessful lookup")
                );
                Ok(Vec::new())
            }
            Err(Error::NotFound(_)) => Ok(Vec::new()),
            Err(e) if self.may_fall_back(&e) => {
                warn!("application listing unavailable ({}), using bundled fixture", e);
                Ok(self.fixture.applications_for(key))
            }
            Err(e) => Err(e),
        }
    }

    /// Every application, for the admin dashboard
    pub async fn list_all(&self, cancel: Option<&CancellationToken>) -> Result<Vec<Application>> {
        let url = self.get_url("/applications");
        let result = Fetch::get(&self.client, &url)
            .timeout(self.options.request_timeout)
            .cancel_on(cancel)
            .execute::<Vec<Application>>()
            .await;

        match result {
            Ok(apps) => Ok(apps),
            Err(e) if self.may_fall_back(&e) => {
                warn!("application listing unavailable ({}), using bundled fixture", e);
                Ok(self.fixture.all_applications())
            }
            Err(e) => Err(e),
        }
    }

    /// A single application; its document payload is already normalized
    pub async fn get_by_id(
        &self,
        application_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Application> {
        if application_id.trim().is_empty() {
            return Err(Error::invalid_input("application id is required"));
        }

        let url = self.get_url(&format!("/applications/{}", encode_segment(application_id)));
        let result = Fetch::get(&self.client, &url)
            .timeout(self.options.request_timeout)
            .cancel_on(cancel)
            .execute::<Application>()
            .await;

        match result {
            Ok(app) => Ok(app),
            Err(Error::NotFound(_)) => Err(Error::NotFound(application_id.to_string())),
            Err(e) if self.may_fall_back(&e) => {
                warn!("application lookup unavailable ({}), using bundled fixture", e);
                self.fixture
                    .application(application_id)
                    .ok_or_else(|| Error::NotFound(application_id.to_string()))
            }
            Err(e) => Err(e),
        }
    }
}

/// Admin dashboard search and recommendation filter
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    /// Case-insensitive substring of applicant name or application id
    pub search: Option<String>,

    /// Only applications with this recommendation
    pub recommendation: Option<Recommendation>,
}

impl ApplicationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_lowercase());
        self
    }

    pub fn with_recommendation(mut self, recommendation: Recommendation) -> Self {
        self.recommendation = Some(recommendation);
        self
    }

    /// Whether any criterion is set
    pub fn is_active(&self) -> bool {
        self.search.is_some() || self.recommendation.is_some()
    }

    pub fn matches(&self, app: &Application) -> bool {
        let search_ok = match &self.search {
            Some(term) => {
                app.applicant_name
                    .as_deref()
                    .map(|n| n.to_lowercase().contains(term.as_str()))
                    .unwrap_or(false)
                    || app.application_id.to_lowercase().contains(term.as_str())
            }
            None => true,
        };
        let recommendation_ok = self
            .recommendation
            .map_or(true, |r| app.recommendation == r);
        search_ok && recommendation_ok
    }

    /// Keep only the matching applications, preserving order
    pub fn apply<'a>(&self, apps: &'a [Application]) -> Vec<&'a Application> {
        apps.iter().filter(|a| self.matches(a)).collect()
    }
}
