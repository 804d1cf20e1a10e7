//! Approve and deny actions
//!
//! Each call is exactly one request: no retry, no local patching of list
//! state and no deduplication. Calling `approve` twice sends two requests.

use log::{info, warn};
use reqwest::Client;
use std::fmt;
use tokio_util::sync::CancellationToken;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::{encode_segment, Fetch};
use crate::models::{AdminStatus, ReviewOutcome};

/// A reviewer decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Deny,
}

impl ReviewDecision {
    fn path_segment(&self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::Deny => "deny",
        }
    }

    /// Status the application ends up in once the decision is accepted
    pub fn resulting_status(&self) -> AdminStatus {
        match self {
            ReviewDecision::Approve => AdminStatus::Approved,
            ReviewDecision::Deny => AdminStatus::Denied,
        }
    }
}

impl fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

/// Client for the admin review endpoints
pub struct ReviewActions {
    url: String,
    client: Client,
    options: ClientOptions,
}

impl ReviewActions {
    pub(crate) fn new(url: &str, client: Client, options: ClientOptions) -> Self {
        Self {
            url: url.to_string(),
            client,
            options,
        }
    }

    fn get_url(&self, application_id: &str, decision: ReviewDecision) -> String {
        format!(
            "{}/api/applications/{}/{}",
            self.url,
            encode_segment(application_id),
            decision.path_segment()
        )
    }

    /// Approve an application
    pub async fn approve(
        &self,
        application_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<ReviewOutcome> {
        self.decide(application_id, ReviewDecision::Approve, cancel).await
    }

    /// Deny an application
    pub async fn deny(
        &self,
        application_id: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<ReviewOutcome> {
        self.decide(application_id, ReviewDecision::Deny, cancel).await
    }

    /// Send a decision. A `success: false` answer becomes [`Error::Review`].
    pub async fn decide(
        &self,
        application_id: &str,
        decision: ReviewDecision,
        cancel: Option<&CancellationToken>,
    ) -> Result<ReviewOutcome> {
        if application_id.trim().is_empty() {
            return Err(Error::invalid_input("application id is required"));
        }

        let url = self.get_url(application_id, decision);
        let outcome = Fetch::post(&self.client, &url)
            .timeout(self.options.request_timeout)
            .cancel_on(cancel)
            .execute::<ReviewOutcome>()
            .await?;

        if !outcome.success {
            warn!("{} of {} rejected: {}", decision, application_id, outcome.message);
            return Err(Error::review(if outcome.message.is_empty() {
                format!("failed to {} application", decision)
            } else {
                outcome.message
            }));
        }

        info!("{} of {} accepted", decision, application_id);
        Ok(outcome)
    }
}
