//! Records exchanged with the Claimd service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::{self, DocumentPayload, DocumentSource};
use crate::identity::Identifier;

/// Upstream classification attached to an application. Never computed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    Deny,
    FurtherReview,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Recommendation {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Approve => "approve",
            Recommendation::Deny => "deny",
            Recommendation::FurtherReview => "further_review",
            Recommendation::Unknown => "unknown",
        }
    }

    /// Parse a wire name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(Recommendation::Approve),
            "deny" => Some(Recommendation::Deny),
            "further_review" | "further review" => Some(Recommendation::FurtherReview),
            _ => None,
        }
    }

    /// Human label, e.g. `further review`
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer-set status, tracked separately from the upstream recommendation.
///
/// An application with no status is `UNSET`; see [`AdminStatus::can_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminStatus {
    #[serde(alias = "PENDING")]
    Pending,
    #[serde(alias = "UNDER_REVIEW")]
    UnderReview,
    #[serde(alias = "APPROVED")]
    Approved,
    #[serde(alias = "DENIED")]
    Denied,
}

impl AdminStatus {
    /// Whether `from -> to` is a legal move. `None` is the unset state.
    pub fn can_transition(from: Option<AdminStatus>, to: AdminStatus) -> bool {
        use AdminStatus::*;
        match (from, to) {
            (None, Pending | UnderReview) => true,
            (Some(Pending), UnderReview) => true,
            (None | Some(Pending) | Some(UnderReview), Approved | Denied) => true,
            _ => false,
        }
    }

    /// Whether the status is final
    pub fn is_terminal(&self) -> bool {
        matches!(self, AdminStatus::Approved | AdminStatus::Denied)
    }
}

/// Coarse bucket for the upstream confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn of(confidence: f64) -> Self {
        if confidence >= 0.8 {
            ConfidenceBand::High
        } else if confidence >= 0.6 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }
}

/// A benefit application as the service reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    /// Opaque unique id, also used as a route key
    pub application_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicant_name: Option<String>,

    #[serde(default, alias = "applicant_ssn", skip_serializing_if = "Option::is_none")]
    pub applicant_identifier: Option<String>,

    /// Document references or URLs
    #[serde(default)]
    pub documents: Vec<String>,

    /// Inline PDF payload, decoded at the edge
    #[serde(
        default,
        deserialize_with = "document::deserialize_payload",
        skip_serializing
    )]
    pub document: Option<DocumentPayload>,

    #[serde(alias = "claude_confidence_level", default)]
    pub confidence_level: f64,

    #[serde(alias = "claude_summary", default)]
    pub summary: String,

    #[serde(alias = "claude_recommendation", default)]
    pub recommendation: Recommendation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_status: Option<AdminStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<DateTime<Utc>>,
}

impl Application {
    /// Confidence as a whole percentage, clamped to 0..=100
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence_level.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    pub fn confidence_band(&self) -> ConfidenceBand {
        ConfidenceBand::of(self.confidence_level)
    }

    /// The inline document as a displayable source, if one was recognized
    pub fn document_source(&self) -> Option<DocumentSource> {
        self.document.clone().map(DocumentPayload::into_source)
    }

    /// First eight characters of the id, for list displays
    pub fn short_id(&self) -> &str {
        match self.application_id.char_indices().nth(8) {
            Some((idx, _)) => &self.application_id[..idx],
            None => &self.application_id,
        }
    }

    /// Applicant identifier with all but the last four digits hidden
    pub fn masked_identifier(&self) -> String {
        Identifier::masked(self.applicant_identifier.as_deref().unwrap_or(""))
    }
}

/// A user record with its applications
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseUser {
    pub name: String,

    #[serde(alias = "ssn", alias = "socialSecurityNumber")]
    pub identifier: String,

    #[serde(default)]
    pub applications: Vec<Application>,
}

impl DatabaseUser {
    /// Whether this user matches a submitted name and identifier
    pub fn matches(&self, name: &str, identifier: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
            && Identifier::matches(&self.identifier, identifier)
    }
}

/// Result of an approve or deny call, reported verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// `GET /api/user/applications/{identifier}` body
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApplicationsEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub error: Option<String>,
}
