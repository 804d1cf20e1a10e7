//! Applicant identity and identifier normalization

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Number of digits in a well-formed identifier
pub const IDENTIFIER_DIGITS: usize = 9;

/// Helpers for the 9-digit applicant identifier.
///
/// Comparison always happens on the digit-only form, so `123-45-6789`
/// and `123456789` are the same identifier.
pub struct Identifier;

impl Identifier {
    /// Strip every non-digit character.
    pub fn normalize(raw: &str) -> String {
        raw.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    /// Whether two identifiers are equal once normalized.
    pub fn matches(a: &str, b: &str) -> bool {
        Self::normalize(a) == Self::normalize(b)
    }

    /// Whether `raw` normalizes to exactly nine digits.
    pub fn is_complete(raw: &str) -> bool {
        Self::normalize(raw).len() == IDENTIFIER_DIGITS
    }

    /// Display form with separators after the third and fifth digit.
    ///
    /// Works on partial input too, which is how the sign-in field formats
    /// as the user types: `1234` renders as `123-4`.
    pub fn display(raw: &str) -> String {
        let digits: String = Self::normalize(raw).chars().take(IDENTIFIER_DIGITS).collect();
        match digits.len() {
            0..=3 => digits,
            4..=5 => format!("{}-{}", &digits[..3], &digits[3..]),
            _ => format!("{}-{}-{}", &digits[..3], &digits[3..5], &digits[5..]),
        }
    }

    /// Masked form showing only the last four digits.
    pub fn masked(raw: &str) -> String {
        let digits = Self::normalize(raw);
        if digits.len() < 4 {
            return "***-**-****".to_string();
        }
        format!("***-**-{}", &digits[digits.len() - 4..])
    }
}

/// Role attached to a stored identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A benefit applicant
    User,
    /// A reviewer with access to approve/deny
    Admin,
}

/// The signed-in identity persisted in the session jar.
///
/// Never mutated in place: sign-in creates a fresh value, sign-out drops it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Free-text name, compared case-insensitively
    pub name: String,

    /// Identifier in the form it was submitted
    #[serde(alias = "ssn")]
    pub identifier: String,

    /// Optional role tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserIdentity {
    /// Create an identity without a role tag
    pub fn new(name: &str, identifier: &str) -> Self {
        Self {
            name: name.to_string(),
            identifier: identifier.to_string(),
            role: None,
        }
    }

    /// Build an identity from sign-in form input, trimming both fields.
    pub fn from_submission(name: &str, identifier: &str) -> Result<Self> {
        let name = name.trim();
        let identifier = identifier.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("name is required"));
        }
        if identifier.is_empty() {
            return Err(Error::invalid_input("identifier is required"));
        }
        Ok(Self::new(name, identifier))
    }

    /// Attach a role tag
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Whether the identity carries the admin role
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }

    /// Digit-only identifier
    pub fn normalized_identifier(&self) -> String {
        Identifier::normalize(&self.identifier)
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, Identifier::masked(&self.identifier))
    }
}
