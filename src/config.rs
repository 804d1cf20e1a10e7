//! Configuration options for the Claimd client

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info};

use crate::error::{Error, Result};

/// Seven days, the shorter of the two expiries the sign-in screens used.
pub const SESSION_TTL_WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Thirty days, the longer of the two expiries the sign-in screens used.
pub const SESSION_TTL_MONTH: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Configuration options for the Claimd client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// How long a saved sign-in stays valid
    pub session_ttl: Duration,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Whether read paths may serve the bundled fixture when the service is unreachable
    pub fallback_to_fixture: bool,

    /// Secondary credential that, paired with the `admin` user name, grants the admin role
    pub admin_identifier: Option<String>,

    /// Where the file-backed session jar lives; in-memory when unset
    pub session_path: Option<PathBuf>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            session_ttl: SESSION_TTL_WEEK,
            request_timeout: Some(Duration::from_secs(30)),
            fallback_to_fixture: true,
            admin_identifier: None,
            session_path: None,
        }
    }
}

impl ClientOptions {
    /// Build options from `CLAIMD_*` environment variables, starting from the defaults.
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();

        if let Some(days) = parse_var::<u64>("CLAIMD_SESSION_TTL_DAYS")? {
            options.session_ttl = ttl_from_days(days)?;
        }
        if let Some(secs) = parse_var::<u64>("CLAIMD_REQUEST_TIMEOUT_SECS")? {
            options.request_timeout = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }
        if let Some(fallback) = parse_var::<bool>("CLAIMD_FALLBACK_TO_FIXTURE")? {
            options.fallback_to_fixture = fallback;
        }
        if let Some(admin) = read_var("CLAIMD_ADMIN_IDENTIFIER") {
            options.admin_identifier = Some(admin);
        }
        if let Some(path) = read_var("CLAIMD_SESSION_PATH") {
            options.session_path = Some(PathBuf::from(path));
        }

        Ok(options)
    }

    /// Set how long a saved sign-in stays valid
    pub fn with_session_ttl(mut self, value: Duration) -> Self {
        self.session_ttl = value;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set whether read paths fall back to the bundled fixture
    pub fn with_fallback_to_fixture(mut self, value: bool) -> Self {
        self.fallback_to_fixture = value;
        self
    }

    /// Set the admin secondary credential
    pub fn with_admin_identifier(mut self, value: &str) -> Self {
        self.admin_identifier = Some(value.to_string());
        self
    }

    /// Persist sessions to a file instead of memory
    pub fn with_session_path<P: Into<PathBuf>>(mut self, value: P) -> Self {
        self.session_path = Some(value.into());
        self
    }
}

fn ttl_from_days(days: u64) -> Result<Duration> {
    if days == 0 {
        return Err(Error::config("CLAIMD_SESSION_TTL_DAYS must be at least 1"));
    }
    days.checked_mul(24 * 60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| Error::config(format!("CLAIMD_SESSION_TTL_DAYS value {days} is too large")))
}

fn read_var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => {
            debug!("{key} not set, using default");
            None
        }
    }
}

fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match read_var(key) {
        Some(raw) => {
            let value = raw
                .parse::<T>()
                .map_err(|e| Error::config(format!("invalid {key} value {raw:?}: {e}")))?;
            info!("{key} overrides the default");
            Ok(Some(value))
        }
        None => Ok(None),
    }
}
