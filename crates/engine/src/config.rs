//! Run configuration shared by every workflow.

use std::fmt;
use std::time::Duration;

use chrono_tz::Tz;
use thiserror::Error;

use crate::executor::RetryPolicy;

/// Time zone eligibility timestamps are written in.
pub const DEFAULT_REFERENCE_TIME_ZONE: Tz = chrono_tz::America::Los_Angeles;
/// Extra wait after an eligibility window opens.
pub const DEFAULT_ELIGIBILITY_MARGIN: Duration = Duration::from_secs(5);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("retry attempts must be at least 1")]
    InvalidAttempts,

    #[error("unknown time zone '{0}'")]
    UnknownTimeZone(String),

    #[error("unknown campus '{0}'; expected foothill or deanza")]
    UnknownCampus(String),

    #[error("unknown quarter '{0}'; expected summer, fall, winter, or spring")]
    UnknownQuarter(String),

    #[error("missing required setting '{0}'")]
    Missing(&'static str),
}

/// Validated knobs consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub retry: RetryPolicy,
    pub reference_time_zone: Tz,
    pub eligibility_margin: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            reference_time_zone: DEFAULT_REFERENCE_TIME_ZONE,
            eligibility_margin: DEFAULT_ELIGIBILITY_MARGIN,
        }
    }
}

impl WorkflowConfig {
    /// Validates raw settings.
    ///
    /// # Errors
    ///
    /// `InvalidAttempts` when `max_attempts` is zero and `UnknownTimeZone`
    /// when `time_zone` is not an IANA identifier.
    pub fn new(max_attempts: u32, retry_delay: Duration, time_zone: &str, eligibility_margin: Duration) -> Result<Self, ConfigError> {
        let retry = RetryPolicy::new(max_attempts, retry_delay).ok_or(ConfigError::InvalidAttempts)?;
        let reference_time_zone = time_zone
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimeZone(time_zone.to_string()))?;
        Ok(Self {
            retry,
            reference_time_zone,
            eligibility_margin,
        })
    }
}

/// Campus login. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// What the search workflow looks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTarget {
    pub term_id: String,
    pub subject: String,
}

/// What the signup workflow registers for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupTarget {
    pub term_id: String,
    pub crns: Vec<String>,
}

impl SignupTarget {
    /// Parses a comma or whitespace separated CRN list, dropping blanks and duplicates.
    pub fn new(term_id: impl Into<String>, crns: &str) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for crn in crns.split([',', ' ', '\t', '\n']).map(str::trim).filter(|crn| !crn.is_empty()) {
            if !unique.iter().any(|existing| existing == crn) {
                unique.push(crn.to_string());
            }
        }
        Self {
            term_id: term_id.into(),
            crns: unique,
        }
    }

    /// Splits into one target per CRN for isolated runs.
    pub fn split(&self) -> Vec<SignupTarget> {
        self.crns
            .iter()
            .map(|crn| SignupTarget {
                term_id: self.term_id.clone(),
                crns: vec![crn.clone()],
            })
            .collect()
    }
}
