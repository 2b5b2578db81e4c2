//! Failure taxonomy for workflow steps.
//!
//! Every step failure is a [`StepError`]. Its [`ErrorClass`] decides whether the
//! retry policy tries again:
//!
//! | variant     | class          | retried |
//! |-------------|----------------|---------|
//! | `Transport` | `Transient`    | yes     |
//! | `Protocol`  | `Unclassified` | yes     |
//! | `Handoff`   | `Terminal`     | no      |
//! | `Domain`    | `Terminal`     | no      |

use thiserror::Error;

/// Retry classification of a step failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network or timeout failure; plausibly resolved by trying again.
    Transient,
    /// Business-rule failure; retrying cannot change the outcome.
    Terminal,
    /// Unexpected or unparseable response; retried like a transient failure.
    Unclassified,
}

impl ErrorClass {
    /// Returns true when the retry policy may attempt the step again.
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorClass::Terminal)
    }
}

/// Failure raised by a transport capability before any response was read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to build request: {0}")]
    InvalidRequest(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("wait interrupted before completion")]
    Interrupted,
}

/// The server answered, but not in a shape the step understands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("malformed {context} payload: {reason}")]
    MalformedPayload { context: String, reason: String },

    #[error("unable to parse date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },
}

impl ProtocolError {
    /// Convenience constructor for payload decoding failures.
    pub fn malformed(context: impl Into<String>, reason: impl ToString) -> Self {
        ProtocolError::MalformedPayload {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures in the authentication handshake.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandoffError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("session corrupted; the login form was reached outside of a handshake")]
    SessionCorrupted,

    #[error("login rejected: {0}")]
    Rejected(String),

    #[error("response did not contain the expected '{field}' token")]
    MissingHandoffToken { field: String },
}

/// Business-rule outcomes that end a step for good.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("course search was unsuccessful")]
    SearchUnsuccessful,

    #[error("no results found")]
    NoResults,

    #[error("not eligible to register: {}", .messages.join("; "))]
    NotEligible { messages: Vec<String> },

    #[error("every registration item was rejected: {}", .messages.join("; "))]
    AllItemsRejected { messages: Vec<String> },

    #[error("missing prerequisite state '{0}'")]
    MissingState(String),
}

/// Error returned by a single step attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Handoff(#[from] HandoffError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl StepError {
    /// Classification used by the retry policy.
    pub fn class(&self) -> ErrorClass {
        match self {
            StepError::Transport(_) => ErrorClass::Transient,
            StepError::Protocol(_) => ErrorClass::Unclassified,
            StepError::Handoff(_) | StepError::Domain(_) => ErrorClass::Terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.class() == ErrorClass::Terminal
    }
}
