//! Error types for the chat routing pipeline
//!
//! `AgentError` is what callers of the pipeline and the HTTP layer see.
//! `StageError` is the failure type of a single Handler, Composer or backend
//! call; the orchestrator converts it into a generic response instead of
//! propagating it.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;
use warp::http::StatusCode;

/// Pipeline stage that produced a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Handler,
    Composer,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Handler => "handler",
            StageKind::Composer => "composer",
        };
        f.write_str(name)
    }
}

/// Failure raised by a Handler, Composer or handler backend
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct StageError {
    pub message: String,
}

impl StageError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Main error type for pipeline and server operations
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Stage {stage} failed: {message}")]
    StageFailed { stage: StageKind, message: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Internal error: {message}")]
    InternalError { message: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

impl AgentError {
    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create stage failure error
    pub fn stage_failed<S: Into<String>>(stage: StageKind, message: S) -> Self {
        Self::StageFailed {
            stage,
            message: message.into(),
        }
    }

    /// Create internal error
    pub fn internal_error<S: Into<String>>(message: S) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// HTTP status this error maps to at the transport boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            AgentError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            AgentError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AgentError::StageFailed { .. }
            | AgentError::InternalError { .. }
            | AgentError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Caller-facing detail text, sanitized
    pub fn detail(&self) -> String {
        sanitize_error_message(&self.to_string())
    }
}

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(password|token|key|secret)[=:]\s*\S+").expect("secret pattern is valid")
});

static SECRET_PATH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/[a-zA-Z0-9._/-]+/(secrets?|\.ssh|\.aws|\.config)/[a-zA-Z0-9._/-]+")
        .expect("secret path pattern is valid")
});

const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Redact credentials and secret paths and cap the length of an error message
pub fn sanitize_error_message(message: &str) -> String {
    let sanitized = SECRET_PATTERN.replace_all(message, "${1}=***");
    let mut sanitized = SECRET_PATH_PATTERN
        .replace_all(&sanitized, "/***REDACTED***/")
        .to_string();

    if sanitized.len() > MAX_ERROR_MESSAGE_LEN {
        let truncate_suffix = "...[truncated]";
        let mut cut = MAX_ERROR_MESSAGE_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str(truncate_suffix);
    }

    sanitized
}

/// Result type for pipeline operations
pub type AgentResult<T> = Result<T, AgentError>;
