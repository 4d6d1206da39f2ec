//! Error types for clawkit.

use thiserror::Error;

use crate::auth::AuthError;

/// Primary error type for all clawkit operations.
#[derive(Error, Debug)]
pub enum ClawError {
    #[error("Missing prerequisite: {what}\n  {remediation}")]
    MissingPrerequisite { what: String, remediation: String },

    #[error("Port {port} is already in use by another process")]
    PortConflict { port: u16 },

    #[error("Invalid configuration: {0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Google API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Restart rate limit reached: {restarts} restarts within the last {window_secs}s")]
    RateLimited { restarts: usize, window_secs: i64 },

    #[error("Gateway health check failed: {0}")]
    HealthCheck(String),

    #[error("Command `{program}` failed (exit {code:?}): {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout after {0}ms")]
    Timeout(u64),
}

/// Broad error category used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Prerequisite,
    Configuration,
    Authentication,
    Api,
    Watchdog,
    System,
    Io,
}

impl ClawError {
    pub fn missing_prerequisite(what: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self::MissingPrerequisite {
            what: what.into(),
            remediation: remediation.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingPrerequisite { .. } => ErrorCategory::Prerequisite,
            Self::PortConflict { .. } | Self::Validation(_) | Self::Template(_) => {
                ErrorCategory::Configuration
            }
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                _ => ErrorCategory::Api,
            },
            Self::Network(_) | Self::Timeout(_) => ErrorCategory::Api,
            Self::RateLimited { .. } | Self::HealthCheck(_) => ErrorCategory::Watchdog,
            Self::CommandFailed { .. } | Self::Lock(_) => ErrorCategory::System,
            Self::Io(_) | Self::Serialization(_) => ErrorCategory::Io,
        }
    }

    /// Process exit status for this error. Every failure maps to 1.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ClawError>;
