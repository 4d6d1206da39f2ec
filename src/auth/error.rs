use thiserror::Error;

/// Normalized authentication errors across Google services.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in (run `clawkit auth login {0}`)")]
    NotLoggedIn(String),
    #[error("Google client credentials not configured: {0}")]
    MissingClientCredentials(String),
    #[error("Token refresh failed (status {status}): {body}")]
    RefreshFailed { status: u16, body: String },
    #[error("Token exchange failed (status {status}): {body}")]
    ExchangeFailed { status: u16, body: String },
    #[error("Authorization denied by provider: {0}")]
    AccessDenied(String),
    #[error("OAuth state mismatch")]
    StateMismatch,
    #[error("No OAuth callback received within {0}s")]
    CallbackTimeout(u64),
    #[error("Unsupported service: {0}")]
    Unsupported(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
