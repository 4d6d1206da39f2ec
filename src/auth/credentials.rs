use std::path::Path;

use serde::Deserialize;

use super::error::AuthError;

pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration used for every Google service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_uri: GOOGLE_AUTH_URI.to_string(),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
        }
    }

    pub fn with_token_uri(mut self, uri: impl Into<String>) -> Self {
        self.token_uri = uri.into();
        self
    }

    pub fn with_auth_uri(mut self, uri: impl Into<String>) -> Self {
        self.auth_uri = uri.into();
        self
    }

    /// Resolve credentials from explicit values first, then from the JSON
    /// file downloaded from the Google Cloud console.
    pub fn resolve(
        client_id: Option<&str>,
        client_secret: Option<&str>,
        client_file: &Path,
    ) -> Result<Self, AuthError> {
        let id = client_id.map(str::trim).filter(|v| !v.is_empty());
        let secret = client_secret.map(str::trim).filter(|v| !v.is_empty());
        if let (Some(id), Some(secret)) = (id, secret) {
            return Ok(Self::new(id, secret));
        }
        match Self::from_file(client_file)? {
            Some(creds) => Ok(creds),
            None => Err(AuthError::MissingClientCredentials(format!(
                "set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET in .env, or save the OAuth \
                 client JSON from the Google Cloud console as {}",
                client_file.display()
            ))),
        }
    }

    /// Parse a console download (`{"installed": {...}}` or `{"web": {...}}`).
    pub fn from_file(path: &Path) -> Result<Option<Self>, AuthError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let file: ClientFile = serde_json::from_str(&raw)?;
        let Some(entry) = file.installed.or(file.web) else {
            return Err(AuthError::InvalidResponse(format!(
                "{} has neither an \"installed\" nor a \"web\" client",
                path.display()
            )));
        };
        Ok(Some(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret,
            auth_uri: entry.auth_uri.unwrap_or_else(|| GOOGLE_AUTH_URI.to_string()),
            token_uri: entry.token_uri.unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string()),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct ClientFile {
    installed: Option<ClientEntry>,
    web: Option<ClientEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientEntry {
    client_id: String,
    client_secret: String,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}
