use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::Url;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::callback::CallbackListener;
use super::credentials::ClientCredentials;
use super::error::AuthError;
use super::service::GoogleService;
use super::store::TokenStore;
use super::token::{now_ms, StoredToken};

/// Maximum time the consent flow waits for the browser redirect.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// State carried between building the consent URL and exchanging the code.
#[derive(Debug, Clone)]
pub struct PkceSession {
    pub authorize_url: String,
    pub redirect_uri: String,
    pub state: String,
    pub code_verifier: String,
}

/// Token state as reported by `clawkit auth status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Missing,
    Valid { remaining_ms: i64 },
    /// Access token due for refresh; a refresh token is on file.
    Expired,
}

/// OAuth2 client for one Google service.
///
/// The three Google integrations share this type; only the
/// [`GoogleService`] descriptor (scopes, callback port, token file) differs.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use clawkit::auth::{ClientCredentials, FileTokenStore, GoogleOAuthClient, GoogleService};
///
/// # async fn example() -> Result<(), clawkit::auth::AuthError> {
/// let store = Arc::new(FileTokenStore::new("/home/bot/.openclaw/credentials"));
/// let client = GoogleOAuthClient::new(
///     GoogleService::Gmail,
///     ClientCredentials::new("client-id", "client-secret"),
///     store,
/// );
/// let bearer = client.get_access_token().await?;
/// # let _ = bearer;
/// # Ok(())
/// # }
/// ```
pub struct GoogleOAuthClient {
    client: reqwest::Client,
    service: GoogleService,
    credentials: ClientCredentials,
    token_store: Arc<dyn TokenStore>,
    callback_port: u16,
    callback_timeout: Duration,
}

impl GoogleOAuthClient {
    pub fn new(
        service: GoogleService,
        credentials: ClientCredentials,
        token_store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            service,
            credentials,
            token_store,
            callback_port: service.callback_port(),
            callback_timeout: CALLBACK_TIMEOUT,
        }
    }

    /// Override the callback port (`0` picks a free port).
    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    pub fn service(&self) -> GoogleService {
        self.service
    }

    pub fn token_status(&self) -> Result<TokenStatus, AuthError> {
        let Some(token) = self.token_store.load(self.service.store_key())? else {
            return Ok(TokenStatus::Missing);
        };
        let now = now_ms();
        if token.is_fresh(now) {
            Ok(TokenStatus::Valid {
                remaining_ms: token.remaining_ms(now),
            })
        } else {
            Ok(TokenStatus::Expired)
        }
    }

    /// Return a usable access token, refreshing it first when it is within
    /// the expiry margin.
    pub async fn get_access_token(&self) -> Result<String, AuthError> {
        let token = self.load_token()?;
        if token.is_fresh(now_ms()) {
            return Ok(token.access_token);
        }
        debug!(service = %self.service, "access token expired, refreshing");
        let refreshed = self.refresh(&token).await?;
        Ok(refreshed.access_token)
    }

    /// Refresh regardless of the recorded expiry (after a 401 from an API).
    pub async fn force_refresh(&self) -> Result<String, AuthError> {
        let token = self.load_token()?;
        let refreshed = self.refresh(&token).await?;
        Ok(refreshed.access_token)
    }

    /// Build the consent URL for a given redirect URI.
    pub fn start_auth(&self, redirect_uri: &str) -> Result<PkceSession, AuthError> {
        let state = random_hex(16);
        let code_verifier = generate_code_verifier();
        let code_challenge = compute_code_challenge(&code_verifier);
        let scope = self.service.scopes().join(" ");

        let authorize_url = Url::parse_with_params(
            &self.credentials.auth_uri,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state.as_str()),
                ("code_challenge", code_challenge.as_str()),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| AuthError::InvalidResponse(format!("invalid auth_uri: {e}")))?;

        Ok(PkceSession {
            authorize_url: authorize_url.to_string(),
            redirect_uri: redirect_uri.to_string(),
            state,
            code_verifier,
        })
    }

    /// Exchange an authorization code for tokens and persist them.
    pub async fn exchange_code(
        &self,
        session: &PkceSession,
        code: &str,
    ) -> Result<StoredToken, AuthError> {
        let resp = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("redirect_uri", session.redirect_uri.as_str()),
                ("code_verifier", session.code_verifier.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::ExchangeFailed {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TokenResponse = resp.json().await?;
        let refresh_token = payload
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AuthError::InvalidResponse(
                    "token response has no refresh_token; revoke the app's access and retry"
                        .to_string(),
                )
            })?;
        let token = StoredToken {
            access_token: payload.access_token,
            refresh_token,
            token_type: payload.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expiry_date: now_ms() + payload.expires_in * 1000,
            scope: payload
                .scope
                .unwrap_or_else(|| self.service.scopes().join(" ")),
        };
        self.token_store.save(self.service.store_key(), &token)?;
        info!(service = %self.service, "stored new OAuth token");
        Ok(token)
    }

    /// Interactive consent flow: listen on the callback port, hand the
    /// consent URL to `on_url`, wait for the redirect, exchange and persist.
    pub async fn run_auth_flow_with<F>(&self, on_url: F) -> Result<StoredToken, AuthError>
    where
        F: FnOnce(&PkceSession),
    {
        let listener = CallbackListener::bind(self.callback_port).await?;
        let redirect_uri = format!(
            "http://127.0.0.1:{}/oauth2callback",
            listener.local_port()
        );
        let session = self.start_auth(&redirect_uri)?;
        on_url(&session);
        let code = listener
            .wait_for_code(&session.state, self.callback_timeout)
            .await?;
        self.exchange_code(&session, &code).await
    }

    /// [`run_auth_flow_with`](Self::run_auth_flow_with) that prints the URL
    /// and tries to open a browser.
    pub async fn run_auth_flow(&self) -> Result<StoredToken, AuthError> {
        self.run_auth_flow_with(|session| {
            println!("🔗 Open this URL to authorize {}:", self.service.display_name());
            println!("   {}", session.authorize_url);
            println!(
                "⏳ Waiting up to {}s for the redirect...",
                self.callback_timeout.as_secs()
            );
            let _ = std::process::Command::new("xdg-open")
                .arg(&session.authorize_url)
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn();
        })
        .await
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.token_store.clear(self.service.store_key())
    }

    fn load_token(&self) -> Result<StoredToken, AuthError> {
        self.token_store
            .load(self.service.store_key())?
            .ok_or_else(|| AuthError::NotLoggedIn(self.service.to_string()))
    }

    async fn refresh(&self, token: &StoredToken) -> Result<StoredToken, AuthError> {
        let resp = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", token.refresh_token.as_str()),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::RefreshFailed {
                status: status.as_u16(),
                body,
            });
        }

        let payload: TokenResponse = resp.json().await?;
        let refresh_token = if token.refresh_token.is_empty() {
            payload.refresh_token.unwrap_or_default()
        } else {
            token.refresh_token.clone()
        };
        let refreshed = StoredToken {
            access_token: payload.access_token,
            refresh_token,
            token_type: payload
                .token_type
                .unwrap_or_else(|| token.token_type.clone()),
            expiry_date: now_ms() + payload.expires_in * 1000,
            scope: payload.scope.unwrap_or_else(|| token.scope.clone()),
        };
        self.token_store
            .save(self.service.store_key(), &refreshed)?;
        debug!(service = %self.service, expiry_date = refreshed.expiry_date, "token refreshed");
        Ok(refreshed)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    refresh_token: Option<String>,
    scope: Option<String>,
    token_type: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

pub(crate) fn random_hex(byte_count: usize) -> String {
    let mut buf = vec![0u8; byte_count];
    for chunk in buf.chunks_mut(16) {
        let id = uuid::Uuid::new_v4();
        let len = chunk.len().min(16);
        chunk[..len].copy_from_slice(&id.as_bytes()[..len]);
    }
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

fn generate_code_verifier() -> String {
    let mut buf = [0u8; 32];
    for chunk in buf.chunks_mut(16) {
        let id = uuid::Uuid::new_v4();
        chunk.copy_from_slice(&id.as_bytes()[..chunk.len()]);
    }
    URL_SAFE_NO_PAD.encode(buf)
}

fn compute_code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::FileTokenStore;
    use tempfile::TempDir;

    fn client(dir: &TempDir) -> GoogleOAuthClient {
        GoogleOAuthClient::new(
            GoogleService::Drive,
            ClientCredentials::new("cid", "csecret"),
            Arc::new(FileTokenStore::new(dir.path())),
        )
    }

    #[test]
    fn authorize_url_requests_offline_access() {
        let dir = TempDir::new().unwrap();
        let session = client(&dir)
            .start_auth("http://127.0.0.1:8091/oauth2callback")
            .unwrap();
        let url = Url::parse(&session.authorize_url).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["access_type"], "offline");
        assert_eq!(pairs["prompt"], "consent");
        assert_eq!(pairs["scope"], "https://www.googleapis.com/auth/drive");
        assert_eq!(pairs["state"], session.state);
        assert_eq!(
            pairs["code_challenge"],
            compute_code_challenge(&session.code_verifier)
        );
    }

    #[test]
    fn verifier_and_state_are_random() {
        assert_ne!(generate_code_verifier(), generate_code_verifier());
        let hex = random_hex(16);
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn status_reports_missing_token() {
        let dir = TempDir::new().unwrap();
        assert_eq!(client(&dir).token_status().unwrap(), TokenStatus::Missing);
    }

    #[tokio::test]
    async fn get_access_token_without_token_is_not_logged_in() {
        let dir = TempDir::new().unwrap();
        let err = client(&dir).get_access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::NotLoggedIn(service) if service == "drive"));
    }
}
