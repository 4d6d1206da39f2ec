//! Authenticated HTTP helper shared by the Google API wrappers.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::{AuthError, GoogleOAuthClient};
use crate::error::{ClawError, Result};

/// Source of bearer tokens for API calls.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A token valid for at least the expiry margin.
    async fn access_token(&self) -> std::result::Result<String, AuthError>;
    /// Mint a new token even if the stored one looks fresh.
    async fn refresh_access_token(&self) -> std::result::Result<String, AuthError>;
}

#[async_trait]
impl AccessTokenProvider for GoogleOAuthClient {
    async fn access_token(&self) -> std::result::Result<String, AuthError> {
        self.get_access_token().await
    }

    async fn refresh_access_token(&self) -> std::result::Result<String, AuthError> {
        self.force_refresh().await
    }
}

/// Bearer-authenticated client rooted at one API base URL.
///
/// A 401 triggers one forced token refresh and one replay of the request.
#[derive(Clone)]
pub struct GoogleApi {
    client: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: String,
}

impl GoogleApi {
    pub fn new(tokens: Arc<dyn AccessTokenProvider>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokens,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Same token source, different base URL.
    pub fn with_base_url(&self, base_url: impl Into<String>) -> Self {
        Self::new(self.tokens.clone(), base_url)
    }

    /// `base_url` extended by `segments`, each percent-encoded as a single
    /// path segment so IDs containing `#`, `?` or `/` stay in the path.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let invalid = || ClawError::Validation(format!("invalid API base URL: {}", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send the request built by `build`, replaying it once after a 401.
    pub async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let token = self.tokens.access_token().await?;
        let resp = build(&self.client)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return check_status(resp).await;
        }

        debug!(base_url = %self.base_url, "401 from Google API, refreshing token");
        let token = self.tokens.refresh_access_token().await?;
        let resp = build(&self.client)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            warn!(base_url = %self.base_url, "request still unauthorized after refresh");
        }
        check_status(resp).await
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(segments)?;
        let resp = self.send(|c| c.get(url.clone()).query(query)).await?;
        Ok(resp.json().await?)
    }

    pub async fn get_text(&self, segments: &[&str], query: &[(&str, String)]) -> Result<String> {
        let url = self.url(segments)?;
        let resp = self.send(|c| c.get(url.clone()).query(query)).await?;
        Ok(resp.text().await?)
    }

    pub async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        let resp = self
            .send(|c| c.request(method.clone(), url.clone()).query(query).json(body))
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn delete(&self, segments: &[&str]) -> Result<()> {
        let url = self.url(segments)?;
        self.send(|c| c.delete(url.clone())).await?;
        Ok(())
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClawError::Api {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed;

    #[async_trait]
    impl AccessTokenProvider for Fixed {
        async fn access_token(&self) -> std::result::Result<String, AuthError> {
            Ok("t".to_string())
        }
        async fn refresh_access_token(&self) -> std::result::Result<String, AuthError> {
            Ok("t2".to_string())
        }
    }

    #[test]
    fn url_joins_without_double_slash() {
        let api = GoogleApi::new(Arc::new(Fixed), "https://example.test/v3/");
        assert_eq!(api.url(&["files"]).unwrap().as_str(), "https://example.test/v3/files");
        assert_eq!(
            api.url(&["files", "1"]).unwrap().as_str(),
            "https://example.test/v3/files/1"
        );
    }

    #[test]
    fn ids_are_encoded_as_single_segments() {
        let api = GoogleApi::new(Arc::new(Fixed), "https://example.test/calendar/v3");
        let url = api
            .url(&["calendars", "en.usa#holiday@group.v.calendar.google.com", "events"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.test/calendar/v3/calendars/en.usa%23holiday@group.v.calendar.google.com/events"
        );
        assert_eq!(url.fragment(), None);

        let url = api.url(&["files", "a/b?c"]).unwrap();
        assert_eq!(url.path(), "/calendar/v3/files/a%2Fb%3Fc");
    }

    #[test]
    fn base_url_that_cannot_hold_a_path_is_rejected() {
        let api = GoogleApi::new(Arc::new(Fixed), "not a url");
        assert!(matches!(api.url(&["files"]), Err(ClawError::Validation(_))));
    }
}
