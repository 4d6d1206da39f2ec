mod support;

use std::sync::Arc;
use std::time::Duration;

use clawkit::auth::{
    AuthError, ClientCredentials, GoogleOAuthClient, GoogleService, TokenStatus, EXPIRY_MARGIN_MS,
};
use reqwest::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{now_ms, token, InMemoryTokenStore};

fn client(
    server: &MockServer,
    store: Arc<InMemoryTokenStore>,
    service: GoogleService,
) -> GoogleOAuthClient {
    let credentials = ClientCredentials::new("client-id", "client-secret")
        .with_token_uri(format!("{}/token", server.uri()))
        .with_auth_uri(format!("{}/auth", server.uri()));
    GoogleOAuthClient::new(service, credentials, store)
}

#[tokio::test]
async fn fresh_token_is_returned_without_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryTokenStore::new());
    store.seed("gmail", token("cached", now_ms() + EXPIRY_MARGIN_MS + 60_000));
    let auth = client(&server, store.clone(), GoogleService::Gmail);

    assert_eq!(auth.get_access_token().await.unwrap(), "cached");
    assert!(matches!(auth.token_status().unwrap(), TokenStatus::Valid { .. }));
}

#[tokio::test]
async fn token_inside_margin_is_refreshed_exactly_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=1%2F%2Frefresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryTokenStore::new());
    let stale = token("stale", now_ms() + EXPIRY_MARGIN_MS - 1);
    store.seed("gdrive", stale.clone());
    let auth = client(&server, store.clone(), GoogleService::Drive);

    let before = now_ms();
    assert_eq!(auth.get_access_token().await.unwrap(), "fresh");

    let saved = store.get("gdrive").unwrap();
    assert_eq!(saved.access_token, "fresh");
    assert_eq!(saved.refresh_token, stale.refresh_token);
    assert_eq!(saved.scope, stale.scope);
    assert!(saved.expiry_date >= before + 3_599_000);

    // The refreshed token is fresh, so no second refresh happens.
    assert_eq!(auth.get_access_token().await.unwrap(), "fresh");
}

#[tokio::test]
async fn refresh_failure_surfaces_provider_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryTokenStore::new());
    store.seed("gcal", token("old", 0));
    let auth = client(&server, store.clone(), GoogleService::Calendar);

    match auth.get_access_token().await {
        Err(AuthError::RefreshFailed { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("expected RefreshFailed, got {other:?}"),
    }
    assert_eq!(store.get("gcal").unwrap().access_token, "old");
}

#[tokio::test]
async fn missing_token_is_not_logged_in() {
    let server = MockServer::start().await;
    let auth = client(&server, Arc::new(InMemoryTokenStore::new()), GoogleService::Gmail);
    assert!(matches!(
        auth.get_access_token().await,
        Err(AuthError::NotLoggedIn(_))
    ));
    assert_eq!(auth.token_status().unwrap(), TokenStatus::Missing);
}

#[tokio::test]
async fn consent_url_requests_offline_access_with_pkce() {
    let server = MockServer::start().await;
    let auth = client(&server, Arc::new(InMemoryTokenStore::new()), GoogleService::Calendar);
    let session = auth
        .start_auth(&GoogleService::Calendar.redirect_uri())
        .unwrap();

    let url = Url::parse(&session.authorize_url).unwrap();
    let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
    assert_eq!(params["access_type"], "offline");
    assert_eq!(params["prompt"], "consent");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(params["redirect_uri"], "http://127.0.0.1:8090/oauth2callback");
    assert_eq!(
        params["scope"],
        "https://www.googleapis.com/auth/calendar https://www.googleapis.com/auth/calendar.events"
    );
    assert_eq!(params["state"], session.state);
}

#[tokio::test]
async fn exchange_without_refresh_token_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "a",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryTokenStore::new());
    let auth = client(&server, store.clone(), GoogleService::Gmail);
    let session = auth.start_auth(&GoogleService::Gmail.redirect_uri()).unwrap();

    assert!(matches!(
        auth.exchange_code(&session, "code").await,
        Err(AuthError::InvalidResponse(_))
    ));
    assert!(store.get("gmail").is_none());
}

#[tokio::test]
async fn auth_flow_receives_redirect_and_persists_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=the-code"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.new",
            "refresh_token": "1//new-refresh",
            "expires_in": 3600,
            "scope": "https://www.googleapis.com/auth/drive"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryTokenStore::new());
    let auth = client(&server, store.clone(), GoogleService::Drive)
        .with_callback_port(0)
        .with_callback_timeout(Duration::from_secs(10));

    let browser = Arc::new(std::sync::Mutex::new(None));
    let browser_slot = browser.clone();
    let stored = auth
        .run_auth_flow_with(move |session| {
            let base = session.redirect_uri.clone();
            let state = session.state.clone();
            let handle = tokio::spawn(async move {
                let http = reqwest::Client::new();
                let stray = base.replace("/oauth2callback", "/favicon.ico");
                let not_found = http.get(&stray).send().await.unwrap().status();
                let page = http
                    .get(format!("{base}?code=the-code&state={state}"))
                    .send()
                    .await
                    .unwrap();
                (not_found.as_u16(), page.status().as_u16())
            });
            *browser_slot.lock().unwrap() = Some(handle);
        })
        .await
        .unwrap();

    assert_eq!(stored.access_token, "ya29.new");
    assert_eq!(store.get("gdrive").unwrap().refresh_token, "1//new-refresh");

    let handle = browser.lock().unwrap().take().unwrap();
    assert_eq!(handle.await.unwrap(), (404, 200));
}

#[tokio::test]
async fn auth_flow_rejects_denied_consent() {
    let server = MockServer::start().await;
    let auth = client(&server, Arc::new(InMemoryTokenStore::new()), GoogleService::Gmail)
        .with_callback_port(0)
        .with_callback_timeout(Duration::from_secs(10));

    let result = auth
        .run_auth_flow_with(|session| {
            let url = format!("{}?error=access_denied", session.redirect_uri);
            tokio::spawn(async move {
                let _ = reqwest::get(url).await;
            });
        })
        .await;

    assert!(matches!(result, Err(AuthError::AccessDenied(e)) if e == "access_denied"));
}

#[tokio::test]
async fn auth_flow_times_out_without_redirect() {
    let server = MockServer::start().await;
    let auth = client(&server, Arc::new(InMemoryTokenStore::new()), GoogleService::Gmail)
        .with_callback_port(0)
        .with_callback_timeout(Duration::from_millis(200));

    assert!(matches!(
        auth.run_auth_flow_with(|_| {}).await,
        Err(AuthError::CallbackTimeout(_))
    ));
}
