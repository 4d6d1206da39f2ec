//! CLI auth command handlers for login, status, and logout.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::token::now_ms;
use crate::auth::{GoogleOAuthClient, GoogleService, TokenStore};
use crate::config::parse_service;
use crate::context::Toolkit;
use crate::error::Result;

/// Google OAuth client for `service` backed by the toolkit's token store.
pub fn oauth_client(tk: &Toolkit, service: GoogleService) -> Result<GoogleOAuthClient> {
    let credentials = tk.settings.google_credentials(&tk.paths)?;
    Ok(GoogleOAuthClient::new(
        service,
        credentials,
        Arc::new(tk.paths.token_store()),
    ))
}

/// Handle `clawkit auth login <service>`.
pub async fn handle_login(tk: &Toolkit, service: &str) -> Result<()> {
    let service = parse_service(service)?;
    let client = oauth_client(tk, service)?;
    client.run_auth_flow().await?;
    tk.reporter.ok(format!(
        "{} authorized; token saved to {}",
        service.display_name(),
        tk.paths.token_store().token_path(service.store_key()).display()
    ));
    Ok(())
}

/// Handle `clawkit auth status`.
pub fn handle_status(tk: &Toolkit) -> Result<()> {
    let store = tk.paths.token_store();
    let now = now_ms();
    for service in GoogleService::ALL {
        let name = service.display_name();
        match store.load(service.store_key()) {
            Ok(Some(token)) if token.is_fresh(now) => {
                let expires = DateTime::<Utc>::from_timestamp_millis(token.expiry_date)
                    .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_default();
                tk.reporter.ok(format!("{name}: logged in (expires {expires})"));
            }
            Ok(Some(_)) => tk
                .reporter
                .info(format!("{name}: token expired, refreshed on next use")),
            Ok(None) => tk.reporter.warn(format!("{name}: not logged in")),
            Err(e) => tk.reporter.warn(format!("{name}: {e}")),
        }
    }

    let has_env_credentials =
        tk.settings.google_client_id.is_some() && tk.settings.google_client_secret.is_some();
    if has_env_credentials {
        tk.reporter.ok("OAuth client: GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET");
    } else if tk.paths.google_client_file().exists() {
        tk.reporter.ok(format!(
            "OAuth client: {}",
            tk.paths.google_client_file().display()
        ));
    } else {
        tk.reporter.warn("OAuth client: not configured");
    }
    Ok(())
}

/// Handle `clawkit auth logout <service>`.
pub fn handle_logout(tk: &Toolkit, service: &str) -> Result<()> {
    let service = parse_service(service)?;
    tk.paths.token_store().clear(service.store_key())?;
    tk.reporter
        .ok(format!("logged out from {}", service.display_name()));
    Ok(())
}
