//! Google OAuth2 consent flow, token refresh and token storage.

pub mod callback;
pub mod client;
pub mod credentials;
pub mod error;
pub mod service;
pub mod store;
pub mod token;

pub use client::{GoogleOAuthClient, PkceSession, TokenStatus, CALLBACK_TIMEOUT};
pub use credentials::ClientCredentials;
pub use error::AuthError;
pub use service::GoogleService;
pub use store::{FileTokenStore, TokenStore};
pub use token::{StoredToken, EXPIRY_MARGIN_MS};
