use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Access tokens are treated as expired this many milliseconds early.
pub const EXPIRY_MARGIN_MS: i64 = 60_000;

/// OAuth token as persisted in `~/.openclaw/credentials/<service>-token.json`.
///
/// # Example
/// ```
/// use clawkit::auth::StoredToken;
///
/// let token = StoredToken {
///     access_token: "ya29.access".to_string(),
///     refresh_token: "1//refresh".to_string(),
///     token_type: "Bearer".to_string(),
///     expiry_date: 4_102_444_800_000,
///     scope: "https://www.googleapis.com/auth/drive".to_string(),
/// };
/// assert!(token.is_fresh(0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Absolute expiry in epoch milliseconds.
    pub expiry_date: i64,
    #[serde(default)]
    pub scope: String,
}

impl StoredToken {
    /// Whether the access token may still be used at `now_ms`.
    pub fn is_fresh(&self, now_ms: i64) -> bool {
        now_ms < self.expiry_date - EXPIRY_MARGIN_MS
    }

    /// Milliseconds until the token must be refreshed (negative once due).
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.expiry_date - EXPIRY_MARGIN_MS - now_ms
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

pub(crate) fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(expiry_date: i64) -> StoredToken {
        StoredToken {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            token_type: "Bearer".to_string(),
            expiry_date,
            scope: "s1 s2".to_string(),
        }
    }

    #[test]
    fn freshness_respects_margin() {
        let t = token(1_000_000);
        assert!(t.is_fresh(1_000_000 - EXPIRY_MARGIN_MS - 1));
        assert!(!t.is_fresh(1_000_000 - EXPIRY_MARGIN_MS));
        assert!(!t.is_fresh(1_000_000));
    }

    #[test]
    fn token_type_defaults_to_bearer() {
        let raw = r#"{"access_token":"a","refresh_token":"r","expiry_date":5}"#;
        let parsed: StoredToken = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.token_type, "Bearer");
        assert_eq!(parsed.scope, "");
    }

    #[test]
    fn scopes_split_on_whitespace() {
        let t = token(0);
        assert_eq!(t.scopes().collect::<Vec<_>>(), vec!["s1", "s2"]);
    }
}
