use std::fs;
use std::path::{Path, PathBuf};

use super::error::AuthError;
use super::token::StoredToken;
use crate::util::fs::write_with_mode;

/// Storage abstraction for persisted OAuth tokens, keyed by service.
pub trait TokenStore: Send + Sync {
    fn load(&self, service: &str) -> Result<Option<StoredToken>, AuthError>;
    fn save(&self, service: &str, token: &StoredToken) -> Result<(), AuthError>;
    fn clear(&self, service: &str) -> Result<(), AuthError>;
}

/// File-backed token store writing `<service>-token.json` files.
///
/// # Example
/// ```no_run
/// use clawkit::auth::{FileTokenStore, StoredToken, TokenStore};
///
/// let store = FileTokenStore::new("/home/bot/.openclaw/credentials");
/// let token = StoredToken {
///     access_token: "access".to_string(),
///     refresh_token: "refresh".to_string(),
///     token_type: "Bearer".to_string(),
///     expiry_date: 0,
///     scope: String::new(),
/// };
/// store.save("gmail", &token)?;
/// # Ok::<(), clawkit::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    base_dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn token_path(&self, service: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}-token.json", normalize_label(service)))
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
            }
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, service: &str) -> Result<Option<StoredToken>, AuthError> {
        let path = self.token_path(service);
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(AuthError::Io(err.to_string())),
        };
        let token: StoredToken = serde_json::from_str(&raw)?;
        Ok(Some(token))
    }

    fn save(&self, service: &str, token: &StoredToken) -> Result<(), AuthError> {
        let path = self.token_path(service);
        Self::ensure_parent(&path)?;
        let serialized = serde_json::to_string_pretty(token)?;
        write_with_mode(&path, serialized.as_bytes(), 0o600)?;
        Ok(())
    }

    fn clear(&self, service: &str) -> Result<(), AuthError> {
        let path = self.token_path(service);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AuthError::Io(err.to_string())),
        }
    }
}

fn normalize_label(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.chars() {
        let lower = ch.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '-' {
            out.push(lower);
        } else {
            out.push('-');
        }
    }
    if out.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        out
    }
}
