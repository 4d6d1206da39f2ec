//! Configuration system (layered: CLI flags > `.env` file > process env > defaults).

pub mod env_file;

pub use env_file::EnvFile;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::auth::{AuthError, ClientCredentials, FileTokenStore, GoogleService};
use crate::error::{ClawError, Result};

pub const DEFAULT_GATEWAY_PORT: u16 = 18789;
pub const DEFAULT_BACKUP_RETENTION_DAYS: u32 = 7;
pub const DEFAULT_MAX_RESTARTS: usize = 3;
pub const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4-5";
pub const GATEWAY_UNIT: &str = "openclaw-gateway.service";

/// Keys that must be present (and non-blank) for `setup`.
pub const REQUIRED_KEYS: [&str; 3] = ["BOT_NAME", "ANTHROPIC_API_KEY", "TELEGRAM_BOT_TOKEN"];

/// Every on-disk location the toolkit reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolkitPaths {
    pub home: PathBuf,
    /// `~/.openclaw`
    pub state_dir: PathBuf,
    /// `~/.openclaw-backups`
    pub backup_dir: PathBuf,
    /// `~/.config/systemd/user`
    pub systemd_user_dir: PathBuf,
}

impl ToolkitPaths {
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            state_dir: home.join(".openclaw"),
            backup_dir: home.join(".openclaw-backups"),
            systemd_user_dir: home.join(".config").join("systemd").join("user"),
            home,
        }
    }

    /// Resolve from the user's home directory, honouring `OPENCLAW_HOME` and
    /// `CLAWKIT_BACKUP_DIR`.
    pub fn discover() -> Self {
        let home = directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let mut paths = Self::from_home(home);
        if let Some(dir) = non_empty_env("OPENCLAW_HOME") {
            paths.state_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty_env("CLAWKIT_BACKUP_DIR") {
            paths.backup_dir = PathBuf::from(dir);
        }
        paths
    }

    pub fn config_file(&self) -> PathBuf {
        self.state_dir.join("openclaw.json")
    }

    pub fn agent_dir(&self) -> PathBuf {
        self.state_dir.join("agents").join("main").join("agent")
    }

    pub fn auth_profiles_file(&self) -> PathBuf {
        self.agent_dir().join("auth-profiles.json")
    }

    pub fn credentials_dir(&self) -> PathBuf {
        self.state_dir.join("credentials")
    }

    pub fn google_client_file(&self) -> PathBuf {
        self.credentials_dir().join("google-client.json")
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.state_dir.join("workspace")
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.workspace_dir().join("memory")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    pub fn watchdog_dir(&self) -> PathBuf {
        self.state_dir.join("watchdog")
    }

    pub fn restart_log(&self) -> PathBuf {
        self.watchdog_dir().join("restarts.log")
    }

    pub fn config_history_dir(&self) -> PathBuf {
        self.state_dir.join("config-history")
    }

    pub fn unit_file(&self) -> PathBuf {
        self.systemd_user_dir.join(GATEWAY_UNIT)
    }

    pub fn token_store(&self) -> FileTokenStore {
        FileTokenStore::new(self.credentials_dir())
    }
}

/// Typed view of the toolkit settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub bot_name: Option<String>,
    pub owner_name: String,
    pub timezone: String,
    pub model: String,
    pub anthropic_api_key: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_allowed_users: String,
    pub gateway_port: u16,
    pub gateway_token: Option<String>,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub backup_sftp_target: Option<String>,
    pub backup_retention_days: u32,
    pub watchdog_max_restarts: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_name: None,
            owner_name: String::new(),
            timezone: "UTC".to_string(),
            model: DEFAULT_MODEL.to_string(),
            anthropic_api_key: None,
            telegram_bot_token: None,
            telegram_allowed_users: String::new(),
            gateway_port: DEFAULT_GATEWAY_PORT,
            gateway_token: None,
            google_client_id: None,
            google_client_secret: None,
            backup_sftp_target: None,
            backup_retention_days: DEFAULT_BACKUP_RETENTION_DAYS,
            watchdog_max_restarts: DEFAULT_MAX_RESTARTS,
        }
    }
}

impl Settings {
    /// Resolve settings: `.env` values win over the process environment,
    /// which wins over defaults.
    pub fn resolve(env_file: Option<&EnvFile>) -> Result<Self> {
        let lookup = |key: &str| -> Option<String> {
            env_file
                .and_then(|f| f.get_non_empty(key))
                .map(str::to_string)
                .or_else(|| non_empty_env(key))
        };
        let defaults = Self::default();

        Ok(Self {
            bot_name: lookup("BOT_NAME"),
            owner_name: lookup("OWNER_NAME").unwrap_or(defaults.owner_name),
            timezone: lookup("TIMEZONE").unwrap_or(defaults.timezone),
            model: lookup("OPENCLAW_MODEL").unwrap_or(defaults.model),
            anthropic_api_key: lookup("ANTHROPIC_API_KEY"),
            telegram_bot_token: lookup("TELEGRAM_BOT_TOKEN"),
            telegram_allowed_users: lookup("TELEGRAM_ALLOWED_USERS")
                .unwrap_or(defaults.telegram_allowed_users),
            gateway_port: parse_or("GATEWAY_PORT", lookup("GATEWAY_PORT"), defaults.gateway_port)?,
            gateway_token: lookup("GATEWAY_TOKEN"),
            google_client_id: lookup("GOOGLE_CLIENT_ID"),
            google_client_secret: lookup("GOOGLE_CLIENT_SECRET"),
            backup_sftp_target: lookup("BACKUP_SFTP_TARGET"),
            backup_retention_days: parse_or(
                "BACKUP_RETENTION_DAYS",
                lookup("BACKUP_RETENTION_DAYS"),
                defaults.backup_retention_days,
            )?,
            watchdog_max_restarts: parse_or(
                "WATCHDOG_MAX_RESTARTS",
                lookup("WATCHDOG_MAX_RESTARTS"),
                defaults.watchdog_max_restarts,
            )?,
        })
    }

    /// Load an optional `.env` (missing file means "defaults + environment").
    pub fn load_optional(env_path: &Path) -> Result<Self> {
        if env_path.exists() {
            let file = EnvFile::load(env_path)?;
            Self::resolve(Some(&file))
        } else {
            Self::resolve(None)
        }
    }

    pub fn google_credentials(&self, paths: &ToolkitPaths) -> std::result::Result<ClientCredentials, AuthError> {
        ClientCredentials::resolve(
            self.google_client_id.as_deref(),
            self.google_client_secret.as_deref(),
            &paths.google_client_file(),
        )
    }

    pub fn health_url(&self) -> String {
        format!("http://127.0.0.1:{}/health", self.gateway_port)
    }
}

/// Check that every required key is present in `env`.
pub fn validate_required(env: &EnvFile) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| env.get_non_empty(key).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ClawError::Validation(format!(
            "{} is missing required keys: {}",
            env.path().display(),
            missing.join(", ")
        )))
    }
}

/// Parse a service alias (`gmail`, `gcal`, `drive`, ...).
pub fn parse_service(alias: &str) -> std::result::Result<GoogleService, AuthError> {
    GoogleService::from_str(alias.trim()).map_err(|_| {
        AuthError::Unsupported(format!(
            "unknown service: {alias} (supported: gmail, calendar, drive)"
        ))
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ClawError::Validation(format!("{key} has an invalid value: {raw}"))),
    }
}
