//! Built-in templates and the variables rendered into them.

use std::path::{Path, PathBuf};

use crate::config::{EnvFile, Settings, ToolkitPaths};
use crate::error::{ClawError, Result};
use crate::template::{self, TemplateVars};

pub const CONFIG_TEMPLATE: &str = "openclaw.json";
pub const AUTH_PROFILES_TEMPLATE: &str = "auth-profiles.json";
pub const UNIT_TEMPLATE: &str = "openclaw-gateway.service";

/// Workspace files created on first setup and never overwritten.
pub const WORKSPACE_FILES: [&str; 5] = ["SOUL.md", "AGENTS.md", "USER.md", "TOOLS.md", "HEARTBEAT.md"];

const EMBEDDED: [(&str, &str); 8] = [
    (CONFIG_TEMPLATE, include_str!("../../templates/openclaw.json")),
    (AUTH_PROFILES_TEMPLATE, include_str!("../../templates/auth-profiles.json")),
    (UNIT_TEMPLATE, include_str!("../../templates/openclaw-gateway.service")),
    ("workspace/SOUL.md", include_str!("../../templates/workspace/SOUL.md")),
    ("workspace/AGENTS.md", include_str!("../../templates/workspace/AGENTS.md")),
    ("workspace/USER.md", include_str!("../../templates/workspace/USER.md")),
    ("workspace/TOOLS.md", include_str!("../../templates/workspace/TOOLS.md")),
    ("workspace/HEARTBEAT.md", include_str!("../../templates/workspace/HEARTBEAT.md")),
];

/// Template lookup: an override directory first, then the built-ins.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    dir: Option<PathBuf>,
}

impl TemplateSet {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn load(&self, name: &str) -> Result<String> {
        if let Some(dir) = &self.dir {
            let path = dir.join(name);
            if path.is_file() {
                return Ok(std::fs::read_to_string(path)?);
            }
        }
        EMBEDDED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, body)| body.to_string())
            .ok_or_else(|| ClawError::Template(format!("unknown template: {name}")))
    }

    /// Render `name`. JSON templates get JSON-escaped values and must parse.
    pub fn render(&self, name: &str, vars: &TemplateVars) -> Result<String> {
        let raw = self.load(name)?;
        if !name.ends_with(".json") {
            return Ok(template::render(&raw, vars));
        }
        let escaped: TemplateVars = vars
            .iter()
            .map(|(k, v)| (k.clone(), json_escape(v)))
            .collect();
        let rendered = template::render(&raw, &escaped);
        serde_json::from_str::<serde_json::Value>(&rendered)
            .map_err(|e| ClawError::Template(format!("{name} did not render to valid JSON: {e}")))?;
        Ok(rendered)
    }
}

fn json_escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// Variables for rendering: every `.env` entry, overridden by the resolved
/// settings (so blank entries fall back to their defaults), plus the derived
/// path variables.
pub fn template_vars(
    env: &EnvFile,
    settings: &Settings,
    paths: &ToolkitPaths,
    openclaw_bin: &Path,
) -> TemplateVars {
    let mut vars: TemplateVars = env
        .entries()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    for (key, value) in [
        ("GATEWAY_PORT", settings.gateway_port.to_string()),
        ("TIMEZONE", settings.timezone.clone()),
        ("OWNER_NAME", settings.owner_name.clone()),
        ("OPENCLAW_MODEL", settings.model.clone()),
        ("TELEGRAM_ALLOWED_USERS", settings.telegram_allowed_users.clone()),
    ] {
        vars.insert(key.to_string(), value);
    }
    if vars.get("OWNER_NAME").map_or(true, |v| v.is_empty()) {
        let fallback = std::env::var("USER").unwrap_or_default();
        vars.insert("OWNER_NAME".to_string(), fallback);
    }

    vars.insert("HOME".to_string(), paths.home.display().to_string());
    vars.insert("OPENCLAW_HOME".to_string(), paths.state_dir.display().to_string());
    vars.insert("WORKSPACE_DIR".to_string(), paths.workspace_dir().display().to_string());
    vars.insert("OPENCLAW_BIN".to_string(), openclaw_bin.display().to_string());
    vars.insert(
        "USER".to_string(),
        std::env::var("USER").unwrap_or_default(),
    );
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars() -> TemplateVars {
        let env = EnvFile::parse(
            Path::new(".env"),
            "BOT_NAME=Fox \"the\" Bot\nANTHROPIC_API_KEY=sk-1\nTELEGRAM_BOT_TOKEN=123:abc\nGATEWAY_TOKEN=feed\nOWNER_NAME=Ada\n",
        )
        .unwrap();
        let settings = Settings::resolve(Some(&env)).unwrap();
        template_vars(
            &env,
            &settings,
            &ToolkitPaths::from_home("/home/bot"),
            Path::new("/usr/bin/openclaw"),
        )
    }

    #[test]
    fn config_renders_valid_json_with_escaped_values() {
        let rendered = TemplateSet::default().render(CONFIG_TEMPLATE, &vars()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(json["gateway"]["port"], 18789);
        assert_eq!(json["identity"]["name"], "Fox \"the\" Bot");
        assert_eq!(json["gateway"]["auth"]["token"], "feed");
        assert_eq!(json["agents"]["defaults"]["workspace"], "/home/bot/.openclaw/workspace");
    }

    #[test]
    fn unit_renders_exec_start() {
        let unit = TemplateSet::default().render(UNIT_TEMPLATE, &vars()).unwrap();
        assert!(unit.contains("ExecStart=/usr/bin/openclaw gateway --port 18789"));
        assert!(unit.contains("Environment=OPENCLAW_STATE_DIR=/home/bot/.openclaw"));
    }

    #[test]
    fn override_dir_wins_over_builtin() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("workspace")).unwrap();
        std::fs::write(dir.path().join("workspace/SOUL.md"), "custom ${BOT_NAME}\n").unwrap();
        let set = TemplateSet::new(Some(dir.path().to_path_buf()));
        assert_eq!(
            set.render("workspace/SOUL.md", &vars()).unwrap(),
            "custom Fox \"the\" Bot\n"
        );
        assert!(set.load("workspace/USER.md").unwrap().contains("${OWNER_NAME}"));
    }

    #[test]
    fn blank_entries_render_resolved_defaults() {
        let env = EnvFile::parse(
            Path::new(".env"),
            "BOT_NAME=Fox\nANTHROPIC_API_KEY=sk-1\nTELEGRAM_BOT_TOKEN=123:abc\nGATEWAY_TOKEN=feed\nOWNER_NAME=Ada\nGATEWAY_PORT=\nTIMEZONE=\n",
        )
        .unwrap();
        let settings = Settings::resolve(Some(&env)).unwrap();
        let vars = template_vars(
            &env,
            &settings,
            &ToolkitPaths::from_home("/home/bot"),
            Path::new("/usr/bin/openclaw"),
        );
        assert_eq!(vars["GATEWAY_PORT"], settings.gateway_port.to_string());
        assert_eq!(vars["TIMEZONE"], settings.timezone);

        let set = TemplateSet::default();
        let unit = set.render(UNIT_TEMPLATE, &vars).unwrap();
        assert!(unit.contains(&format!(
            "ExecStart=/usr/bin/openclaw gateway --port {}\n",
            settings.gateway_port
        )));
        let config: serde_json::Value =
            serde_json::from_str(&set.render(CONFIG_TEMPLATE, &vars).unwrap()).unwrap();
        assert_eq!(config["gateway"]["port"], settings.gateway_port);
        assert_eq!(config["agents"]["defaults"]["userTimezone"], settings.timezone.as_str());
    }

    #[test]
    fn unknown_template_is_error() {
        assert!(matches!(
            TemplateSet::default().load("nope.txt"),
            Err(ClawError::Template(_))
        ));
    }
}
