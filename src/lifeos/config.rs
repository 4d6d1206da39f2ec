//! `life-os-config.yaml`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{ClawError, Result};
use crate::util::fs::write_with_mode;

pub const DEFAULT_DAILY_PROMPTS: [&str; 4] = [
    "Three things you're grateful for:",
    "What energized you today?",
    "What drained your energy?",
    "One thing to prioritize tomorrow:",
];

pub const DEFAULT_WEEKLY_PROMPTS: [&str; 4] = [
    "Biggest win this week?",
    "What didn't go as planned?",
    "One thing you learned?",
    "Focus for next week?",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeOsConfig {
    #[serde(default)]
    pub daily: DailyConfig,
    #[serde(default)]
    pub weekly: WeeklyConfig,
    #[serde(default)]
    pub research: ResearchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyConfig {
    #[serde(default = "default_daily_prompts")]
    pub prompts: Vec<String>,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            prompts: default_daily_prompts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyConfig {
    #[serde(default = "default_day")]
    pub day: String,
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default = "default_metrics")]
    pub metrics: Vec<Metric>,
    #[serde(default = "default_weekly_prompts")]
    pub prompts: Vec<String>,
}

impl Default for WeeklyConfig {
    fn default() -> Self {
        Self {
            day: default_day(),
            time: default_time(),
            metrics: default_metrics(),
            prompts: default_weekly_prompts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub prompt: String,
    #[serde(rename = "type", default)]
    pub kind: MetricKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MetricKind {
    Number,
    #[default]
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default = "default_interests")]
    pub interests: Vec<String>,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            interests: default_interests(),
        }
    }
}

fn default_daily_prompts() -> Vec<String> {
    DEFAULT_DAILY_PROMPTS.iter().map(|s| s.to_string()).collect()
}

fn default_weekly_prompts() -> Vec<String> {
    DEFAULT_WEEKLY_PROMPTS.iter().map(|s| s.to_string()).collect()
}

fn default_day() -> String {
    "sunday".to_string()
}

fn default_time() -> String {
    "19:00".to_string()
}

fn default_metrics() -> Vec<Metric> {
    vec![
        Metric {
            name: "projects_completed".to_string(),
            prompt: "Projects completed this week?".to_string(),
            kind: MetricKind::Number,
        },
        Metric {
            name: "focus_area".to_string(),
            prompt: "Main focus this week?".to_string(),
            kind: MetricKind::Text,
        },
    ]
}

fn default_interests() -> Vec<String> {
    vec!["AI tools".to_string(), "productivity".to_string()]
}

impl LifeOsConfig {
    /// Load `path`; a missing or empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw)
            .map_err(|e| ClawError::Validation(format!("{}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| ClawError::Validation(format!("cannot serialize life-os config: {e}")))?;
        write_with_mode(path, yaml.as_bytes(), 0o644)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = LifeOsConfig::load(&dir.path().join("life-os-config.yaml")).unwrap();
        assert_eq!(config.daily.prompts.len(), 4);
        assert_eq!(config.weekly.metrics[0].kind, MetricKind::Number);
        assert_eq!(config.research.interests, vec!["AI tools", "productivity"]);
    }

    #[test]
    fn partial_yaml_fills_remaining_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("life-os-config.yaml");
        fs::write(
            &path,
            "weekly:\n  metrics:\n    - name: workouts\n      prompt: Workouts?\n      type: number\n",
        )
        .unwrap();
        let config = LifeOsConfig::load(&path).unwrap();
        assert_eq!(config.weekly.metrics.len(), 1);
        assert_eq!(config.weekly.day, "sunday");
        assert_eq!(config.weekly.prompts.len(), 4);
        assert_eq!(config.daily, DailyConfig::default());
    }

    #[test]
    fn save_then_load_preserves_custom_prompts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("life-os-config.yaml");
        let mut config = LifeOsConfig::default();
        config.weekly.prompts.push("Who helped you?".to_string());
        config.save(&path).unwrap();
        assert_eq!(LifeOsConfig::load(&path).unwrap(), config);
    }
}
