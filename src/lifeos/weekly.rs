//! Weekly check-in: metric setup and the reflection dashboard.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::{Datelike, Duration, NaiveDateTime};

use super::config::{Metric, MetricKind};
use super::{title_case, LifeOsConfig, LifeOsPaths, Prompter};
use crate::error::Result;
use crate::util::fs::write_with_mode;

const RESPONSE_PLACEHOLDER: &str = "*(Your response here)*";

/// Interactively replace the metric list and append reflection prompts.
pub fn run_weekly_setup<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    paths: &LifeOsPaths,
) -> Result<LifeOsConfig> {
    let mut config = LifeOsConfig::load(&paths.config_file)?;
    prompter.say("🦊 Life OS: Weekly Check-in Setup")?;
    prompter.say("=".repeat(40))?;
    prompter.say("\nEnter your metrics or press Enter to skip.")?;
    prompter.say("Example: 'newsletter_subscribers' or 'revenue' or 'workouts'")?;
    prompter.say("Type 'done' when finished.\n")?;

    let mut metrics = Vec::new();
    loop {
        let name = prompter.ask("Metric name (or 'done'): ")?;
        if name.is_empty() || name.eq_ignore_ascii_case("done") {
            break;
        }
        let prompt = prompter.ask_or(&format!("  Prompt for {name}: "), &format!("Current {name}?"))?;
        let kind = prompter.ask_or("  Type [number/text]: ", "text")?;
        let kind = kind.parse::<MetricKind>().unwrap_or_else(|_| {
            tracing::warn!(metric = %name, kind = %kind, "unknown metric type, using text");
            MetricKind::Text
        });
        metrics.push(Metric { name, prompt, kind });
    }
    if !metrics.is_empty() {
        config.weekly.metrics = metrics;
    }

    prompter.say("\nCurrent reflection prompts:")?;
    for (i, prompt) in config.weekly.prompts.iter().enumerate() {
        prompter.say(format!("  {}. {prompt}", i + 1))?;
    }
    let mut custom = prompter.ask("\nAdd custom prompt (or Enter to skip): ")?;
    while !custom.is_empty() {
        config.weekly.prompts.push(custom);
        custom = prompter.ask("Add another (or Enter to finish): ")?;
    }

    config.save(&paths.config_file)?;
    prompter.say(format!("\n✅ Config saved to {}", paths.config_file.display()))?;
    Ok(config)
}

/// Answers gathered for one week.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyCheckin {
    /// `(metric name, value)`; skipped metrics are absent.
    pub metrics: Vec<(String, String)>,
    /// `(prompt, answer)`; blank answers render as a placeholder.
    pub reflections: Vec<(String, String)>,
}

pub fn render_dashboard(checkin: &WeeklyCheckin, now: NaiveDateTime) -> String {
    let week_start = now.date() - Duration::days(i64::from(now.weekday().num_days_from_monday()));
    let week_end = week_start + Duration::days(6);
    let mut lines = vec![
        format!(
            "# Weekly Check-in: {} - {}",
            week_start.format("%b %d"),
            week_end.format("%b %d, %Y")
        ),
        String::new(),
        "## 📊 Metrics".to_string(),
        String::new(),
    ];
    for (name, value) in &checkin.metrics {
        lines.push(format!("- **{}:** {value}", title_case(name)));
    }
    lines.extend([String::new(), "## 🎯 Reflections".to_string(), String::new()]);
    for (prompt, answer) in &checkin.reflections {
        let answer = if answer.is_empty() {
            RESPONSE_PLACEHOLDER
        } else {
            answer.as_str()
        };
        lines.extend([format!("### {prompt}"), String::new(), answer.to_string(), String::new()]);
    }
    lines.extend([
        String::new(),
        "## 📈 Trends".to_string(),
        String::new(),
        "_Compare with last week (manual or automated)_".to_string(),
        String::new(),
        "---".to_string(),
        String::new(),
        format!("*Logged: {}*", now.format("%Y-%m-%d %H:%M")),
    ]);
    lines.join("\n")
}

pub fn collect_checkin<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    config: &LifeOsConfig,
) -> Result<WeeklyCheckin> {
    let mut checkin = WeeklyCheckin::default();
    for metric in &config.weekly.metrics {
        prompter.say(format!("🦊 {}", metric.prompt))?;
        let value = prompter.ask("> ")?;
        if !value.is_empty() {
            checkin.metrics.push((metric.name.clone(), value));
        }
    }
    for prompt in &config.weekly.prompts {
        prompter.say(format!("\n{prompt}"))?;
        let answer = prompter.ask("> ")?;
        checkin.reflections.push((prompt.clone(), answer));
    }
    Ok(checkin)
}

/// Interactive check-in; returns the dashboard file.
pub fn run_weekly_checkin<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    paths: &LifeOsPaths,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let config = LifeOsConfig::load(&paths.config_file)?;
    let checkin = collect_checkin(prompter, &config)?;
    let dashboard = render_dashboard(&checkin, now);
    let path = paths
        .weekly_dir()
        .join(format!("{}.md", now.format("%Y-%m-%d")));
    write_with_mode(&path, dashboard.as_bytes(), 0o644)?;
    prompter.say(format!("\n✅ Weekly check-in saved to: {}", path.display()))?;
    Ok(path)
}
