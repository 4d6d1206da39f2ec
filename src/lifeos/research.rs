//! Content research notes.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::NaiveDateTime;

use super::{LifeOsConfig, LifeOsPaths, Prompter};
use crate::error::Result;
use crate::util::fs::write_with_mode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trend {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentIdea {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    pub summary: String,
    pub trends: Vec<Trend>,
    pub ideas: Vec<ContentIdea>,
    pub resources: Vec<Resource>,
}

pub fn render_report(findings: &Findings, now: NaiveDateTime) -> String {
    let summary = if findings.summary.is_empty() {
        "_Research completed_"
    } else {
        findings.summary.as_str()
    };
    let mut lines = vec![
        format!("# Content Research: {}", now.format("%A, %B %d, %Y")),
        String::new(),
        "## 🔍 Research Summary".to_string(),
        String::new(),
        summary.to_string(),
        String::new(),
    ];

    if !findings.trends.is_empty() {
        lines.extend(["## 📊 Key Trends".to_string(), String::new()]);
        for trend in &findings.trends {
            let source = if trend.source.is_empty() {
                "Unknown"
            } else {
                trend.source.as_str()
            };
            lines.extend([
                format!("### {}", trend.title),
                String::new(),
                trend.summary.clone(),
                String::new(),
                format!("**Source:** {source}"),
                format!("**URL:** {}", trend.url),
                String::new(),
            ]);
        }
    }

    if !findings.ideas.is_empty() {
        lines.extend(["## 💡 Content Ideas".to_string(), String::new()]);
        for (i, idea) in findings.ideas.iter().enumerate() {
            lines.extend([
                format!("### Idea {}: {}", i + 1, idea.title),
                String::new(),
                idea.description.clone(),
                String::new(),
            ]);
        }
    }

    if !findings.resources.is_empty() {
        lines.extend(["## 📚 Resources".to_string(), String::new()]);
        for resource in &findings.resources {
            lines.push(format!("- [{}]({})", resource.title, resource.url));
        }
        lines.push(String::new());
    }

    lines.extend([
        "---".to_string(),
        String::new(),
        format!("*Generated: {}*", now.format("%Y-%m-%d %H:%M")),
    ]);
    lines.join("\n")
}

/// Ask for one trend; an empty title skips writing. Returns the report path.
pub fn run_research<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    paths: &LifeOsPaths,
    now: NaiveDateTime,
) -> Result<Option<PathBuf>> {
    let config = LifeOsConfig::load(&paths.config_file)?;
    prompter.say("🦊 Content Research Agent")?;
    prompter.say("=".repeat(40))?;
    prompter.say(format!("\nResearching: {}", config.research.interests.join(", ")))?;
    prompter.say("-".repeat(40))?;
    prompter.say("\nQuick research: What trends did you notice?")?;

    let title = prompter.ask("Trend title: ")?;
    if title.is_empty() {
        prompter.say("\nSkipping research entry.")?;
        return Ok(None);
    }
    let summary = prompter.ask("Summary: ")?;
    let source = prompter.ask("Source: ")?;
    let findings = Findings {
        summary: format!("Research completed on {}", now.format("%Y-%m-%d")),
        trends: vec![Trend {
            title,
            summary,
            source,
            url: String::new(),
        }],
        ..Findings::default()
    };

    let path = paths
        .research_dir()
        .join(format!("{}-findings.md", now.format("%Y-%m-%d")));
    write_with_mode(&path, render_report(&findings, now).as_bytes(), 0o644)?;
    prompter.say(format!("\n✅ Research saved to: {}", path.display()))?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    #[test]
    fn report_renders_optional_sections() {
        let findings = Findings {
            summary: String::new(),
            trends: vec![],
            ideas: vec![ContentIdea {
                title: "Agents in ops".to_string(),
                description: "Short thread".to_string(),
            }],
            resources: vec![Resource {
                title: "Docs".to_string(),
                url: "https://example.com".to_string(),
            }],
        };
        let text = render_report(&findings, morning());
        assert!(text.starts_with("# Content Research: Monday, October 19, 2026\n"));
        assert!(text.contains("_Research completed_"));
        assert!(!text.contains("Key Trends"));
        assert!(text.contains("### Idea 1: Agents in ops\n\nShort thread\n"));
        assert!(text.contains("- [Docs](https://example.com)\n"));
        assert!(text.ends_with("*Generated: 2026-10-19 09:15*"));
    }

    #[test]
    fn empty_title_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let paths = LifeOsPaths {
            config_file: dir.path().join("life-os-config.yaml"),
            memory_dir: dir.path().join("memory"),
        };
        let mut prompter = Prompter::new(b"\n".as_slice(), Vec::new());
        assert_eq!(run_research(&mut prompter, &paths, morning()).unwrap(), None);
        assert!(!paths.research_dir().exists());
    }

    #[test]
    fn trend_is_saved_with_unknown_source() {
        let dir = TempDir::new().unwrap();
        let paths = LifeOsPaths {
            config_file: dir.path().join("life-os-config.yaml"),
            memory_dir: dir.path().join("memory"),
        };
        let input = b"Local models\nSmaller and faster\n\n".as_slice();
        let mut prompter = Prompter::new(input, Vec::new());
        let path = run_research(&mut prompter, &paths, morning()).unwrap().unwrap();
        assert_eq!(path, dir.path().join("memory/research/2026-10-19-findings.md"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("Research completed on 2026-10-19"));
        assert!(text.contains("### Local models\n\nSmaller and faster\n\n**Source:** Unknown\n**URL:** \n"));
    }
}
