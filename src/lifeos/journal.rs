//! Daily journal entries.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use chrono::NaiveDateTime;

use super::{LifeOsConfig, LifeOsPaths, Prompter};
use crate::error::Result;
use crate::util::fs::write_with_mode;

/// Answers collected for one evening reflection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub mood: String,
    pub energy: String,
    /// `(prompt, answer)` pairs; prompts left blank are omitted.
    pub responses: Vec<(String, String)>,
}

pub fn render_journal(entry: &JournalEntry, now: NaiveDateTime) -> String {
    let mut lines = vec![
        format!("# Daily Journal: {}", now.format("%A, %B %d, %Y")),
        String::new(),
        format!("**Date:** {}", now.format("%Y-%m-%d")),
        format!("**Time:** {}", now.format("%H:%M")),
        String::new(),
        format!("**Mood:** {}/10", entry.mood),
        String::new(),
        format!("**Energy:** {}/10", entry.energy),
        String::new(),
        "---".to_string(),
        String::new(),
    ];
    for (question, answer) in &entry.responses {
        lines.push(format!("## {question}"));
        lines.push(String::new());
        lines.push(answer.clone());
        lines.push(String::new());
    }
    lines.join("\n")
}

/// Ask the mood/energy check and the configured prompts.
pub fn collect_journal<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    config: &LifeOsConfig,
) -> Result<JournalEntry> {
    prompter.say("🦊 Daily Journal - Evening Reflection")?;
    prompter.say("=".repeat(40))?;
    prompter.say("\nQuick check-in:")?;
    let mood = prompter.ask_or("Mood (1-10): ", "5")?;
    let energy = prompter.ask_or("Energy level (1-10): ", "5")?;
    prompter.say("\n---")?;

    let mut responses = Vec::new();
    for prompt in &config.daily.prompts {
        prompter.say(format!("\n{prompt}"))?;
        let answer = prompter.ask("> ")?;
        if !answer.is_empty() {
            responses.push((prompt.clone(), answer));
        }
    }
    Ok(JournalEntry {
        mood,
        energy,
        responses,
    })
}

/// Interactive journal; returns the written file.
pub fn run_journal<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    paths: &LifeOsPaths,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let config = LifeOsConfig::load(&paths.config_file)?;
    let entry = collect_journal(prompter, &config)?;
    let path = paths
        .journal_dir()
        .join(format!("{}.md", now.format("%Y-%m-%d")));
    write_with_mode(&path, render_journal(&entry, now).as_bytes(), 0o644)?;
    prompter.say(format!("\n✅ Journal entry saved to: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn evening() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(21, 30, 0)
            .unwrap()
    }

    #[test]
    fn renders_header_scores_and_answers() {
        let entry = JournalEntry {
            mood: "7".to_string(),
            energy: "4".to_string(),
            responses: vec![("What energized you today?".to_string(), "A long walk".to_string())],
        };
        assert_eq!(
            render_journal(&entry, evening()),
            "# Daily Journal: Monday, October 19, 2026\n\n**Date:** 2026-10-19\n**Time:** 21:30\n\n\
             **Mood:** 7/10\n\n**Energy:** 4/10\n\n---\n\n## What energized you today?\n\nA long walk\n"
        );
    }

    #[test]
    fn blank_answers_are_skipped_and_scores_default() {
        let dir = TempDir::new().unwrap();
        let paths = LifeOsPaths {
            config_file: dir.path().join("life-os-config.yaml"),
            memory_dir: dir.path().join("memory"),
        };
        let input = b"\n\nfamily, coffee, sun\n\n\nship the release\n".as_slice();
        let mut prompter = Prompter::new(input, Vec::new());
        let path = run_journal(&mut prompter, &paths, evening()).unwrap();
        assert_eq!(path, dir.path().join("memory/journal/2026-10-19.md"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("**Mood:** 5/10"));
        assert!(text.contains("## Three things you're grateful for:\n\nfamily, coffee, sun"));
        assert!(text.contains("## One thing to prioritize tomorrow:\n\nship the release"));
        assert!(!text.contains("What drained your energy?"));
    }
}
