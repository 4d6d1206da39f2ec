//! Brain dump processing: split free text into thoughts, categorise them and
//! pull out likely action items.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use strum::{Display, EnumIter, IntoEnumIterator};

use super::{title_case, LifeOsPaths};
use crate::error::{ClawError, Result};
use crate::util::fs::write_with_mode;

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n•\-]+").expect("separator regex must compile"));

static ACTION_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(?:need to|should|must|have to|todo|task)[,:]?\s*(.+?)(?:[.\n]|$)")
            .expect("action regex must compile"),
        Regex::new(r"(?i)(?:action|next step)[,:]?\s*(.+?)(?:[.\n]|$)")
            .expect("next-step regex must compile"),
    ]
});

/// Categories in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Ideas,
    Questions,
    Projects,
    Resources,
    Random,
}

impl Category {
    /// Classification order; first match wins, `Random` catches the rest.
    const CHECK_ORDER: [Category; 4] = [
        Category::Projects,
        Category::Questions,
        Category::Ideas,
        Category::Resources,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Projects => &["build", "create", "app", "website", "launch", "make"],
            Self::Questions => &["how", "why", "what", "when", "should"],
            Self::Ideas => &["idea", "thought", "maybe", "perhaps", "consider"],
            Self::Resources => &["link", "book", "tool", "site", "url", "read"],
            Self::Random => &[],
        }
    }

    fn matches(self, thought: &str, lower: &str) -> bool {
        (self == Self::Questions && thought.contains('?'))
            || self.keywords().iter().any(|k| lower.contains(k))
    }

    pub fn classify(thought: &str) -> Category {
        let lower = thought.to_lowercase();
        Self::CHECK_ORDER
            .into_iter()
            .find(|c| c.matches(thought, &lower))
            .unwrap_or(Category::Random)
    }
}

/// Thoughts grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Categorized {
    groups: Vec<(Category, Vec<String>)>,
}

impl Categorized {
    pub fn get(&self, category: Category) -> &[String] {
        self.groups
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, items)| items.as_slice())
            .unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, items)| items.len()).sum()
    }

    /// Non-empty groups in display order.
    pub fn non_empty(&self) -> impl Iterator<Item = (Category, &[String])> {
        Category::iter()
            .map(|c| (c, self.get(c)))
            .filter(|(_, items)| !items.is_empty())
    }

    fn push(&mut self, category: Category, thought: String) {
        let idx = match self.groups.iter().position(|(c, _)| *c == category) {
            Some(idx) => idx,
            None => {
                self.groups.push((category, Vec::new()));
                self.groups.len() - 1
            }
        };
        let items = &mut self.groups[idx].1;
        // Repeats are collapsed except in the catch-all bucket.
        if category == Category::Random || !items.contains(&thought) {
            items.push(thought);
        }
    }
}

pub fn categorize(text: &str) -> Categorized {
    let mut out = Categorized::default();
    for thought in SEPARATOR_RE.split(text).map(str::trim).filter(|t| !t.is_empty()) {
        out.push(Category::classify(thought), thought.to_string());
    }
    out
}

/// Phrases following "need to", "should", "next step", ... longer than 3 chars.
pub fn extract_action_items(text: &str) -> Vec<String> {
    ACTION_RES
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|action| action.chars().count() > 3)
        .collect()
}

pub fn render_brain_dump(
    text: &str,
    categorized: &Categorized,
    actions: &[String],
    now: NaiveDateTime,
) -> String {
    let stamp = now.format("%Y-%m-%d %H:%M");
    let mut out = String::new();
    let _ = writeln!(out, "# Brain Dump: {stamp}\n");
    let _ = writeln!(out, "## 📝 Raw Thoughts\n\n```\n{text}\n```\n");
    let _ = writeln!(out, "## 🏷️ Categorized\n");
    for (category, items) in categorized.non_empty() {
        let _ = writeln!(out, "### {}", title_case(&category.to_string()));
        for item in items {
            let _ = writeln!(out, "- {item}");
        }
        out.push('\n');
    }
    if !actions.is_empty() {
        let _ = writeln!(out, "## ⚡ Potential Action Items\n");
        for action in actions {
            let _ = writeln!(out, "- [ ] {action}");
        }
        out.push('\n');
    }
    let _ = write!(out, "---\n\n*Processed: {stamp}*");
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrainDumpResult {
    pub path: PathBuf,
    pub categorized: Categorized,
    pub actions: Vec<String>,
}

/// Process `text` and save it under `brain-dumps/`.
pub fn process_brain_dump(
    text: &str,
    paths: &LifeOsPaths,
    now: NaiveDateTime,
) -> Result<BrainDumpResult> {
    if text.trim().is_empty() {
        return Err(ClawError::Validation("no content provided".to_string()));
    }
    let categorized = categorize(text);
    let actions = extract_action_items(text);
    let path = paths
        .brain_dump_dir()
        .join(format!("{}.md", now.format("%Y-%m-%d-%H%M")));
    let entry = render_brain_dump(text, &categorized, &actions, now);
    write_with_mode(&path, entry.as_bytes(), 0o644)?;
    Ok(BrainDumpResult {
        path,
        categorized,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_matching_category_wins() {
        assert_eq!(Category::classify("build a habit tracker app"), Category::Projects);
        assert_eq!(Category::classify("how do I make sourdough?"), Category::Projects);
        assert_eq!(Category::classify("is rust worth it?"), Category::Questions);
        assert_eq!(Category::classify("maybe a newsletter"), Category::Ideas);
        assert_eq!(Category::classify("that book Sam mentioned"), Category::Resources);
        assert_eq!(Category::classify("dentist on thursday"), Category::Random);
    }

    #[test]
    fn categorize_splits_on_bullets_and_dedups() {
        let text = "• maybe a podcast\n- maybe a podcast\ncall mom\ncall mom";
        let out = categorize(text);
        assert_eq!(out.get(Category::Ideas), ["maybe a podcast".to_string()]);
        assert_eq!(out.get(Category::Random).len(), 2);
        assert_eq!(out.total(), 3);
    }

    #[test]
    fn action_items_follow_trigger_phrases() {
        let text = "I need to renew the passport. Next step: email the landlord\nshould x.";
        assert_eq!(
            extract_action_items(text),
            vec!["renew the passport".to_string(), "email the landlord".to_string()]
        );
    }

    #[test]
    fn render_lists_groups_in_display_order() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();
        let text = "launch the site\nwhy is sleep hard?";
        let rendered = render_brain_dump(text, &categorize(text), &[], now);
        let questions = rendered.find("### Questions").unwrap();
        let projects = rendered.find("### Projects").unwrap();
        assert!(questions < projects);
        assert!(rendered.starts_with("# Brain Dump: 2026-10-19 08:05\n\n## 📝 Raw Thoughts"));
        assert!(rendered.ends_with("---\n\n*Processed: 2026-10-19 08:05*"));
        assert!(!rendered.contains("Action Items"));
    }
}
