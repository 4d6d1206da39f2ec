//! `.env` file handling: parsing via dotenvy, order-preserving rewrite with
//! shell-safe quoting.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ClawError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum EnvLine {
    /// Blank line or comment, kept verbatim.
    Verbatim(String),
    Entry { key: String, value: String },
}

/// Ordered key/value view of a `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    path: PathBuf,
    lines: Vec<EnvLine>,
}

impl EnvFile {
    /// Load and parse `path`. Values are unquoted and unescaped by dotenvy.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClawError::Validation(format!(
                    "{} not found (copy .env.example and fill it in)",
                    path.display()
                ))
            } else {
                ClawError::Io(e)
            }
        })?;
        Self::parse(path, &raw)
    }

    /// Parse `raw`. Each entry is parsed by dotenvy after the entries above
    /// it, so `${KEY}` sees earlier values. A value dotenvy rejects (e.g.
    /// `BOT_NAME=Fox Bot`) is taken literally, minus one pair of matching
    /// quotes.
    pub fn parse(path: &Path, raw: &str) -> Result<Self> {
        // Earlier entries, re-quoted so an unbalanced line cannot swallow its
        // neighbours.
        let mut context = String::new();
        let mut lines = Vec::new();
        for (index, line) in raw.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                lines.push(EnvLine::Verbatim(line.to_string()));
                continue;
            }
            let Some((key, raw_value)) = split_entry(trimmed) else {
                return Err(ClawError::Validation(format!(
                    "{}:{}: expected KEY=value",
                    path.display(),
                    index + 1
                )));
            };
            let input = format!("{context}{trimmed}\n");
            let value = match dotenvy::from_read_iter(input.as_bytes()).last() {
                Some(Ok((k, value))) if k == key => value,
                _ => strip_quotes(raw_value.trim()).to_string(),
            };
            context.push_str(&format!("{key}={}\n", shell_quote(&value)));
            lines.push(EnvLine::Entry {
                key: key.to_string(),
                value,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            lines,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            EnvLine::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Value if present and not blank.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Set `key`, replacing the last existing entry or appending a new one.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        for line in self.lines.iter_mut().rev() {
            if let EnvLine::Entry { key: k, value: v } = line {
                if k == key {
                    *v = value;
                    return;
                }
            }
        }
        self.lines.push(EnvLine::Entry {
            key: key.to_string(),
            value,
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            EnvLine::Entry { key, value } => Some((key.as_str(), value.as_str())),
            EnvLine::Verbatim(_) => None,
        })
    }

    /// Render with every value quoted so the file can be `source`d safely.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                EnvLine::Verbatim(text) => out.push_str(text),
                EnvLine::Entry { key, value } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(&shell_quote(value));
                }
            }
            out.push('\n');
        }
        out
    }
}

fn split_entry(line: &str) -> Option<(&str, &str)> {
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    valid.then_some((key, value))
}

/// Drop one pair of matching `'` or `"` around `value`.
fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Single-quote `value` for POSIX shells; embedded quotes become `'\''`.
pub fn shell_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(raw: &str) -> EnvFile {
        EnvFile::parse(Path::new(".env"), raw).unwrap()
    }

    #[test]
    fn render_quotes_values_and_keeps_comments() {
        let env = parse("# bot\nBOT_NAME=Fox Bot\n\nANTHROPIC_API_KEY=\"sk-ant-1\"\n");
        assert_eq!(
            env.render(),
            "# bot\nBOT_NAME='Fox Bot'\n\nANTHROPIC_API_KEY='sk-ant-1'\n"
        );
    }

    #[test]
    fn render_is_idempotent() {
        let env = parse("A=it's\nB='$HOME literal'\nC=\"x\\\"y\"\n");
        let once = env.render();
        let twice = parse(&once).render();
        assert_eq!(once, twice);
        assert_eq!(parse(&once).get("A"), Some("it's"));
        assert_eq!(parse(&once).get("B"), Some("$HOME literal"));
        assert_eq!(parse(&once).get("C"), Some("x\"y"));
    }

    #[test]
    fn set_replaces_or_appends() {
        let mut env = parse("A=1\n");
        env.set("A", "2");
        env.set("GATEWAY_TOKEN", "abc");
        assert_eq!(env.get("A"), Some("2"));
        assert_eq!(env.render(), "A='2'\nGATEWAY_TOKEN='abc'\n");
    }

    #[test]
    fn unquoted_value_with_spaces_is_taken_literally() {
        let env = parse("OWNER_NAME=Ada Lovelace\n");
        assert_eq!(env.get("OWNER_NAME"), Some("Ada Lovelace"));
        assert_eq!(env.render(), "OWNER_NAME='Ada Lovelace'\n");
    }

    #[test]
    fn later_entries_expand_earlier_ones() {
        let env = parse("CLAWKIT_TEST_BASE=base\nCLAWKIT_TEST_DERIVED=${CLAWKIT_TEST_BASE}/y\n");
        assert_eq!(env.get("CLAWKIT_TEST_DERIVED"), Some("base/y"));
    }

    #[test]
    fn rejected_quoted_value_loses_its_quotes() {
        let env = parse("PW=\"p$ss\"\nSECRET='sk-ant-$xyz9'\n");
        assert_eq!(env.get("PW"), Some("p$ss"));
        assert_eq!(env.get("SECRET"), Some("sk-ant-$xyz9"));
        let rendered = env.render();
        assert_eq!(rendered, "PW='p$ss'\nSECRET='sk-ant-$xyz9'\n");
        assert_eq!(parse(&rendered).get("PW"), Some("p$ss"));
    }

    #[test]
    fn strip_quotes_needs_a_matching_pair() {
        assert_eq!(strip_quotes("\"a\""), "a");
        assert_eq!(strip_quotes("'a'"), "a");
        assert_eq!(strip_quotes("\"a'"), "\"a'");
        assert_eq!(strip_quotes("a"), "a");
        assert_eq!(strip_quotes("\""), "\"");
    }

    #[test]
    fn garbage_line_is_rejected() {
        assert!(EnvFile::parse(Path::new(".env"), "not an entry\n").is_err());
    }

    #[test]
    fn blank_values_are_not_non_empty() {
        let env = parse("A=\nB=  \nC=x\n");
        assert_eq!(env.get_non_empty("A"), None);
        assert_eq!(env.get_non_empty("B"), None);
        assert_eq!(env.get_non_empty("C"), Some("x"));
    }

    #[test]
    fn missing_file_is_validation_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = EnvFile::load(&dir.path().join(".env")).unwrap_err();
        assert!(matches!(err, ClawError::Validation(_)));
    }
}
