//! Life OS: journaling helpers writing markdown into the agent's memory.

pub mod brain_dump;
pub mod config;
pub mod journal;
pub mod research;
pub mod weekly;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

pub use config::LifeOsConfig;

use crate::config::ToolkitPaths;

/// Where Life OS reads its config and writes entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifeOsPaths {
    pub config_file: PathBuf,
    pub memory_dir: PathBuf,
}

impl LifeOsPaths {
    pub fn from_toolkit(paths: &ToolkitPaths) -> Self {
        Self {
            config_file: paths.workspace_dir().join("life-os-config.yaml"),
            memory_dir: paths.memory_dir(),
        }
    }

    pub fn journal_dir(&self) -> PathBuf {
        self.memory_dir.join("journal")
    }

    pub fn brain_dump_dir(&self) -> PathBuf {
        self.memory_dir.join("brain-dumps")
    }

    pub fn weekly_dir(&self) -> PathBuf {
        self.memory_dir.join("weekly")
    }

    pub fn research_dir(&self) -> PathBuf {
        self.memory_dir.join("research")
    }
}

/// Line-oriented question/answer over any reader and writer.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", line.as_ref())
    }

    /// Print `question`, read one line; EOF reads as an empty answer.
    pub fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    /// Like [`ask`](Self::ask) with a fallback for blank answers.
    pub fn ask_or(&mut self, question: &str, default: &str) -> io::Result<String> {
        let answer = self.ask(question)?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// `snake_case` metric name as a title (`projects_completed` → `Projects Completed`).
pub fn title_case(name: &str) -> String {
    name.replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
