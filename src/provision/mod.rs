//! Host provisioning: `setup`, `reset` and `prereqs`.
//!
//! Every mutation goes through [`Executor`], which in dry-run mode reports
//! what it would do and touches nothing.

pub mod crontab;
pub mod prereqs;
pub mod reset;
pub mod setup;
pub mod systemd;
pub mod templates;

use std::fs;
use std::path::Path;

use crate::context::Toolkit;
use crate::error::Result;
use crate::system::{CommandOutput, CommandSpec};
use crate::util::fs::{differs, remove_path, set_mode, write_with_mode};

/// What a file write did (or would do).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
    /// Existing file left alone (create-only writes).
    Preserved,
    WouldCreate,
    WouldUpdate,
}

impl WriteOutcome {
    pub fn changed(self) -> bool {
        matches!(self, Self::Created | Self::Updated)
    }
}

/// Applies filesystem and command mutations, or only reports them.
pub struct Executor<'a> {
    tk: &'a Toolkit,
    dry_run: bool,
}

impl<'a> Executor<'a> {
    pub fn new(tk: &'a Toolkit, dry_run: bool) -> Self {
        Self { tk, dry_run }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn toolkit(&self) -> &Toolkit {
        self.tk
    }

    /// Create `path` (and parents) and apply `mode`.
    pub fn create_dir(&self, path: &Path, mode: u32) -> Result<()> {
        if self.dry_run {
            if !path.is_dir() {
                self.tk
                    .reporter
                    .dry_run(format!("would create {} (mode {mode:o})", path.display()));
            }
            return Ok(());
        }
        fs::create_dir_all(path)?;
        set_mode(path, mode)?;
        Ok(())
    }

    /// Write `contents` only when they differ from what is on disk.
    pub fn write_file(&self, path: &Path, contents: &str, mode: u32) -> Result<WriteOutcome> {
        let exists = path.exists();
        if !differs(path, contents.as_bytes()) {
            if !self.dry_run {
                set_mode(path, mode)?;
            }
            return Ok(WriteOutcome::Unchanged);
        }
        if self.dry_run {
            let verb = if exists { "update" } else { "create" };
            self.tk
                .reporter
                .dry_run(format!("would {verb} {} (mode {mode:o})", path.display()));
            return Ok(if exists {
                WriteOutcome::WouldUpdate
            } else {
                WriteOutcome::WouldCreate
            });
        }
        write_with_mode(path, contents.as_bytes(), mode)?;
        Ok(if exists {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Created
        })
    }

    /// Write `contents` only when `path` does not exist yet.
    pub fn write_if_absent(&self, path: &Path, contents: &str, mode: u32) -> Result<WriteOutcome> {
        if path.exists() {
            return Ok(WriteOutcome::Preserved);
        }
        self.write_file(path, contents, mode)
    }

    /// Remove a file or tree; returns whether something was (or would be) removed.
    pub fn remove(&self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        if self.dry_run {
            self.tk
                .reporter
                .dry_run(format!("would remove {}", path.display()));
            return Ok(true);
        }
        Ok(remove_path(path)?)
    }

    /// Run a mutating command; in dry-run it is reported and treated as successful.
    pub async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if self.dry_run {
            self.tk
                .reporter
                .dry_run(format!("would run: {}", spec.display()));
            return Ok(CommandOutput {
                code: Some(0),
                ..CommandOutput::default()
            });
        }
        self.tk.runner.run(spec).await
    }

    pub async fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.run(spec).await?.check(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Settings, ToolkitPaths};
    use crate::report::Reporter;
    use crate::system::SystemRunner;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn toolkit(dir: &TempDir) -> Toolkit {
        Toolkit::new(
            ToolkitPaths::from_home(dir.path()),
            Settings::default(),
            Arc::new(SystemRunner::new()),
            Reporter::capturing(),
        )
    }

    #[test]
    fn dry_run_reports_without_touching_disk() {
        let dir = TempDir::new().unwrap();
        let tk = toolkit(&dir);
        let exec = Executor::new(&tk, true);
        let target = dir.path().join("a").join("b.txt");
        assert_eq!(
            exec.write_file(&target, "x", 0o600).unwrap(),
            WriteOutcome::WouldCreate
        );
        exec.create_dir(&dir.path().join("c"), 0o700).unwrap();
        assert!(!target.exists());
        assert!(!dir.path().join("c").exists());
        assert_eq!(tk.reporter.lines().len(), 2);
    }

    #[test]
    fn write_file_skips_identical_content() {
        let dir = TempDir::new().unwrap();
        let tk = toolkit(&dir);
        let exec = Executor::new(&tk, false);
        let target = dir.path().join("f.json");
        assert_eq!(exec.write_file(&target, "{}", 0o600).unwrap(), WriteOutcome::Created);
        assert_eq!(exec.write_file(&target, "{}", 0o600).unwrap(), WriteOutcome::Unchanged);
        assert_eq!(exec.write_file(&target, "[]", 0o600).unwrap(), WriteOutcome::Updated);
        assert_eq!(exec.write_if_absent(&target, "new", 0o644).unwrap(), WriteOutcome::Preserved);
        assert_eq!(fs::read_to_string(&target).unwrap(), "[]");
    }
}
