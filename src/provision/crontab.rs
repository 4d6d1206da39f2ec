//! Managed crontab block.
//!
//! clawkit owns the lines between [`BEGIN_MARKER`] and [`END_MARKER`];
//! everything else in the user's crontab is preserved verbatim.

use std::path::{Path, PathBuf};

use crate::config::env_file::shell_quote;
use crate::error::Result;
use crate::system::{CommandRunner, CommandSpec};

pub const BEGIN_MARKER: &str = "# BEGIN clawkit managed";
pub const END_MARKER: &str = "# END clawkit managed";

/// One scheduled clawkit subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronJob {
    pub schedule: &'static str,
    pub subcommand: &'static str,
}

pub const JOBS: [CronJob; 3] = [
    CronJob {
        schedule: "0 3 * * *",
        subcommand: "backup",
    },
    CronJob {
        schedule: "*/5 * * * *",
        subcommand: "watchdog",
    },
    CronJob {
        schedule: "0 4 * * 0",
        subcommand: "rotate-config",
    },
];

/// Directories cron's default `PATH` lacks but the jobs rely on.
pub const BASE_PATH: [&str; 4] = ["/usr/local/bin", "/usr/bin", "/bin", "/usr/sbin"];

/// `PATH` for cron jobs: the directories holding `bins` first, then
/// [`BASE_PATH`], without duplicates.
pub fn cron_path(bins: &[&Path]) -> String {
    let mut dirs: Vec<PathBuf> = Vec::new();
    let candidates = bins
        .iter()
        .filter_map(|bin| bin.parent())
        .map(Path::to_path_buf)
        .chain(BASE_PATH.iter().map(PathBuf::from));
    for dir in candidates {
        if !dir.as_os_str().is_empty() && !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs.iter()
        .map(|d| d.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

/// The full managed block, markers included, newline-terminated. Every job
/// runs with `path` as its `PATH`.
pub fn managed_block(exe: &Path, env_file: &Path, logs_dir: &Path, path: &str) -> String {
    let mut out = String::new();
    out.push_str(BEGIN_MARKER);
    out.push('\n');
    for job in JOBS {
        let log = logs_dir.join(format!("{}.log", job.subcommand));
        out.push_str(&format!(
            "{} PATH={} {} {} --env-file {} >> {} 2>&1\n",
            job.schedule,
            shell_quote(path),
            shell_quote(&exe.to_string_lossy()),
            job.subcommand,
            shell_quote(&env_file.to_string_lossy()),
            shell_quote(&log.to_string_lossy()),
        ));
    }
    out.push_str(END_MARKER);
    out.push('\n');
    out
}

/// `existing` with every managed block removed.
pub fn strip_managed(existing: &str) -> String {
    let mut out = String::new();
    let mut inside = false;
    for line in existing.lines() {
        match line.trim() {
            l if l == BEGIN_MARKER => inside = true,
            l if l == END_MARKER => inside = false,
            _ if inside => {}
            _ => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out
}

/// Replace any previous managed block with `block`, appended at the end.
pub fn install_block(existing: &str, block: &str) -> String {
    let mut out = strip_managed(existing);
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
    out.push_str(block);
    out
}

pub fn has_managed_block(existing: &str) -> bool {
    existing.lines().any(|l| l.trim() == BEGIN_MARKER)
}

/// Current crontab; "no crontab for user" reads as empty.
pub async fn read_crontab(runner: &dyn CommandRunner) -> Result<String> {
    let spec = CommandSpec::new("crontab").arg("-l");
    let output = runner.run(&spec).await?;
    if output.success() {
        Ok(output.stdout)
    } else if output.stderr.contains("no crontab") {
        Ok(String::new())
    } else {
        output.check(&spec).map(|o| o.stdout)
    }
}

/// Replace the crontab with `content` via `crontab -`.
pub fn write_spec(content: &str) -> CommandSpec {
    CommandSpec::new("crontab").arg("-").stdin(content)
}
