//! Compressed state backups with retention and optional SFTP upload.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::context::Toolkit;
use crate::error::{ClawError, Result};
use crate::system::CommandSpec;
use crate::util::fs::set_mode;

pub const ARCHIVE_PREFIX: &str = "openclaw-backup-";
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";
pub const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

static ARCHIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^openclaw-backup-(\d{8}-\d{6})\.tar\.gz$").expect("archive name regex must compile")
});

/// An archive in the backup directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArchive {
    pub path: PathBuf,
    pub created: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub archive: PathBuf,
    pub pruned: Vec<PathBuf>,
    pub uploaded: bool,
}

pub fn archive_name(now: NaiveDateTime) -> String {
    format!("{ARCHIVE_PREFIX}{}{ARCHIVE_SUFFIX}", now.format(STAMP_FORMAT))
}

/// Timestamp encoded in an archive file name.
pub fn parse_archive_name(name: &str) -> Option<NaiveDateTime> {
    let caps = ARCHIVE_RE.captures(name)?;
    NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), STAMP_FORMAT).ok()
}

/// Archives in `dir`, oldest first.
pub fn list_archives(dir: &Path) -> Result<Vec<BackupArchive>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let mut archives = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(created) = name.to_str().and_then(parse_archive_name) {
            archives.push(BackupArchive {
                path: entry.path(),
                created,
            });
        }
    }
    archives.sort_by_key(|a| a.created);
    Ok(archives)
}

pub fn latest_archive(dir: &Path) -> Result<Option<BackupArchive>> {
    Ok(list_archives(dir)?.pop())
}

/// Delete archives older than `retention_days` relative to `now`.
pub fn prune_archives(dir: &Path, now: NaiveDateTime, retention_days: u32) -> Result<Vec<PathBuf>> {
    let cutoff = now - Duration::days(i64::from(retention_days));
    let mut removed = Vec::new();
    for archive in list_archives(dir)? {
        if archive.created < cutoff {
            fs::remove_file(&archive.path)?;
            debug!(path = %archive.path.display(), "pruned old backup");
            removed.push(archive.path);
        }
    }
    Ok(removed)
}

/// Split `user@host:dir` into the sftp destination and remote directory.
pub fn parse_sftp_target(target: &str) -> Option<(&str, &str)> {
    let (host, dir) = target.split_once(':')?;
    if host.is_empty() {
        return None;
    }
    Some((host, if dir.is_empty() { "." } else { dir }))
}

pub async fn run_backup(tk: &Toolkit, now: NaiveDateTime) -> Result<BackupReport> {
    let paths = &tk.paths;
    if !paths.state_dir.is_dir() {
        return Err(ClawError::Validation(format!(
            "{} does not exist; nothing to back up",
            paths.state_dir.display()
        )));
    }
    fs::create_dir_all(&paths.backup_dir)?;
    set_mode(&paths.backup_dir, 0o700)?;

    let archive = paths.backup_dir.join(archive_name(now));
    let tar = CommandSpec::new("tar")
        .arg("-czf")
        .arg(archive.display().to_string())
        .arg("--exclude=./logs")
        .arg("-C")
        .arg(paths.state_dir.display().to_string())
        .arg(".");
    tk.runner.run_checked(&tar).await?;
    if archive.exists() {
        set_mode(&archive, 0o600)?;
    }
    info!(archive = %archive.display(), "backup written");
    tk.reporter.ok(format!("backup written to {}", archive.display()));

    let pruned = prune_archives(&paths.backup_dir, now, tk.settings.backup_retention_days)?;
    if !pruned.is_empty() {
        tk.reporter.ok(format!(
            "pruned {} backup(s) older than {} days",
            pruned.len(),
            tk.settings.backup_retention_days
        ));
    }

    let uploaded = match tk.settings.backup_sftp_target.as_deref() {
        Some(target) => upload(tk, &archive, target).await,
        None => false,
    };

    Ok(BackupReport {
        archive,
        pruned,
        uploaded,
    })
}

/// Upload via `sftp -b -`. Failures are warnings; the local archive stays.
async fn upload(tk: &Toolkit, archive: &Path, target: &str) -> bool {
    let Some((host, dir)) = parse_sftp_target(target) else {
        tk.reporter.warn(format!(
            "BACKUP_SFTP_TARGET must look like user@host:dir (got {target})"
        ));
        return false;
    };
    let batch = format!("put {} {}/\n", archive.display(), dir.trim_end_matches('/'));
    let spec = CommandSpec::new("sftp").args(["-b", "-", host]).stdin(batch);
    match tk.runner.run(&spec).await {
        Ok(out) if out.success() => {
            tk.reporter.ok(format!("uploaded to {target}"));
            true
        }
        Ok(out) => {
            warn!(code = ?out.code, stderr = %out.stderr.trim(), "sftp upload failed");
            tk.reporter
                .warn(format!("sftp upload to {target} failed; local backup kept"));
            false
        }
        Err(err) => {
            tk.reporter
                .warn(format!("sftp upload to {target} failed ({err}); local backup kept"));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn archive_names_round_trip_timestamp() {
        let now = at(2026, 10, 19, 3);
        let name = archive_name(now);
        assert_eq!(name, "openclaw-backup-20261019-030000.tar.gz");
        assert_eq!(parse_archive_name(&name), Some(now));
        assert_eq!(parse_archive_name("openclaw-backup-latest.tar.gz"), None);
    }

    #[test]
    fn prune_removes_only_archives_past_retention() {
        let dir = TempDir::new().unwrap();
        let now = at(2026, 10, 19, 3);
        for ts in [at(2026, 10, 1, 3), at(2026, 10, 12, 2), at(2026, 10, 18, 3)] {
            fs::write(dir.path().join(archive_name(ts)), b"x").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();
        let removed = prune_archives(dir.path(), now, 7).unwrap();
        assert_eq!(removed.len(), 2);
        let left = list_archives(dir.path()).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].created, at(2026, 10, 18, 3));
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn sftp_target_splits_host_and_dir() {
        assert_eq!(
            parse_sftp_target("bak@host.example:/srv/backups"),
            Some(("bak@host.example", "/srv/backups"))
        );
        assert_eq!(parse_sftp_target("bak@host:"), Some(("bak@host", ".")));
        assert_eq!(parse_sftp_target("nohost"), None);
    }
}
