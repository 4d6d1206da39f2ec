//! Config snapshots (`rotate-config`).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use super::backup::STAMP_FORMAT;
use crate::config::ToolkitPaths;
use crate::error::Result;
use crate::util::fs::write_with_mode;

/// Snapshots kept in `config-history`.
pub const MAX_SNAPSHOTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotateOutcome {
    Snapshotted { path: PathBuf, pruned: Vec<PathBuf> },
    Unchanged,
    NoConfig,
}

pub fn snapshot_name(now: NaiveDateTime) -> String {
    format!("openclaw-{}.json", now.format(STAMP_FORMAT))
}

/// Snapshot files, oldest first (the timestamped names sort chronologically).
pub fn list_snapshots(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };
    let mut snapshots = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_snapshot = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("openclaw-") && n.ends_with(".json"));
        if is_snapshot {
            snapshots.push(path);
        }
    }
    snapshots.sort();
    Ok(snapshots)
}

/// Copy `openclaw.json` into the history when it differs from the newest
/// snapshot, then keep only the newest [`MAX_SNAPSHOTS`].
pub fn rotate_config(paths: &ToolkitPaths, now: NaiveDateTime) -> Result<RotateOutcome> {
    let current = match fs::read(paths.config_file()) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(RotateOutcome::NoConfig),
        Err(err) => return Err(err.into()),
    };
    let history = paths.config_history_dir();
    let snapshots = list_snapshots(&history)?;
    if let Some(newest) = snapshots.last() {
        if fs::read(newest)? == current {
            return Ok(RotateOutcome::Unchanged);
        }
    }

    let path = history.join(snapshot_name(now));
    write_with_mode(&path, &current, 0o600)?;

    let snapshots = list_snapshots(&history)?;
    let excess = snapshots.len().saturating_sub(MAX_SNAPSHOTS);
    let mut pruned = Vec::new();
    for old in snapshots.into_iter().take(excess) {
        fs::remove_file(&old)?;
        debug!(path = %old.display(), "dropped old config snapshot");
        pruned.push(old);
    }
    Ok(RotateOutcome::Snapshotted { path, pruned })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(4, minute, 0)
            .unwrap()
    }

    #[test]
    fn unchanged_config_is_not_snapshotted_twice() {
        let dir = TempDir::new().unwrap();
        let paths = ToolkitPaths::from_home(dir.path());
        assert_eq!(rotate_config(&paths, at(0)).unwrap(), RotateOutcome::NoConfig);

        write_with_mode(&paths.config_file(), b"{\"a\":1}", 0o600).unwrap();
        assert!(matches!(
            rotate_config(&paths, at(1)).unwrap(),
            RotateOutcome::Snapshotted { .. }
        ));
        assert_eq!(rotate_config(&paths, at(2)).unwrap(), RotateOutcome::Unchanged);
    }

    #[test]
    fn history_keeps_newest_ten() {
        let dir = TempDir::new().unwrap();
        let paths = ToolkitPaths::from_home(dir.path());
        for minute in 0..12 {
            write_with_mode(&paths.config_file(), format!("{{\"v\":{minute}}}").as_bytes(), 0o600)
                .unwrap();
            rotate_config(&paths, at(minute)).unwrap();
        }
        let left = list_snapshots(&paths.config_history_dir()).unwrap();
        assert_eq!(left.len(), MAX_SNAPSHOTS);
        assert_eq!(left[0], paths.config_history_dir().join(snapshot_name(at(2))));
    }
}
