//! Restore the state directory from a backup archive.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use tracing::{info, warn};

use super::backup::{latest_archive, STAMP_FORMAT};
use crate::config::GATEWAY_UNIT;
use crate::context::Toolkit;
use crate::error::{ClawError, Result};
use crate::provision::systemd;
use crate::system::CommandSpec;
use crate::util::fs::set_mode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreSource {
    Archive(PathBuf),
    Latest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub archive: PathBuf,
    /// Where the previous state directory was moved, if there was one.
    pub previous_state: Option<PathBuf>,
}

/// Stop the gateway, move the current state aside, extract, start again.
///
/// If extraction fails the previous state directory is moved back.
pub async fn run_restore(
    tk: &Toolkit,
    source: &RestoreSource,
    now: NaiveDateTime,
) -> Result<RestoreReport> {
    let paths = &tk.paths;
    let archive = match source {
        RestoreSource::Archive(path) => path.clone(),
        RestoreSource::Latest => latest_archive(&paths.backup_dir)?
            .map(|a| a.path)
            .ok_or_else(|| {
                ClawError::Validation(format!(
                    "no backups found in {}",
                    paths.backup_dir.display()
                ))
            })?,
    };
    if !archive.is_file() {
        return Err(ClawError::Validation(format!(
            "backup archive {} does not exist",
            archive.display()
        )));
    }

    let stop = systemd::systemctl(&["stop", GATEWAY_UNIT]);
    let out = tk.runner.run(&stop).await?;
    if !out.success() {
        warn!(stderr = %out.stderr.trim(), "gateway stop failed, continuing");
    }

    let previous_state = if paths.state_dir.exists() {
        let mut name = paths
            .state_dir
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".pre-restore-{}", now.format(STAMP_FORMAT)));
        let aside = paths.state_dir.with_file_name(name);
        fs::rename(&paths.state_dir, &aside)?;
        tk.reporter
            .info(format!("moved current state to {}", aside.display()));
        Some(aside)
    } else {
        None
    };

    fs::create_dir_all(&paths.state_dir)?;
    set_mode(&paths.state_dir, 0o700)?;
    let extract = CommandSpec::new("tar")
        .arg("-xzf")
        .arg(archive.display().to_string())
        .arg("-C")
        .arg(paths.state_dir.display().to_string());
    if let Err(err) = tk.runner.run_checked(&extract).await {
        if let Some(aside) = &previous_state {
            fs::remove_dir_all(&paths.state_dir)?;
            fs::rename(aside, &paths.state_dir)?;
            tk.reporter.warn("extraction failed; previous state put back");
        }
        return Err(err);
    }
    info!(archive = %archive.display(), "state restored");

    tk.runner
        .run_checked(&systemd::systemctl(&["start", GATEWAY_UNIT]))
        .await?;
    tk.reporter
        .ok(format!("restored from {}", archive.display()));

    Ok(RestoreReport {
        archive,
        previous_state,
    })
}
