//! Handlers for the provisioning and operations commands.

use std::path::Path;

use chrono::{Local, Utc};

use super::{PrereqsArgs, ResetArgs, RestoreArgs, SetupArgs};
use crate::context::Toolkit;
use crate::error::{ClawError, Result};
use crate::ops::restore::RestoreSource;
use crate::ops::rotate::RotateOutcome;
use crate::ops::{self, watchdog};
use crate::provision::prereqs::{run_prereqs, PrereqOptions};
use crate::provision::reset::{run_reset, ResetOptions};
use crate::provision::setup::{run_setup, SetupOptions};

pub async fn handle_setup(tk: &Toolkit, env_file: &Path, args: SetupArgs) -> Result<()> {
    let exe = std::env::current_exe().map_err(|e| {
        ClawError::missing_prerequisite("path of the clawkit binary", e.to_string())
    })?;
    let opts = SetupOptions {
        env_file: env_file.to_path_buf(),
        dry_run: args.dry_run,
        templates_dir: args.templates_dir,
        exe,
    };
    let report = run_setup(tk, &opts).await?;
    let changed = report.files.iter().filter(|(_, o)| o.changed()).count();
    if args.dry_run {
        tk.reporter.dry_run("no changes made");
    } else {
        tk.reporter.ok(format!("setup complete ({changed} file(s) written)"));
    }
    Ok(())
}

pub async fn handle_reset(tk: &Toolkit, env_file: &Path, args: ResetArgs) -> Result<()> {
    let opts = ResetOptions {
        env_file: env_file.to_path_buf(),
        dry_run: args.dry_run,
        keep_backups: args.keep_backups,
        keep_env: args.keep_env,
    };
    run_reset(tk, &opts).await
}

pub async fn handle_prereqs(tk: &Toolkit, args: PrereqsArgs) -> Result<()> {
    let opts = PrereqOptions {
        bot_user: args.bot_user,
        skip_system: args.skip_system,
    };
    run_prereqs(tk, &opts).await
}

pub async fn handle_backup(tk: &Toolkit) -> Result<()> {
    ops::run_backup(tk, Local::now().naive_local()).await?;
    Ok(())
}

pub async fn handle_restore(tk: &Toolkit, args: RestoreArgs) -> Result<()> {
    let source = match args.archive {
        Some(path) => RestoreSource::Archive(path),
        None => RestoreSource::Latest,
    };
    ops::run_restore(tk, &source, Local::now().naive_local()).await?;
    Ok(())
}

pub async fn handle_watchdog(tk: &Toolkit) -> Result<()> {
    let outcome = ops::run_watchdog(tk, Utc::now().timestamp()).await?;
    watchdog::report_outcome(tk, outcome)
}

pub async fn handle_status(tk: &Toolkit) -> Result<()> {
    let now = Local::now().naive_local();
    let report = ops::collect_status(tk, now, Utc::now().timestamp_millis()).await?;
    ops::render_status(tk, &report, now);
    Ok(())
}

pub fn handle_rotate(tk: &Toolkit) -> Result<()> {
    match ops::rotate_config(&tk.paths, Local::now().naive_local())? {
        RotateOutcome::Snapshotted { path, pruned } => {
            tk.reporter.ok(format!("snapshot written to {}", path.display()));
            if !pruned.is_empty() {
                tk.reporter
                    .info(format!("pruned {} old snapshot(s)", pruned.len()));
            }
        }
        RotateOutcome::Unchanged => tk.reporter.info("config unchanged since last snapshot"),
        RotateOutcome::NoConfig => tk.reporter.warn(format!(
            "{} not found; nothing to snapshot",
            tk.paths.config_file().display()
        )),
    }
    Ok(())
}
