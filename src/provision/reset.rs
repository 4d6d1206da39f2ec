//! `clawkit reset`: undo what setup installed.

use std::path::PathBuf;

use tracing::warn;

use super::{crontab, systemd, Executor};
use crate::config::GATEWAY_UNIT;
use crate::context::Toolkit;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct ResetOptions {
    pub env_file: PathBuf,
    pub dry_run: bool,
    pub keep_backups: bool,
    pub keep_env: bool,
}

/// Stop and remove the gateway unit, the managed cron block and the state
/// directory. Missing pieces are skipped.
pub async fn run_reset(tk: &Toolkit, opts: &ResetOptions) -> Result<()> {
    let exec = Executor::new(tk, opts.dry_run);
    let paths = &tk.paths;
    let unit_path = paths.unit_file();

    if unit_path.exists() {
        for action in ["stop", "disable"] {
            let spec = systemd::systemctl(&[action, GATEWAY_UNIT]);
            let out = exec.run(&spec).await?;
            if !out.success() {
                warn!(command = %spec.display(), stderr = %out.stderr.trim(), "ignoring failure");
            }
        }
        exec.remove(&unit_path)?;
        exec.run(&systemd::systemctl(&["daemon-reload"])).await?;
        tk.reporter.ok("gateway unit removed");
    } else {
        tk.reporter.info("no gateway unit installed");
    }

    remove_cron_block(&exec).await?;

    if exec.remove(&paths.state_dir)? {
        tk.reporter.ok(format!("removed {}", paths.state_dir.display()));
    }
    if opts.keep_backups {
        tk.reporter.info(format!("kept {}", paths.backup_dir.display()));
    } else if exec.remove(&paths.backup_dir)? {
        tk.reporter.ok(format!("removed {}", paths.backup_dir.display()));
    }
    if opts.keep_env {
        tk.reporter.info(format!("kept {}", opts.env_file.display()));
    } else if exec.remove(&opts.env_file)? {
        tk.reporter.ok(format!("removed {}", opts.env_file.display()));
    }
    Ok(())
}

async fn remove_cron_block(exec: &Executor<'_>) -> Result<()> {
    let tk = exec.toolkit();
    if exec.dry_run() {
        tk.reporter
            .dry_run("would remove the managed crontab block");
        return Ok(());
    }
    if tk.runner.which("crontab").is_none() {
        return Ok(());
    }
    let existing = crontab::read_crontab(tk.runner.as_ref()).await?;
    if !crontab::has_managed_block(&existing) {
        return Ok(());
    }
    let stripped = crontab::strip_managed(&existing);
    exec.run_checked(&crontab::write_spec(&stripped)).await?;
    tk.reporter.ok("managed crontab block removed");
    Ok(())
}
