//! `clawkit status`: one-screen overview of the deployment.

use chrono::{NaiveDateTime, TimeDelta};

use super::backup::{latest_archive, BackupArchive};
use super::watchdog::{check_health, HealthVia, RestartLimiter};
use crate::auth::{GoogleService, TokenStore, EXPIRY_MARGIN_MS};
use crate::context::Toolkit;
use crate::error::Result;
use crate::provision::{crontab, systemd};

/// Google token state for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Missing,
    Valid,
    /// Inside the refresh margin or past expiry; refreshed on next use.
    Expiring,
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub unit_active: bool,
    pub health: Option<HealthVia>,
    pub restarts_in_window: usize,
    pub latest_backup: Option<BackupArchive>,
    pub cron_installed: bool,
    pub tokens: Vec<(GoogleService, TokenState)>,
}

impl StatusReport {
    pub fn backup_age(&self, now: NaiveDateTime) -> Option<TimeDelta> {
        self.latest_backup.as_ref().map(|b| now - b.created)
    }
}

pub async fn collect_status(tk: &Toolkit, now: NaiveDateTime, now_ms: i64) -> Result<StatusReport> {
    let unit_active = systemd::is_active(tk.runner.as_ref()).await;
    let health = check_health(tk).await;
    let limiter = RestartLimiter::new(tk.paths.restart_log(), tk.settings.watchdog_max_restarts);
    let restarts_in_window = limiter.restarts_in_window(now_ms / 1000)?;
    let latest_backup = latest_archive(&tk.paths.backup_dir)?;
    let cron_installed = match crontab::read_crontab(tk.runner.as_ref()).await {
        Ok(existing) => crontab::has_managed_block(&existing),
        Err(_) => false,
    };

    let store = tk.paths.token_store();
    let tokens = GoogleService::ALL
        .iter()
        .map(|&service| {
            let state = match store.load(service.store_key()) {
                Ok(None) => TokenState::Missing,
                Ok(Some(token)) if token.is_fresh(now_ms) => TokenState::Valid,
                Ok(Some(_)) => TokenState::Expiring,
                Err(_) => TokenState::Unreadable,
            };
            (service, state)
        })
        .collect();

    Ok(StatusReport {
        unit_active,
        health,
        restarts_in_window,
        latest_backup,
        cron_installed,
        tokens,
    })
}

/// Print `report` through the toolkit reporter.
pub fn render_status(tk: &Toolkit, report: &StatusReport, now: NaiveDateTime) {
    let r = &tk.reporter;
    if report.unit_active {
        r.ok("gateway unit: active");
    } else {
        r.warn("gateway unit: inactive");
    }
    match report.health {
        Some(via) => r.ok(format!("gateway health: ok (via {via})")),
        None => r.warn("gateway health: failing"),
    }
    let max = tk.settings.watchdog_max_restarts;
    let line = format!(
        "watchdog restarts in the last hour: {}/{max}",
        report.restarts_in_window
    );
    if report.restarts_in_window >= max {
        r.warn(line);
    } else {
        r.info(line);
    }
    match (&report.latest_backup, report.backup_age(now)) {
        (Some(backup), Some(age)) => {
            let line = format!(
                "latest backup: {} ({}h old)",
                backup.path.display(),
                age.num_hours()
            );
            if age > TimeDelta::days(2) {
                r.warn(line);
            } else {
                r.ok(line);
            }
        }
        _ => r.warn("latest backup: none"),
    }
    if report.cron_installed {
        r.ok("cron jobs: installed");
    } else {
        r.warn("cron jobs: missing (run clawkit setup)");
    }
    for (service, state) in &report.tokens {
        let name = service.display_name();
        match state {
            TokenState::Valid => r.ok(format!("{name}: token valid")),
            TokenState::Expiring => r.info(format!(
                "{name}: token within {}s of expiry, refreshed on next use",
                EXPIRY_MARGIN_MS / 1000
            )),
            TokenState::Missing => r.info(format!("{name}: not connected (clawkit auth login {service})")),
            TokenState::Unreadable => r.warn(format!("{name}: token file unreadable")),
        }
    }
}
