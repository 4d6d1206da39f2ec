//! Gateway health escalation and the restart rate limiter.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use strum::Display;
use tracing::{info, warn};

use crate::config::GATEWAY_UNIT;
use crate::context::Toolkit;
use crate::error::{ClawError, Result};
use crate::provision::systemd;
use crate::system::CommandSpec;
use crate::util::fs::write_with_mode;
use crate::util::lock::FileLock;

/// Rolling window for counting restarts.
pub const RESTART_WINDOW_SECS: i64 = 3600;
/// How long to wait for another watchdog holding the tracker lock.
pub const LOCK_WAIT: Duration = Duration::from_secs(10);

/// Keep the timestamps inside the window ending at `now`, in order.
pub fn prune(entries: &[i64], now: i64) -> Vec<i64> {
    let cutoff = now - RESTART_WINDOW_SECS;
    entries.iter().copied().filter(|&t| t >= cutoff).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDecision {
    Permitted { restarts_in_window: usize },
    RateLimited { restarts_in_window: usize },
}

/// File-backed restart tracker (one epoch-second per line).
#[derive(Debug, Clone)]
pub struct RestartLimiter {
    path: PathBuf,
    max_restarts: usize,
}

impl RestartLimiter {
    pub fn new(path: impl Into<PathBuf>, max_restarts: usize) -> Self {
        Self {
            path: path.into(),
            max_restarts,
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Prune, then record `now` if fewer than the maximum restarts remain in
    /// the window. The file holds the pruned list afterwards either way.
    pub fn check_and_record(&self, now: i64) -> Result<RestartDecision> {
        let _lock = FileLock::acquire(&self.lock_path(), LOCK_WAIT)?;
        let mut entries = prune(&self.load()?, now);
        let decision = if entries.len() < self.max_restarts {
            entries.push(now);
            RestartDecision::Permitted {
                restarts_in_window: entries.len(),
            }
        } else {
            RestartDecision::RateLimited {
                restarts_in_window: entries.len(),
            }
        };
        self.store(&entries)?;
        Ok(decision)
    }

    /// [`Self::check_and_record`] on the blocking pool, so waiting for the
    /// tracker lock does not stall the async runtime.
    pub async fn record_restart(&self, now: i64) -> Result<RestartDecision> {
        let limiter = self.clone();
        tokio::task::spawn_blocking(move || limiter.check_and_record(now))
            .await
            .map_err(|err| ClawError::Lock(format!("restart tracker task failed: {err}")))?
    }

    /// Restarts inside the window, without modifying the file.
    pub fn restarts_in_window(&self, now: i64) -> Result<usize> {
        Ok(prune(&self.load()?, now).len())
    }

    pub fn load(&self) -> Result<Vec<i64>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut entries = Vec::new();
        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.parse::<i64>() {
                Ok(ts) => entries.push(ts),
                Err(_) => warn!(path = %self.path.display(), line, "dropping corrupt restart entry"),
            }
        }
        Ok(entries)
    }

    fn store(&self, entries: &[i64]) -> Result<()> {
        let body: String = entries.iter().map(|t| format!("{t}\n")).collect();
        write_with_mode(&self.path, body.as_bytes(), 0o600)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum HealthVia {
    Cli,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    Healthy { via: HealthVia },
    Restarted { restarts_in_window: usize },
    RateLimited { restarts_in_window: usize },
}

/// `openclaw health`, then `GET /health`. `None` when both fail.
pub async fn check_health(tk: &Toolkit) -> Option<HealthVia> {
    let spec = CommandSpec::new("openclaw").arg("health");
    match tk.runner.run(&spec).await {
        Ok(output) if output.success() => return Some(HealthVia::Cli),
        Ok(output) => warn!(code = ?output.code, "openclaw health reported unhealthy"),
        Err(err) => warn!(error = %err, "openclaw health could not run"),
    }

    let url = tk.settings.health_url();
    match tk.http.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Some(HealthVia::Http),
        Ok(resp) => {
            warn!(%url, status = resp.status().as_u16(), "gateway health endpoint failed");
            None
        }
        Err(err) => {
            warn!(%url, error = %err, "gateway health endpoint unreachable");
            None
        }
    }
}

/// One watchdog pass: health checks, then a rate-limited restart.
pub async fn run_watchdog(tk: &Toolkit, now: i64) -> Result<WatchdogOutcome> {
    if let Some(via) = check_health(tk).await {
        info!(%via, "gateway healthy");
        return Ok(WatchdogOutcome::Healthy { via });
    }

    let limiter = RestartLimiter::new(
        tk.paths.restart_log(),
        tk.settings.watchdog_max_restarts,
    );
    match limiter.record_restart(now).await? {
        RestartDecision::RateLimited { restarts_in_window } => {
            warn!(restarts_in_window, "restart refused by rate limiter");
            Ok(WatchdogOutcome::RateLimited { restarts_in_window })
        }
        RestartDecision::Permitted { restarts_in_window } => {
            info!(restarts_in_window, "restarting {GATEWAY_UNIT}");
            tk.runner
                .run_checked(&systemd::systemctl(&["restart", GATEWAY_UNIT]))
                .await?;
            Ok(WatchdogOutcome::Restarted { restarts_in_window })
        }
    }
}

/// Report a watchdog outcome; rate limiting becomes an error.
pub fn report_outcome(tk: &Toolkit, outcome: WatchdogOutcome) -> Result<()> {
    match outcome {
        WatchdogOutcome::Healthy { via } => {
            tk.reporter.ok(format!("gateway healthy (via {via})"));
            Ok(())
        }
        WatchdogOutcome::Restarted { restarts_in_window } => {
            tk.reporter.warn(format!(
                "gateway unhealthy, restarted ({restarts_in_window} restart(s) in the last hour)"
            ));
            Ok(())
        }
        WatchdogOutcome::RateLimited { restarts_in_window } => Err(ClawError::RateLimited {
            restarts: restarts_in_window,
            window_secs: RESTART_WINDOW_SECS,
        }),
    }
}
