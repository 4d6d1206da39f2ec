//! `clawkit setup`: idempotent host provisioning.

use std::net::TcpListener;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::templates::{
    template_vars, TemplateSet, AUTH_PROFILES_TEMPLATE, CONFIG_TEMPLATE, UNIT_TEMPLATE,
    WORKSPACE_FILES,
};
use super::{crontab, systemd, Executor, WriteOutcome};
use crate::auth::client::random_hex;
use crate::config::{validate_required, EnvFile, Settings, ToolkitPaths};
use crate::context::Toolkit;
use crate::error::{ClawError, Result};
use crate::system::CommandSpec;

/// Programs that must be on `PATH` before setup touches anything.
pub const REQUIRED_PROGRAMS: [&str; 3] = ["openclaw", "systemctl", "crontab"];

const PREREQS_HINT: &str = "run `sudo clawkit prereqs --bot-user <name>` first";

#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub env_file: PathBuf,
    pub dry_run: bool,
    pub templates_dir: Option<PathBuf>,
    /// Binary the managed cron entries invoke.
    pub exe: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct SetupReport {
    pub generated_gateway_token: bool,
    pub env_rewritten: bool,
    pub files: Vec<(PathBuf, WriteOutcome)>,
    pub crontab_changed: bool,
}

impl SetupReport {
    pub fn outcome_for(&self, path: &Path) -> Option<WriteOutcome> {
        self.files
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, outcome)| *outcome)
    }
}

/// Run every setup step in order.
pub async fn run_setup(tk: &Toolkit, opts: &SetupOptions) -> Result<SetupReport> {
    let exec = Executor::new(tk, opts.dry_run);
    let mut report = SetupReport::default();

    // 1. configuration
    let mut env = EnvFile::load(&opts.env_file)?;
    validate_required(&env)?;
    let env_file = absolute(&opts.env_file)?;
    tk.reporter.ok(format!("loaded {}", env_file.display()));

    // 2. prerequisites
    let openclaw_bin = check_prerequisites(tk)?;

    // 3. port
    let settings = Settings::resolve(Some(&env))?;
    check_port(&exec, settings.gateway_port).await?;

    // 4. secrets
    if env.get_non_empty("GATEWAY_TOKEN").is_none() {
        env.set("GATEWAY_TOKEN", random_hex(24));
        report.generated_gateway_token = true;
        tk.reporter.ok("generated GATEWAY_TOKEN");
    }
    let settings = Settings::resolve(Some(&env))?;

    // 5. .env normalisation
    let outcome = exec.write_file(&env_file, &env.render(), 0o600)?;
    report.env_rewritten = outcome.changed() || matches!(outcome, WriteOutcome::WouldUpdate);
    report.files.push((env_file.clone(), outcome));

    // 6. directories
    let paths = &tk.paths;
    for (dir, mode) in state_dirs(paths) {
        exec.create_dir(&dir, mode)?;
    }

    // 7. rendered configuration
    let templates = TemplateSet::new(opts.templates_dir.clone());
    let vars = template_vars(&env, &settings, paths, &openclaw_bin);
    for (name, target) in [
        (CONFIG_TEMPLATE, paths.config_file()),
        (AUTH_PROFILES_TEMPLATE, paths.auth_profiles_file()),
    ] {
        let rendered = templates.render(name, &vars)?;
        let outcome = exec.write_file(&target, &rendered, 0o600)?;
        report_write(tk, &target, outcome);
        report.files.push((target, outcome));
    }

    // 8. workspace files, created once
    for file in WORKSPACE_FILES {
        let target = paths.workspace_dir().join(file);
        let rendered = templates.render(&format!("workspace/{file}"), &vars)?;
        let outcome = exec.write_if_absent(&target, &rendered, 0o644)?;
        report_write(tk, &target, outcome);
        report.files.push((target, outcome));
    }

    // 9. systemd unit
    let unit_path = paths.unit_file();
    exec.create_dir(&paths.systemd_user_dir, 0o755)?;
    let unit = templates.render(UNIT_TEMPLATE, &vars)?;
    let outcome = exec.write_file(&unit_path, &unit, 0o644)?;
    report_write(tk, &unit_path, outcome);
    report.files.push((unit_path, outcome));
    for spec in systemd::activation_commands() {
        exec.run_checked(&spec).await?;
    }
    if !opts.dry_run {
        tk.reporter.ok("gateway service enabled and restarted");
    }

    // 10. cron
    let cron_path = crontab::cron_path(&[openclaw_bin.as_path(), opts.exe.as_path()]);
    let block = crontab::managed_block(&opts.exe, &env_file, &paths.logs_dir(), &cron_path);
    report.crontab_changed = install_crontab(&exec, &block).await?;

    // 11. post-check
    if opts.dry_run {
        tk.reporter.dry_run("would run: openclaw doctor");
    } else {
        let doctor = CommandSpec::new("openclaw").arg("doctor");
        match tk.runner.run(&doctor).await {
            Ok(out) if out.success() => tk.reporter.ok("openclaw doctor passed"),
            Ok(out) => tk.reporter.warn(format!(
                "openclaw doctor reported problems (exit {:?}): {}",
                out.code,
                out.stderr.trim()
            )),
            Err(err) => tk.reporter.warn(format!("openclaw doctor could not run: {err}")),
        }
    }

    info!(dry_run = opts.dry_run, "setup finished");
    Ok(report)
}

/// Directories under the state dir, with their modes.
pub fn state_dirs(paths: &ToolkitPaths) -> Vec<(PathBuf, u32)> {
    vec![
        (paths.state_dir.clone(), 0o700),
        (paths.credentials_dir(), 0o700),
        (paths.agent_dir(), 0o700),
        (paths.workspace_dir(), 0o755),
        (paths.memory_dir(), 0o755),
        (paths.logs_dir(), 0o755),
        (paths.watchdog_dir(), 0o700),
        (paths.config_history_dir(), 0o700),
    ]
}

/// Resolve the required programs; returns the `openclaw` path.
fn check_prerequisites(tk: &Toolkit) -> Result<PathBuf> {
    let mut openclaw = None;
    for program in REQUIRED_PROGRAMS {
        let found = tk
            .runner
            .which(program)
            .ok_or_else(|| ClawError::missing_prerequisite(program, PREREQS_HINT))?;
        debug!(program, path = %found.display(), "prerequisite found");
        if program == "openclaw" {
            openclaw = Some(found);
        }
    }
    tk.reporter.ok("prerequisites present");
    Ok(openclaw.unwrap_or_else(|| PathBuf::from("openclaw")))
}

/// Fail if the gateway port is taken by something other than our gateway.
async fn check_port(exec: &Executor<'_>, port: u16) -> Result<()> {
    if TcpListener::bind(("127.0.0.1", port)).is_ok() {
        return Ok(());
    }
    let tk = exec.toolkit();
    if exec.dry_run() {
        tk.reporter.warn(format!(
            "port {port} is in use (fine if the gateway is already running)"
        ));
        return Ok(());
    }
    if systemd::is_active(tk.runner.as_ref()).await {
        debug!(port, "port held by the running gateway");
        return Ok(());
    }
    Err(ClawError::PortConflict { port })
}

/// Install the managed block; returns whether the crontab changed.
async fn install_crontab(exec: &Executor<'_>, block: &str) -> Result<bool> {
    let tk = exec.toolkit();
    if exec.dry_run() {
        tk.reporter
            .dry_run("would install the managed crontab block (backup, watchdog, rotate-config)");
        return Ok(false);
    }
    let existing = crontab::read_crontab(tk.runner.as_ref()).await?;
    let updated = crontab::install_block(&existing, block);
    if updated == existing {
        tk.reporter.ok("crontab already up to date");
        return Ok(false);
    }
    exec.run_checked(&crontab::write_spec(&updated)).await?;
    tk.reporter.ok("crontab installed");
    Ok(true)
}

fn report_write(tk: &Toolkit, path: &Path, outcome: WriteOutcome) {
    match outcome {
        WriteOutcome::Created => tk.reporter.ok(format!("created {}", path.display())),
        WriteOutcome::Updated => tk.reporter.ok(format!("updated {}", path.display())),
        WriteOutcome::Preserved => debug!(path = %path.display(), "kept existing file"),
        WriteOutcome::Unchanged => debug!(path = %path.display(), "unchanged"),
        WriteOutcome::WouldCreate | WriteOutcome::WouldUpdate => {}
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_dirs_keep_secrets_private() {
        let paths = ToolkitPaths::from_home("/home/bot");
        let dirs = state_dirs(&paths);
        assert_eq!(dirs[0], (PathBuf::from("/home/bot/.openclaw"), 0o700));
        assert!(dirs.contains(&(paths.credentials_dir(), 0o700)));
        assert!(dirs.contains(&(paths.memory_dir(), 0o755)));
    }
}
