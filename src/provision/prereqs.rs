//! `clawkit prereqs`: system packages, Node.js, openclaw and the bot user.

use tracing::info;

use super::Executor;
use crate::context::Toolkit;
use crate::error::{ClawError, Result};
use crate::system::CommandSpec;

pub const MIN_NODE_MAJOR: u32 = 22;
pub const APT_PACKAGES: [&str; 6] = [
    "curl",
    "git",
    "jq",
    "gettext-base",
    "sqlite3",
    "openssh-client",
];
const NODESOURCE_SETUP: &str = "curl -fsSL https://deb.nodesource.com/setup_22.x | bash -";

#[derive(Debug, Clone)]
pub struct PrereqOptions {
    pub bot_user: String,
    pub skip_system: bool,
}

/// Major version from `node --version` output (`v22.11.0`).
pub fn parse_node_major(version: &str) -> Option<u32> {
    version
        .trim()
        .trim_start_matches('v')
        .split('.')
        .next()?
        .parse()
        .ok()
}

pub async fn run_prereqs(tk: &Toolkit, opts: &PrereqOptions) -> Result<()> {
    let exec = Executor::new(tk, false);
    require_root(tk).await?;

    if opts.skip_system {
        tk.reporter.info("skipping system packages");
    } else {
        exec.run_checked(&CommandSpec::new("apt-get").arg("update"))
            .await?;
        exec.run_checked(
            &CommandSpec::new("apt-get")
                .args(["install", "-y"])
                .args(APT_PACKAGES),
        )
        .await?;
        tk.reporter.ok("system packages installed");

        ensure_node(&exec).await?;

        exec.run_checked(&CommandSpec::new("npm").args(["install", "-g", "openclaw"]))
            .await?;
        tk.reporter.ok("openclaw installed");
    }

    let user = opts.bot_user.as_str();
    let exists = tk
        .runner
        .run(&CommandSpec::new("id").arg(user))
        .await?
        .success();
    if exists {
        tk.reporter.info(format!("user {user} already exists"));
    } else {
        exec.run_checked(&CommandSpec::new("useradd").args(["-m", "-s", "/bin/bash", user]))
            .await?;
        tk.reporter.ok(format!("created user {user}"));
    }
    exec.run_checked(&CommandSpec::new("loginctl").args(["enable-linger", user]))
        .await?;
    tk.reporter.ok(format!("lingering enabled for {user}"));
    Ok(())
}

async fn require_root(tk: &Toolkit) -> Result<()> {
    let out = tk.runner.run(&CommandSpec::new("id").arg("-u")).await?;
    if out.success() && out.stdout.trim() == "0" {
        Ok(())
    } else {
        Err(ClawError::missing_prerequisite(
            "root privileges",
            "re-run with sudo: sudo clawkit prereqs --bot-user <name>",
        ))
    }
}

async fn ensure_node(exec: &Executor<'_>) -> Result<()> {
    let tk = exec.toolkit();
    let current = match tk.runner.run(&CommandSpec::new("node").arg("--version")).await {
        Ok(out) if out.success() => parse_node_major(&out.stdout),
        _ => None,
    };
    if let Some(major) = current.filter(|m| *m >= MIN_NODE_MAJOR) {
        tk.reporter.info(format!("node {major} already installed"));
        return Ok(());
    }
    info!(current = ?current, "installing Node.js {MIN_NODE_MAJOR} from NodeSource");
    exec.run_checked(&CommandSpec::new("sh").args(["-c", NODESOURCE_SETUP]))
        .await?;
    exec.run_checked(&CommandSpec::new("apt-get").args(["install", "-y", "nodejs"]))
        .await?;
    tk.reporter.ok("Node.js installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_major_parses() {
        assert_eq!(parse_node_major("v22.11.0\n"), Some(22));
        assert_eq!(parse_node_major("v18.2.1"), Some(18));
        assert_eq!(parse_node_major("garbage"), None);
    }
}
