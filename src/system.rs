//! External command execution.
//!
//! Everything that shells out (`systemctl`, `crontab`, `tar`, `openclaw`, ...)
//! goes through [`CommandRunner`] so provisioning and operations can be
//! exercised against a recording fake.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{ClawError, Result};
use crate::util::timeout::with_timeout;

/// Default upper bound for a single external command.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// A command line plus optional stdin and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
    /// Set on top of the inherited environment.
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Shell-like rendering used in dry-run and log output.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into [`ClawError::CommandFailed`].
    pub fn check(self, spec: &CommandSpec) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(ClawError::CommandFailed {
                program: spec.display(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs external programs.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion. A non-zero exit is reported in the output, not as
    /// an error; failure to spawn is an error.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;

    /// Resolve `program` on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;

    /// Run and require exit status 0.
    async fn run_checked(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.run(spec).await?.check(spec)
    }
}

/// [`CommandRunner`] backed by real processes.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            timeout: COMMAND_TIMEOUT,
        }
    }
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!(command = %spec.display(), "running command");
        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(if spec.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ClawError::missing_prerequisite(
                    spec.program.clone(),
                    format!("`{}` was not found on PATH", spec.program),
                )
            } else {
                ClawError::Io(e)
            }
        })?;

        if let (Some(input), Some(mut pipe)) = (spec.stdin.as_ref(), child.stdin.take()) {
            pipe.write_all(input.as_bytes()).await?;
            drop(pipe);
        }

        let output = with_timeout(self.timeout, async {
            child.wait_with_output().await.map_err(ClawError::from)
        })
        .await?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        let path_var = std::env::var_os("PATH")?;
        find_in_path(program, std::env::split_paths(&path_var))
    }
}

/// First executable `program` among `dirs`.
pub fn find_in_path<I>(program: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }
    dirs.into_iter()
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn display_joins_program_and_args() {
        let spec = CommandSpec::new("systemctl")
            .args(["--user", "restart"])
            .arg("openclaw-gateway.service");
        assert_eq!(
            spec.display(),
            "systemctl --user restart openclaw-gateway.service"
        );
    }

    #[test]
    fn env_is_not_part_of_display() {
        let spec = CommandSpec::new("systemctl")
            .arg("--user")
            .env("XDG_RUNTIME_DIR", "/run/user/1000");
        assert_eq!(spec.display(), "systemctl --user");
        assert_eq!(
            spec.env,
            vec![("XDG_RUNTIME_DIR".to_string(), "/run/user/1000".to_string())]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_passes_extra_env() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "printf %s \"$CLAWKIT_EXTRA_VAR\""])
            .env("CLAWKIT_EXTRA_VAR", "from-spec");
        let output = SystemRunner::new().run(&spec).await.unwrap();
        assert_eq!(output.stdout, "from-spec");
    }

    #[test]
    fn check_maps_failure_to_command_failed() {
        let spec = CommandSpec::new("crontab").arg("-");
        let output = CommandOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "no crontab\n".to_string(),
        };
        let err = output.check(&spec).unwrap_err();
        assert!(matches!(
            err,
            ClawError::CommandFailed { code: Some(1), ref stderr, .. } if stderr == "no crontab"
        ));
    }

    #[cfg(unix)]
    #[test]
    fn find_in_path_requires_executable_bit() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let tool = dir.path().join("openclaw");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();
        assert!(find_in_path("openclaw", vec![dir.path().to_path_buf()]).is_none());
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(
            find_in_path("openclaw", vec![dir.path().to_path_buf()]),
            Some(tool)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn system_runner_captures_output_and_stdin() {
        let runner = SystemRunner::new();
        let spec = CommandSpec::new("sh").args(["-c", "cat; echo err >&2; exit 3"]).stdin("hello");
        let output = runner.run(&spec).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "hello");
        assert_eq!(output.stderr.trim(), "err");
        assert!(runner.run_checked(&spec).await.is_err());
    }
}
