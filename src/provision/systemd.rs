//! `systemctl --user` helpers for the gateway unit.

use crate::config::GATEWAY_UNIT;
use crate::system::{CommandRunner, CommandSpec};

/// `systemctl --user <args...>`, carrying the user-bus variables cron omits.
pub fn systemctl(args: &[&str]) -> CommandSpec {
    let env = user_bus_env(
        std::env::var("XDG_RUNTIME_DIR").ok(),
        std::env::var("DBUS_SESSION_BUS_ADDRESS").ok(),
        current_uid(),
    );
    env.into_iter().fold(
        CommandSpec::new("systemctl").arg("--user").args(args.iter().copied()),
        |spec, (key, value)| spec.env(key, value),
    )
}

/// Variables missing from the environment that `systemctl --user` needs to
/// reach the user manager: `XDG_RUNTIME_DIR` (defaulting to
/// `/run/user/<uid>`) and the session bus under it.
pub fn user_bus_env(
    runtime_dir: Option<String>,
    bus_address: Option<String>,
    uid: Option<u32>,
) -> Vec<(String, String)> {
    let mut env = Vec::new();
    let runtime_dir = match runtime_dir.filter(|d| !d.is_empty()) {
        Some(dir) => dir,
        None => {
            let Some(uid) = uid else {
                return env;
            };
            let dir = format!("/run/user/{uid}");
            env.push(("XDG_RUNTIME_DIR".to_string(), dir.clone()));
            dir
        }
    };
    if bus_address.map_or(true, |a| a.is_empty()) {
        env.push((
            "DBUS_SESSION_BUS_ADDRESS".to_string(),
            format!("unix:path={runtime_dir}/bus"),
        ));
    }
    env
}

/// Effective uid, read from the owner of `/proc/self`.
#[cfg(unix)]
fn current_uid() -> Option<u32> {
    use std::os::unix::fs::MetadataExt;
    std::fs::metadata("/proc/self").ok().map(|m| m.uid())
}

#[cfg(not(unix))]
fn current_uid() -> Option<u32> {
    None
}

/// Whether the gateway unit is currently active. Errors count as inactive.
pub async fn is_active(runner: &dyn CommandRunner) -> bool {
    runner
        .run(&systemctl(&["is-active", "--quiet", GATEWAY_UNIT]))
        .await
        .map(|out| out.success())
        .unwrap_or(false)
}

/// Lifecycle commands issued after (re)installing the unit file.
pub fn activation_commands() -> Vec<CommandSpec> {
    vec![
        systemctl(&["daemon-reload"]),
        systemctl(&["enable", GATEWAY_UNIT]),
        systemctl(&["restart", GATEWAY_UNIT]),
    ]
}
