//! Shared handles passed to provisioning and operations commands.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Settings, ToolkitPaths};
use crate::report::Reporter;
use crate::system::{CommandRunner, SystemRunner};

/// Timeout for the gateway HTTP health probe.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a command needs: resolved paths and settings, the external
/// command runner, the reporter and an HTTP client.
#[derive(Clone)]
pub struct Toolkit {
    pub paths: ToolkitPaths,
    pub settings: Settings,
    pub runner: Arc<dyn CommandRunner>,
    pub reporter: Reporter,
    pub http: reqwest::Client,
}

impl Toolkit {
    pub fn new(
        paths: ToolkitPaths,
        settings: Settings,
        runner: Arc<dyn CommandRunner>,
        reporter: Reporter,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(HEALTH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            paths,
            settings,
            runner,
            reporter,
            http,
        }
    }

    /// Real processes and terminal output.
    pub fn system(paths: ToolkitPaths, settings: Settings) -> Self {
        Self::new(
            paths,
            settings,
            Arc::new(SystemRunner::new()),
            Reporter::terminal(),
        )
    }
}
