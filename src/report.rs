//! User-facing progress output with coloured severity tags.

use std::io::{IsTerminal, Write};
use std::sync::{Arc, Mutex};

use crossterm::style::{StyledContent, Stylize};

use crate::auth::AuthError;
use crate::error::ClawError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Ok,
    Warn,
    Error,
    DryRun,
}

impl Severity {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Info => "[INFO]",
            Self::Ok => "[OK]",
            Self::Warn => "[WARN]",
            Self::Error => "[ERROR]",
            Self::DryRun => "[DRY-RUN]",
        }
    }

    fn styled(self) -> StyledContent<&'static str> {
        let tag = self.tag();
        match self {
            Self::Info => tag.blue(),
            Self::Ok => tag.green(),
            Self::Warn => tag.yellow(),
            Self::Error => tag.red().bold(),
            Self::DryRun => tag.cyan(),
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Self::Warn | Self::Error)
    }
}

#[derive(Debug, Clone)]
enum Sink {
    Terminal { color: bool },
    Capture(Arc<Mutex<Vec<String>>>),
}

/// Writes tagged lines to stdout/stderr (warnings and errors to stderr).
#[derive(Debug, Clone)]
pub struct Reporter {
    sink: Sink,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::terminal()
    }
}

impl Reporter {
    /// Colour is enabled when stderr is a terminal and `NO_COLOR` is unset.
    pub fn terminal() -> Self {
        let color = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self {
            sink: Sink::Terminal { color },
        }
    }

    /// Collects plain lines in memory instead of printing.
    pub fn capturing() -> Self {
        Self {
            sink: Sink::Capture(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    /// Lines captured so far (empty for a terminal reporter).
    pub fn lines(&self) -> Vec<String> {
        match &self.sink {
            Sink::Capture(lines) => lines.lock().map(|l| l.clone()).unwrap_or_default(),
            Sink::Terminal { .. } => Vec::new(),
        }
    }

    pub fn emit(&self, severity: Severity, message: impl AsRef<str>) {
        let message = message.as_ref();
        match &self.sink {
            Sink::Capture(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(format!("{} {message}", severity.tag()));
                }
            }
            Sink::Terminal { color } => {
                let line = if *color {
                    format!("{} {message}", severity.styled())
                } else {
                    format!("{} {message}", severity.tag())
                };
                if severity.to_stderr() {
                    let _ = writeln!(std::io::stderr().lock(), "{line}");
                } else {
                    let _ = writeln!(std::io::stdout().lock(), "{line}");
                }
            }
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.emit(Severity::Info, message);
    }

    pub fn ok(&self, message: impl AsRef<str>) {
        self.emit(Severity::Ok, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.emit(Severity::Warn, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(Severity::Error, message);
    }

    pub fn dry_run(&self, message: impl AsRef<str>) {
        self.emit(Severity::DryRun, message);
    }

    /// Print `err` with a remediation hint where one exists.
    pub fn failure(&self, err: &ClawError) {
        self.error(format_error_help(err));
    }
}

/// Map a [`ClawError`] to a message with actionable guidance.
pub fn format_error_help(err: &ClawError) -> String {
    match err {
        ClawError::Auth(AuthError::MissingClientCredentials(detail)) => format!(
            "{err}. Set GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET in .env \
             or save the OAuth client JSON to ~/.openclaw/credentials/google-client.json ({detail})"
        ),
        ClawError::Auth(AuthError::RefreshFailed { .. }) => {
            format!("{err}. Re-authorize with: clawkit auth login <service>")
        }
        ClawError::PortConflict { port } => format!(
            "{err}. Free the port or set GATEWAY_PORT to something other than {port} in .env"
        ),
        ClawError::RateLimited { .. } => {
            format!("{err}. Inspect the gateway with: journalctl --user -u openclaw-gateway.service")
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capturing_reporter_records_tags() {
        let reporter = Reporter::capturing();
        reporter.dry_run("would write openclaw.json");
        reporter.warn("port busy");
        assert_eq!(
            reporter.lines(),
            vec![
                "[DRY-RUN] would write openclaw.json".to_string(),
                "[WARN] port busy".to_string()
            ]
        );
    }

    #[test]
    fn port_conflict_help_mentions_gateway_port() {
        let help = format_error_help(&ClawError::PortConflict { port: 18789 });
        assert!(help.contains("GATEWAY_PORT"));
        assert!(help.contains("18789"));
    }

    #[test]
    fn other_errors_fall_through_to_display() {
        let help = format_error_help(&ClawError::Validation("bad".into()));
        assert_eq!(help, "Invalid configuration: bad");
    }
}
