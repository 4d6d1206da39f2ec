#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clawkit::auth::{AuthError, StoredToken, TokenStore};
use clawkit::config::{Settings, ToolkitPaths};
use clawkit::context::Toolkit;
use clawkit::error::Result;
use clawkit::report::Reporter;
use clawkit::system::{CommandOutput, CommandRunner, CommandSpec};

#[derive(Default)]
pub struct InMemoryTokenStore {
    tokens: Mutex<HashMap<String, StoredToken>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, service: &str, token: StoredToken) {
        self.tokens
            .lock()
            .expect("store lock poisoned")
            .insert(service.to_string(), token);
    }

    pub fn get(&self, service: &str) -> Option<StoredToken> {
        self.tokens
            .lock()
            .expect("store lock poisoned")
            .get(service)
            .cloned()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self, service: &str) -> std::result::Result<Option<StoredToken>, AuthError> {
        Ok(self.get(service))
    }

    fn save(&self, service: &str, token: &StoredToken) -> std::result::Result<(), AuthError> {
        self.seed(service, token.clone());
        Ok(())
    }

    fn clear(&self, service: &str) -> std::result::Result<(), AuthError> {
        self.tokens
            .lock()
            .expect("store lock poisoned")
            .remove(service);
        Ok(())
    }
}

pub fn token(access_token: &str, expiry_date: i64) -> StoredToken {
    StoredToken {
        access_token: access_token.to_string(),
        refresh_token: "1//refresh".to_string(),
        token_type: "Bearer".to_string(),
        expiry_date,
        scope: "https://www.googleapis.com/auth/drive".to_string(),
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Command runner that records every call and answers from canned outputs.
///
/// A response applies when its key is a prefix of the rendered command line;
/// anything unmatched exits 0 with empty output.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    responses: Mutex<Vec<(String, CommandOutput)>>,
    programs: Vec<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Programs `which` resolves (under `/usr/bin`).
    pub fn with_programs(mut self, programs: &[&str]) -> Self {
        self.programs = programs.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn respond(&self, prefix: &str, code: i32, stdout: &str, stderr: &str) {
        self.responses.lock().expect("responses lock poisoned").push((
            prefix.to_string(),
            CommandOutput {
                code: Some(code),
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        ));
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::display).collect()
    }

    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(spec.clone());
        let line = spec.display();
        let canned = self
            .responses
            .lock()
            .expect("responses lock poisoned")
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, out)| out.clone());
        Ok(canned.unwrap_or(CommandOutput {
            code: Some(0),
            ..CommandOutput::default()
        }))
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.programs
            .iter()
            .any(|p| p == program)
            .then(|| Path::new("/usr/bin").join(program))
    }
}

pub fn toolkit(home: &Path, settings: Settings, runner: Arc<RecordingRunner>) -> Toolkit {
    Toolkit::new(
        ToolkitPaths::from_home(home),
        settings,
        runner,
        Reporter::capturing(),
    )
}

/// A port nothing is listening on right now.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind(("127.0.0.1", 0))
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .expect("free port")
}
