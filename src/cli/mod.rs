//! Command-line interface for clawkit.

pub mod auth;
pub mod google;
pub mod lifeos;
pub mod ops;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{Settings, ToolkitPaths};
use crate::context::Toolkit;
use crate::error::Result;

/// Provision and operate an OpenClaw gateway host.
#[derive(Parser, Debug)]
#[command(name = "clawkit", version, about = "OpenClaw host provisioning and operations")]
pub struct Cli {
    /// Path to the `.env` configuration file
    #[arg(long, global = true, default_value = ".env", env = "CLAWKIT_ENV_FILE")]
    pub env_file: PathBuf,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render config, install the gateway unit and cron jobs
    Setup(SetupArgs),
    /// Remove everything setup installed
    Reset(ResetArgs),
    /// Install system packages, Node.js and openclaw (as root)
    Prereqs(PrereqsArgs),
    /// Archive the state directory and prune old archives
    Backup,
    /// Restore the state directory from an archive
    Restore(RestoreArgs),
    /// Health-check the gateway and restart it within the rate limit
    Watchdog,
    /// Show gateway, backup, cron and token state
    Status,
    /// Snapshot openclaw.json when it changed
    RotateConfig,
    /// Google account authorization
    Auth(AuthArgs),
    /// Gmail, Calendar and Drive commands (JSON output)
    Google(google::GoogleArgs),
    /// Journaling helpers writing into the agent's memory
    Lifeos(lifeos::LifeOsArgs),
}

/// Arguments for `clawkit setup`.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Report every action without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Directory with template overrides
    #[arg(long)]
    pub templates_dir: Option<PathBuf>,
}

/// Arguments for `clawkit reset`.
#[derive(Args, Debug)]
pub struct ResetArgs {
    #[arg(long)]
    pub dry_run: bool,

    /// Leave the backup directory in place
    #[arg(long)]
    pub keep_backups: bool,

    /// Leave the `.env` file in place
    #[arg(long)]
    pub keep_env: bool,
}

/// Arguments for `clawkit prereqs`.
#[derive(Args, Debug)]
pub struct PrereqsArgs {
    /// Unprivileged account the gateway runs as
    #[arg(long)]
    pub bot_user: String,

    /// Skip apt, Node.js and npm installs
    #[arg(long)]
    pub skip_system: bool,
}

/// Arguments for `clawkit restore`.
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Archive to restore
    #[arg(required_unless_present = "latest", conflicts_with = "latest")]
    pub archive: Option<PathBuf>,

    /// Restore the newest archive in the backup directory
    #[arg(long)]
    pub latest: bool,
}

/// Arguments for the `auth` subcommand group.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommands,
}

/// Auth subcommands for login, status, and logout.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Run the browser consent flow for a service
    Login(ServiceArg),
    /// Show token state for every service
    Status,
    /// Delete a service's stored token
    Logout(ServiceArg),
}

#[derive(Args, Debug)]
pub struct ServiceArg {
    /// Service (gmail, calendar, drive)
    pub service: String,
}

impl Cli {
    /// Paths, settings and a system-backed toolkit for this invocation.
    pub fn toolkit(&self) -> Result<Toolkit> {
        let settings = Settings::load_optional(&self.env_file)?;
        Ok(Toolkit::system(ToolkitPaths::discover(), settings))
    }
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let tk = cli.toolkit()?;
    match cli.command {
        Commands::Setup(args) => ops::handle_setup(&tk, &cli.env_file, args).await,
        Commands::Reset(args) => ops::handle_reset(&tk, &cli.env_file, args).await,
        Commands::Prereqs(args) => ops::handle_prereqs(&tk, args).await,
        Commands::Backup => ops::handle_backup(&tk).await,
        Commands::Restore(args) => ops::handle_restore(&tk, args).await,
        Commands::Watchdog => ops::handle_watchdog(&tk).await,
        Commands::Status => ops::handle_status(&tk).await,
        Commands::RotateConfig => ops::handle_rotate(&tk),
        Commands::Auth(args) => match args.command {
            AuthCommands::Login(arg) => auth::handle_login(&tk, &arg.service).await,
            AuthCommands::Status => auth::handle_status(&tk),
            AuthCommands::Logout(arg) => auth::handle_logout(&tk, &arg.service),
        },
        Commands::Google(args) => google::handle(&tk, args).await,
        Commands::Lifeos(args) => lifeos::handle(&tk, args),
    }
}
