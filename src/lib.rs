//! clawkit: provisioning and day-2 operations for an OpenClaw gateway host.
//!
//! Renders the gateway configuration from `.env` and templates, installs the
//! systemd user unit and cron jobs, keeps the gateway alive with a
//! rate-limited watchdog, backs up and restores its state, and wires up the
//! Gmail, Calendar and Drive integrations through one OAuth2 client.
//!
//! # Quick Start
//!
//! ```no_run
//! use clawkit::config::{Settings, ToolkitPaths};
//! use clawkit::context::Toolkit;
//! use clawkit::ops::watchdog::{report_outcome, run_watchdog};
//!
//! # async fn example() -> clawkit::error::Result<()> {
//! let settings = Settings::load_optional(".env".as_ref())?;
//! let tk = Toolkit::system(ToolkitPaths::discover(), settings);
//! let outcome = run_watchdog(&tk, chrono::Utc::now().timestamp()).await?;
//! report_outcome(&tk, outcome)?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod google;
pub mod ops;
pub mod provision;
pub mod report;
pub mod system;
pub mod template;
pub mod util;

#[cfg(feature = "lifeos")]
pub mod lifeos;

#[cfg(feature = "cli")]
pub mod cli;
