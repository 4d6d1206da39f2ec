//! Day-2 operations: backup, restore, watchdog, status and config rotation.

pub mod backup;
pub mod restore;
pub mod rotate;
pub mod status;
pub mod watchdog;

pub use backup::{run_backup, BackupReport};
pub use restore::{run_restore, RestoreSource};
pub use rotate::{rotate_config, RotateOutcome};
pub use status::{collect_status, render_status, StatusReport};
pub use watchdog::{run_watchdog, RestartDecision, RestartLimiter, WatchdogOutcome};
