//! Controller configuration
//!
//! Every setting is a command-line flag with an environment-variable
//! fallback, so the same binary runs unchanged from a Deployment manifest.

use std::time::Duration;

use clap::Args;

use crate::controller::SyncStrategy;

/// Default server-side apply field manager
pub const DEFAULT_FIELD_MANAGER: &str = "braid-controller";

/// Watcher timeout (seconds) - must be less than the client read timeout (30s)
pub const DEFAULT_WATCH_TIMEOUT_SECS: u32 = 25;

/// Settings for the Application and ApplicationTemplate controllers
#[derive(Args, Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    /// Only watch resources in this namespace (default: all namespaces)
    #[arg(long, env = "BRAID_NAMESPACE")]
    pub namespace: Option<String>,

    /// Field manager name used for server-side apply
    #[arg(long, env = "BRAID_FIELD_MANAGER", default_value = DEFAULT_FIELD_MANAGER)]
    pub field_manager: String,

    /// How existing target objects are updated
    #[arg(long, env = "BRAID_SYNC_STRATEGY", value_enum, default_value_t = SyncStrategy::Replace)]
    pub strategy: SyncStrategy,

    /// Seconds between periodic re-syncs of a converged Application
    #[arg(long, env = "BRAID_RESYNC_INTERVAL_SECS", default_value_t = 300)]
    pub resync_interval_secs: u64,

    /// Seconds to wait before retrying a failed reconciliation
    #[arg(long, env = "BRAID_ERROR_REQUEUE_SECS", default_value_t = 30)]
    pub error_requeue_secs: u64,

    /// Server-side watch timeout in seconds
    #[arg(long, default_value_t = DEFAULT_WATCH_TIMEOUT_SECS)]
    pub watch_timeout_secs: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            strategy: SyncStrategy::Replace,
            resync_interval_secs: 300,
            error_requeue_secs: 30,
            watch_timeout_secs: DEFAULT_WATCH_TIMEOUT_SECS,
        }
    }
}

impl ControllerConfig {
    /// Interval between periodic re-syncs
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    /// Delay before a failed reconciliation is retried
    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }
}
