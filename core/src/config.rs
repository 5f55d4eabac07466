use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default daemon state root.
pub const DEFAULT_ROOT: &str = "/var/run/wharf";

/// Daemon filesystem layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonPaths {
    /// State root; each container owns `<root>/<container-id>/`.
    pub root: PathBuf,
}

impl Default for DaemonPaths {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
        }
    }
}

impl DaemonPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory for one container's durable state.
    pub fn container_root(&self, container_id: &str) -> PathBuf {
        self.root.join(container_id)
    }
}

/// Garbage collector tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcConfig {
    /// Sleep between collection cycles.
    pub clean_interval: Duration,
    /// Fractional usage (percent) below which a cycle is skipped entirely.
    pub retain_percent: f64,
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            clean_interval: Duration::from_secs(24 * 60 * 60),
            retain_percent: 80.0,
        }
    }
}
