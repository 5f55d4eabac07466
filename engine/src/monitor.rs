//! Monitor process controller.
//!
//! The daemon never supervises a workload in-process: it spawns the
//! `wharf-monitor` binary, passing only identifiers on argv. The monitor
//! rebuilds everything else from the container root directory, which keeps
//! a daemon crash from taking the workload down with it.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use wharf_core::config::DaemonPaths;
use wharf_core::error::{Result, WharfError};

/// Name of the monitor binary.
pub const MONITOR_BIN: &str = "wharf-monitor";

/// Spawns monitor subprocesses for containers.
#[derive(Debug)]
pub struct MonitorController {
    monitor_path: PathBuf,
    paths: DaemonPaths,
}

impl MonitorController {
    /// Create a controller for a known monitor binary path.
    pub fn new(monitor_path: PathBuf, paths: DaemonPaths) -> Result<Self> {
        if !monitor_path.exists() {
            return Err(WharfError::Supervisor(format!(
                "monitor binary not found: {}",
                monitor_path.display()
            )));
        }
        Ok(Self {
            monitor_path,
            paths,
        })
    }

    /// Find the monitor binary in common locations.
    ///
    /// Searches in order: the directory of the current executable, the
    /// target directories (for development), then PATH.
    pub fn find_monitor() -> Result<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let candidate = exe_dir.join(MONITOR_BIN);
                if candidate.exists() {
                    return Ok(candidate);
                }
            }
        }

        for dir in ["target/debug", "target/release"] {
            let candidate = PathBuf::from(dir).join(MONITOR_BIN);
            if candidate.exists() {
                return Ok(candidate);
            }
        }

        if let Ok(output) = Command::new("which").arg(MONITOR_BIN).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }

        Err(WharfError::Supervisor(format!(
            "could not find {MONITOR_BIN} binary"
        )))
    }

    /// Spawn a monitor for one container and return its pid.
    ///
    /// The child runs independently of the caller; the pid file it writes
    /// under the container root is the durable handle to it.
    pub fn spawn(&self, container_id: &str) -> Result<u32> {
        tracing::info!(
            monitor = %self.monitor_path.display(),
            container_id,
            "spawning monitor subprocess"
        );

        let child = Command::new(&self.monitor_path)
            .arg(container_id)
            .arg(&self.paths.root)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| WharfError::Supervisor(format!("failed to spawn monitor: {e}")))?;

        let pid = child.id();
        tracing::info!(container_id, pid, "monitor subprocess spawned");
        Ok(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_existing_binary() {
        let err = MonitorController::new(
            PathBuf::from("/nonexistent/wharf-monitor"),
            DaemonPaths::default(),
        )
        .unwrap_err();
        assert!(matches!(err, WharfError::Supervisor(_)));
    }

    #[test]
    fn test_spawn_runs_the_configured_binary() {
        // Any executable taking two ignored arguments will do here.
        let controller = MonitorController::new(
            PathBuf::from("/bin/true"),
            DaemonPaths::new("/tmp/wharf-test-root"),
        )
        .unwrap();
        let pid = controller.spawn("abc123").unwrap();
        assert!(pid > 0);
    }
}
