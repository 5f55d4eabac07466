//! Supervisor status types and their durable on-disk form.
//!
//! The monitor process writes these files under the container root before
//! attempting any network delivery, so the daemon can always recover the
//! outcome of a run from disk alone. The load accessors are the daemon-side
//! reconciliation path used after a restart.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Pid file written by the monitor immediately after startup (decimal text).
pub const MONITOR_PID_FILE: &str = "monitor.pid";

/// Serialized [`StartStatus`], written once the workload has started.
pub const START_STATUS_FILE: &str = "start_status";

/// Serialized [`StopStatus`], written once the workload has terminated.
pub const STOP_STATUS_FILE: &str = "stop_status";

/// Terminal outcome of a container's main process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitStatus {
    /// Process exit code. -1 when the process was killed by a signal.
    pub code: i32,
    /// Terminating signal, if any.
    #[serde(default)]
    pub signal: Option<i32>,
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            Self {
                code: status.code().unwrap_or(-1),
                signal: status.signal(),
            }
        }
        #[cfg(not(unix))]
        {
            Self {
                code: status.code().unwrap_or(-1),
                signal: None,
            }
        }
    }
}

/// Report of a successful (or failed) workload launch, produced exactly once
/// per supervisor run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartStatus {
    /// OS pid of the container's main process.
    pub pid: i32,
    /// Launch error detail, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

/// Report of workload termination, produced exactly once per supervisor run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopStatus {
    /// How the process exited.
    pub exit: ExitStatus,
    /// Run error detail when the process never properly ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

/// Persist `data` as `<container_root>/<file>`.
///
/// Writes a temp file and renames it into place so a concurrent
/// reconciliation reader never observes a partially written status.
pub fn dump_to_disk(container_root: &Path, file: &str, data: &[u8]) -> Result<()> {
    std::fs::create_dir_all(container_root)?;
    let tmp = container_root.join(format!(".{file}.tmp"));
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, container_root.join(file))?;
    Ok(())
}

/// Write the monitor's own pid file under the container root.
pub fn write_pid_file(container_root: &Path, pid: u32) -> Result<()> {
    dump_to_disk(container_root, MONITOR_PID_FILE, pid.to_string().as_bytes())
}

/// Read back a previously written monitor pid, if present.
pub fn load_monitor_pid(container_root: &Path) -> Result<Option<u32>> {
    let path = container_root.join(MONITOR_PID_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)?;
    let pid = text.trim().parse::<u32>().map_err(|e| {
        crate::error::WharfError::Serialization(format!("invalid pid file {}: {e}", path.display()))
    })?;
    Ok(Some(pid))
}

/// Recover the start status for a container root.
///
/// Absence of the file is not an error: the supervisor may have died before
/// the workload started, or never have been launched at all.
pub fn load_start_status(container_root: &Path) -> Result<Option<StartStatus>> {
    load_status(container_root, START_STATUS_FILE)
}

/// Recover the stop status for a container root. An absent file yields
/// `Ok(None)`.
pub fn load_stop_status(container_root: &Path) -> Result<Option<StopStatus>> {
    load_status(container_root, STOP_STATUS_FILE)
}

fn load_status<T: DeserializeOwned>(container_root: &Path, file: &str) -> Result<Option<T>> {
    let path = container_root.join(file);
    if !path.exists() {
        return Ok(None);
    }
    let data = std::fs::read(&path)?;
    Ok(Some(serde_json::from_slice(&data)?))
}
