//! On-disk container model.
//!
//! The monitor process has no in-memory state from the daemon: everything it
//! needs to supervise a container is reloaded from the container root
//! directory. The daemon writes `config.json`, `hostconfig.json` and
//! `command.json` when the container is created; the monitor writes
//! `state.json` snapshots as the workload starts and stops.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WharfError};
use crate::status::{dump_to_disk, ExitStatus};

/// Container configuration file name.
pub const CONFIG_FILE: &str = "config.json";
/// Host configuration file name.
pub const HOST_CONFIG_FILE: &str = "hostconfig.json";
/// Saved command file name.
pub const COMMAND_FILE: &str = "command.json";
/// Runtime state snapshot file name.
pub const STATE_FILE: &str = "state.json";

const DEFAULT_PATH_ENV: &str =
    "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Truncate an id to the 12-character short form used in log and error
/// messages.
pub fn short_id(id: &str) -> String {
    id.chars().take(12).collect()
}

/// Static container configuration, written by the daemon at create time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Image id this container was created from. A non-owning reference
    /// into the image graph.
    pub image: String,
    /// Extra environment (KEY=VALUE pairs).
    #[serde(default)]
    pub env: Vec<String>,
    /// Working directory override for the main process.
    #[serde(default)]
    pub working_dir: Option<String>,
}

/// Restart policy carried in the host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestartPolicy {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub maximum_retry_count: u32,
}

/// Host-side configuration, written by the daemon at create time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub restart_policy: RestartPolicy,
}

/// The saved main-process command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerCommand {
    /// Executable path.
    pub path: String,
    /// Arguments, not including the executable.
    #[serde(default)]
    pub args: Vec<String>,
    /// Process environment (KEY=VALUE pairs). Rebuilt by the monitor from
    /// the daemon environment before the run.
    #[serde(default)]
    pub env: Vec<String>,
    /// Working directory.
    #[serde(default)]
    pub cwd: Option<String>,
}

/// Mutable runtime state, snapshotted to `state.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub pid: Option<i32>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub exit_status: Option<ExitStatus>,
}

impl State {
    /// Load a state snapshot from a container root. Missing or garbled
    /// snapshots fall back to the default (stopped) state.
    pub fn load(container_root: &Path) -> State {
        let path = container_root.join(STATE_FILE);
        match std::fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "garbled state snapshot, assuming stopped");
                    State::default()
                }
            },
            Err(_) => State::default(),
        }
    }

    pub fn set_running(&mut self, pid: i32) {
        self.running = true;
        self.pid = Some(pid);
        self.started_at = Some(Utc::now());
        self.finished_at = None;
        self.exit_status = None;
    }

    pub fn set_stopped(&mut self, exit: ExitStatus) {
        self.running = false;
        self.pid = None;
        self.finished_at = Some(Utc::now());
        self.exit_status = Some(exit);
    }
}

/// A container as the monitor sees it: identity plus everything reloaded
/// from the container root directory.
#[derive(Debug, Clone)]
pub struct Container {
    pub id: String,
    pub root: PathBuf,
    pub config: ContainerConfig,
    pub host_config: HostConfig,
    pub command: ContainerCommand,
    pub state: State,
}

impl Container {
    /// Reload a container from its root directory.
    ///
    /// The three daemon-written files are all required; any load failure is
    /// reported to the caller and treated as fatal by the monitor. The
    /// state snapshot is optional.
    pub fn from_disk(id: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let id = id.into();
        let root = root.into();
        let config: ContainerConfig = read_json(&root.join(CONFIG_FILE))?;
        let host_config: HostConfig = read_json(&root.join(HOST_CONFIG_FILE))?;
        let command: ContainerCommand = read_json(&root.join(COMMAND_FILE))?;
        let state = State::load(&root);
        Ok(Self {
            id,
            root,
            config,
            host_config,
            command,
            state,
        })
    }

    /// Snapshot the runtime state to `state.json` (atomic write).
    pub fn to_disk(&self) -> Result<()> {
        let data = serde_json::to_vec_pretty(&self.state)?;
        dump_to_disk(&self.root, STATE_FILE, &data)
    }

    /// Build the process environment the way the daemon does: default PATH
    /// and HOSTNAME, then the configured extras.
    pub fn daemon_environment(&self) -> Vec<String> {
        let mut env = vec![
            DEFAULT_PATH_ENV.to_string(),
            format!("HOSTNAME={}", short_id(&self.id)),
        ];
        env.extend(self.config.env.iter().cloned());
        env
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| WharfError::Storage(format!("read {}: {e}", path.display())))?;
    serde_json::from_str(&data)
        .map_err(|e| WharfError::Storage(format!("parse {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_container_files(root: &Path) {
        std::fs::create_dir_all(root).unwrap();
        std::fs::write(
            root.join(CONFIG_FILE),
            r#"{"image":"img-1","env":["FOO=bar"]}"#,
        )
        .unwrap();
        std::fs::write(
            root.join(HOST_CONFIG_FILE),
            r#"{"restart_policy":{"name":"always"}}"#,
        )
        .unwrap();
        std::fs::write(
            root.join(COMMAND_FILE),
            r#"{"path":"/bin/sleep","args":["60"]}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_from_disk_loads_all_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cid-1");
        write_container_files(&root);

        let container = Container::from_disk("cid-1", &root).unwrap();
        assert_eq!(container.config.image, "img-1");
        assert_eq!(container.host_config.restart_policy.name, "always");
        assert_eq!(container.command.path, "/bin/sleep");
        assert!(!container.state.running);
    }

    #[test]
    fn test_from_disk_missing_config_fails() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cid-2");
        std::fs::create_dir_all(&root).unwrap();

        let err = Container::from_disk("cid-2", &root).unwrap_err();
        assert!(matches!(err, WharfError::Storage(_)));
    }

    #[test]
    fn test_from_disk_garbled_command_fails() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cid-3");
        write_container_files(&root);
        std::fs::write(root.join(COMMAND_FILE), b"not json").unwrap();

        assert!(Container::from_disk("cid-3", &root).is_err());
    }

    #[test]
    fn test_state_snapshot_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cid-4");
        write_container_files(&root);

        let mut container = Container::from_disk("cid-4", &root).unwrap();
        container.state.set_running(123);
        container.to_disk().unwrap();

        let state = State::load(&root);
        assert!(state.running);
        assert_eq!(state.pid, Some(123));
        assert!(state.started_at.is_some());
    }

    #[test]
    fn test_state_load_missing_defaults_to_stopped() {
        let tmp = TempDir::new().unwrap();
        let state = State::load(tmp.path());
        assert!(!state.running);
        assert!(state.pid.is_none());
    }

    #[test]
    fn test_set_stopped_clears_running() {
        let mut state = State::default();
        state.set_running(99);
        state.set_stopped(ExitStatus {
            code: 137,
            signal: Some(9),
        });
        assert!(!state.running);
        assert!(state.pid.is_none());
        assert_eq!(state.exit_status.unwrap().code, 137);
    }

    #[test]
    fn test_daemon_environment() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("0123456789abcdef");
        write_container_files(&root);

        let container = Container::from_disk("0123456789abcdef", &root).unwrap();
        let env = container.daemon_environment();
        assert!(env[0].starts_with("PATH="));
        assert_eq!(env[1], "HOSTNAME=0123456789ab");
        assert!(env.contains(&"FOO=bar".to_string()));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }
}
