//! Execution driver seam.
//!
//! The driver owns the mechanics of actually running a container's main
//! process; the monitor only sees the start callback and the terminal exit
//! status.

use std::process::{Command, Stdio};

use wharf_core::container::ContainerCommand;
use wharf_core::error::{Result, WharfError};
use wharf_core::status::ExitStatus;

/// Runs one container workload to completion.
pub trait ExecDriver: Send + Sync {
    /// Run the command and block until it terminates.
    ///
    /// `on_start` is invoked synchronously, exactly once, after the
    /// underlying process has actually started.
    fn run(&self, command: &ContainerCommand, on_start: &mut dyn FnMut(i32)) -> Result<ExitStatus>;
}

/// Driver executing the saved command as a plain host process.
pub struct HostDriver;

impl ExecDriver for HostDriver {
    fn run(&self, command: &ContainerCommand, on_start: &mut dyn FnMut(i32)) -> Result<ExitStatus> {
        let mut cmd = Command::new(&command.path);
        cmd.args(&command.args).stdin(Stdio::null());

        cmd.env_clear();
        for pair in &command.env {
            if let Some((key, value)) = pair.split_once('=') {
                cmd.env(key, value);
            }
        }
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| WharfError::Driver(format!("spawn {}: {e}", command.path)))?;

        on_start(child.id() as i32);

        let status = child
            .wait()
            .map_err(|e| WharfError::Driver(format!("wait for {}: {e}", command.path)))?;
        Ok(ExitStatus::from(status))
    }
}
