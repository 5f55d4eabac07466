//! `wharf status` command — recover supervisor status reports from disk.
//!
//! This is the reconciliation path a daemon uses after a restart: whatever
//! the live push missed is still readable from the container root.

use std::path::Path;

use clap::Args;
use wharf_core::status::{load_monitor_pid, load_start_status, load_stop_status};

#[derive(Args)]
pub struct StatusArgs {
    /// Container id to inspect
    pub container_id: String,
}

pub fn execute(root: &Path, args: StatusArgs) -> Result<(), Box<dyn std::error::Error>> {
    let container_root = root.join(&args.container_id);

    match load_monitor_pid(&container_root)? {
        Some(pid) => println!("monitor: pid {pid}"),
        None => println!("monitor: not recorded"),
    }

    match load_start_status(&container_root)? {
        Some(status) => {
            let err = status
                .err
                .map(|e| format!(" (error: {e})"))
                .unwrap_or_default();
            println!("start: pid {}{err}", status.pid);
        }
        None => println!("start: not recorded"),
    }

    match load_stop_status(&container_root)? {
        Some(status) => {
            let signal = status
                .exit
                .signal
                .map(|s| format!(", signal {s}"))
                .unwrap_or_default();
            let err = status
                .err
                .map(|e| format!(" (error: {e})"))
                .unwrap_or_default();
            println!("stop: exit code {}{signal}{err}", status.exit.code);
        }
        None => println!("stop: not recorded"),
    }

    Ok(())
}
