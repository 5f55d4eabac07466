//! Wharf Monitor - out-of-process container supervisor.
//!
//! The daemon spawns this binary once per container, passing only
//! identifiers: no in-memory state crosses the process boundary. Everything
//! needed to supervise the workload is reloaded from the container root,
//! which keeps daemon crashes and supervisor crashes isolated from each
//! other.
//!
//! # Usage
//! ```bash
//! wharf-monitor <CONTAINER_ID> <ROOT>
//! ```

mod notify;
mod supervisor;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use wharf_core::container::Container;
use wharf_core::error::{Result, WharfError};
use wharf_core::status::write_pid_file;
use wharf_engine::driver::HostDriver;

use crate::supervisor::Supervisor;

/// Wharf Monitor — supervises exactly one container
#[derive(Parser, Debug)]
#[command(name = "wharf-monitor")]
#[command(about = "Container monitor process for wharf")]
struct Args {
    /// Container id to supervise
    container_id: String,

    /// Daemon state root directory
    root: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!(error = %e, "Monitor failed");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let container_root = args.root.join(&args.container_id);

    // Pid file first: the daemon's only handle to this process.
    write_pid_file(&container_root, std::process::id())?;

    // Any load failure is fatal and not retried; recovery is the daemon
    // relaunching the monitor.
    let container = Container::from_disk(&args.container_id, &container_root)
        .map_err(|e| WharfError::Supervisor(format!("load container: {e}")))?;

    Supervisor::new(container).supervise(&HostDriver)
}
