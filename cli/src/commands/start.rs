//! `wharf start` command — launch the monitor supervisor for a container.

use std::path::Path;

use clap::Args;
use wharf_core::config::DaemonPaths;
use wharf_core::container::CONFIG_FILE;
use wharf_engine::MonitorController;

#[derive(Args)]
pub struct StartArgs {
    /// Container id to start
    pub container_id: String,
}

pub fn execute(root: &Path, args: StartArgs) -> Result<(), Box<dyn std::error::Error>> {
    let container_root = root.join(&args.container_id);
    if !container_root.join(CONFIG_FILE).exists() {
        return Err(format!("No such container: {}", args.container_id).into());
    }

    let monitor_path = MonitorController::find_monitor()?;
    let controller = MonitorController::new(monitor_path, DaemonPaths::new(root))?;
    let pid = controller.spawn(&args.container_id)?;

    println!("{} (monitor pid {pid})", args.container_id);
    Ok(())
}
