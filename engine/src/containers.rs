//! Live-container collaborator interface.
//!
//! The deletion engine consults the daemon's container list before removing
//! an image node. `DiskContainers` reconstructs that list from the state
//! root, the same directory layout the monitor processes write into.

use wharf_core::config::DaemonPaths;
use wharf_core::container::{ContainerConfig, State, CONFIG_FILE};

/// What the deletion engine needs to know about one container.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: String,
    /// Non-owning reference into the image graph.
    pub image_id: String,
    pub running: bool,
}

/// Enumerates the containers known to the daemon.
pub trait ContainerProvider: Send + Sync {
    fn containers(&self) -> Vec<ContainerSummary>;
}

/// Container list reconstructed by scanning the daemon state root.
pub struct DiskContainers {
    paths: DaemonPaths,
}

impl DiskContainers {
    pub fn new(paths: DaemonPaths) -> Self {
        Self { paths }
    }
}

impl ContainerProvider for DiskContainers {
    fn containers(&self) -> Vec<ContainerSummary> {
        let Ok(entries) = std::fs::read_dir(&self.paths.root) else {
            return Vec::new();
        };

        entries
            .flatten()
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let root = entry.path();
                let data = std::fs::read_to_string(root.join(CONFIG_FILE)).ok()?;
                let config: ContainerConfig = serde_json::from_str(&data).ok()?;
                let state = State::load(&root);
                Some(ContainerSummary {
                    id: entry.file_name().to_string_lossy().into_owned(),
                    image_id: config.image,
                    running: state.running,
                })
            })
            .collect()
    }
}
