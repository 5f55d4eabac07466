//! Image graph collaborator interface and its disk-backed implementation.
//!
//! The graph stores the nodes; the deletion engine and garbage collector
//! only ever go through the [`ImageGraph`] trait. `DiskImageGraph` keeps an
//! in-memory index backed by a persistent `images.json` file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use wharf_core::error::{Result, WharfError};

use super::image::Image;

const IMAGES_INDEX_FILE: &str = "images.json";

/// Optional storage-pressure capability.
///
/// Implemented only by storage drivers that can report how full their
/// backing space is; the garbage collector queries it through
/// [`ImageGraph::usage_reporter`] instead of poking at a concrete driver
/// type.
pub trait UsageReporter: Send + Sync {
    /// Fraction of backing storage in use, in percent (0.0–100.0).
    fn data_use_percent(&self) -> f64;
}

/// Content-addressable image graph.
pub trait ImageGraph: Send + Sync {
    /// Resolve an image by exact id or unambiguous id prefix.
    fn lookup(&self, id_or_prefix: &str) -> Option<Image>;

    /// Parent id → child ids, for every image that has children.
    fn by_parent(&self) -> HashMap<String, Vec<String>>;

    /// Remove an image node from the graph.
    fn delete(&self, id: &str) -> Result<()>;

    /// All images in the graph.
    fn images(&self) -> Vec<Image>;

    /// Storage-pressure capability, when the backing driver supports it.
    fn usage_reporter(&self) -> Option<&dyn UsageReporter> {
        None
    }
}

/// Disk-backed image graph with an in-memory index.
pub struct DiskImageGraph {
    dir: PathBuf,
    index: RwLock<HashMap<String, Image>>,
    usage: Option<Arc<dyn UsageReporter>>,
}

impl DiskImageGraph {
    /// Open (or create) a graph rooted at `dir`, loading any existing
    /// index from disk.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| WharfError::Storage(format!("create {}: {e}", dir.display())))?;

        let mut index = HashMap::new();
        let index_path = dir.join(IMAGES_INDEX_FILE);
        if index_path.exists() {
            let data = std::fs::read_to_string(&index_path)
                .map_err(|e| WharfError::Storage(format!("read {}: {e}", index_path.display())))?;
            let images: Vec<Image> = serde_json::from_str(&data)
                .map_err(|e| WharfError::Storage(format!("parse {}: {e}", index_path.display())))?;
            for image in images {
                index.insert(image.id.clone(), image);
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            index: RwLock::new(index),
            usage: None,
        })
    }

    /// Attach a storage-pressure reporter.
    pub fn with_usage_reporter(mut self, reporter: Arc<dyn UsageReporter>) -> Self {
        self.usage = Some(reporter);
        self
    }

    /// Register an image node.
    pub fn insert(&self, image: Image) -> Result<()> {
        let mut index = self.index.write();
        index.insert(image.id.clone(), image);
        self.save(&index)
    }

    fn save(&self, index: &HashMap<String, Image>) -> Result<()> {
        let mut images: Vec<&Image> = index.values().collect();
        images.sort_by(|a, b| a.id.cmp(&b.id));
        let data = serde_json::to_vec_pretty(&images)?;
        let path = self.dir.join(IMAGES_INDEX_FILE);
        std::fs::write(&path, data)
            .map_err(|e| WharfError::Storage(format!("write {}: {e}", path.display())))?;
        Ok(())
    }
}

impl ImageGraph for DiskImageGraph {
    fn lookup(&self, id_or_prefix: &str) -> Option<Image> {
        let index = self.index.read();
        if let Some(image) = index.get(id_or_prefix) {
            return Some(image.clone());
        }
        // Prefix resolution; ambiguous prefixes resolve to nothing.
        let mut matches = index.values().filter(|img| img.id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(image), None) => Some(image.clone()),
            _ => None,
        }
    }

    fn by_parent(&self) -> HashMap<String, Vec<String>> {
        let index = self.index.read();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for image in index.values() {
            if let Some(parent) = &image.parent {
                children.entry(parent.clone()).or_default().push(image.id.clone());
            }
        }
        children
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut index = self.index.write();
        if index.remove(id).is_none() {
            return Err(WharfError::Storage(format!("image {id} not registered")));
        }
        self.save(&index)
    }

    fn images(&self) -> Vec<Image> {
        self.index.read().values().cloned().collect()
    }

    fn usage_reporter(&self) -> Option<&dyn UsageReporter> {
        self.usage.as_deref()
    }
}
