//! Repository index collaborator interface and its disk-backed
//! implementation.
//!
//! The index owns the `(repo, tag) → image id` bindings and only holds image
//! ids by reference; a binding may dangle transiently while a deletion is in
//! flight.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use wharf_core::error::{Result, WharfError};

use super::reference::image_reference;

const REPOSITORIES_INDEX_FILE: &str = "repositories.json";

/// One `(repo, tag) → image id` binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagBinding {
    pub repo: String,
    pub tag: String,
    pub image_id: String,
}

impl TagBinding {
    /// Display reference for this binding.
    pub fn reference(&self) -> String {
        image_reference(&self.repo, &self.tag)
    }
}

/// Repository index: the mutable name layer over the image graph.
pub trait TagStore: Send + Sync {
    /// Image id bound to `(repo, tag)`, if any.
    fn get(&self, repo: &str, tag: &str) -> Option<String>;

    /// Whether the repository has any binding at all.
    fn repository_exists(&self, repo: &str) -> bool;

    /// Create or move a binding.
    fn set(&self, repo: &str, tag: &str, image_id: &str) -> Result<()>;

    /// Remove one binding. Returns whether a binding was actually removed.
    fn delete(&self, repo: &str, tag: &str) -> Result<bool>;

    /// Remove every binding pointing at `image_id`.
    fn delete_all(&self, image_id: &str) -> Result<()>;

    /// All bindings pointing at `image_id`, ordered by (repo, tag).
    fn by_id(&self, image_id: &str) -> Vec<TagBinding>;
}

/// Disk-backed repository index with an in-memory map.
pub struct DiskTagStore {
    dir: PathBuf,
    // repo → tag → image id
    index: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl DiskTagStore {
    /// Open (or create) an index rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| WharfError::Storage(format!("create {}: {e}", dir.display())))?;

        let index_path = dir.join(REPOSITORIES_INDEX_FILE);
        let index = if index_path.exists() {
            let data = std::fs::read_to_string(&index_path)
                .map_err(|e| WharfError::Storage(format!("read {}: {e}", index_path.display())))?;
            serde_json::from_str(&data)
                .map_err(|e| WharfError::Storage(format!("parse {}: {e}", index_path.display())))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            index: RwLock::new(index),
        })
    }

    fn save(&self, index: &HashMap<String, HashMap<String, String>>) -> Result<()> {
        let data = serde_json::to_vec_pretty(index)?;
        let path = self.dir.join(REPOSITORIES_INDEX_FILE);
        std::fs::write(&path, data)
            .map_err(|e| WharfError::Storage(format!("write {}: {e}", path.display())))?;
        Ok(())
    }
}

impl TagStore for DiskTagStore {
    fn get(&self, repo: &str, tag: &str) -> Option<String> {
        self.index.read().get(repo).and_then(|tags| tags.get(tag)).cloned()
    }

    fn repository_exists(&self, repo: &str) -> bool {
        self.index.read().contains_key(repo)
    }

    fn set(&self, repo: &str, tag: &str, image_id: &str) -> Result<()> {
        let mut index = self.index.write();
        index
            .entry(repo.to_string())
            .or_default()
            .insert(tag.to_string(), image_id.to_string());
        self.save(&index)
    }

    fn delete(&self, repo: &str, tag: &str) -> Result<bool> {
        let mut index = self.index.write();
        let removed = match index.get_mut(repo) {
            Some(tags) => {
                let removed = tags.remove(tag).is_some();
                if tags.is_empty() {
                    index.remove(repo);
                }
                removed
            }
            None => false,
        };
        if removed {
            self.save(&index)?;
        }
        Ok(removed)
    }

    fn delete_all(&self, image_id: &str) -> Result<()> {
        let mut index = self.index.write();
        let mut changed = false;
        index.retain(|_, tags| {
            let before = tags.len();
            tags.retain(|_, id| id != image_id);
            changed |= tags.len() != before;
            !tags.is_empty()
        });
        if changed {
            self.save(&index)?;
        }
        Ok(())
    }

    fn by_id(&self, image_id: &str) -> Vec<TagBinding> {
        let index = self.index.read();
        let mut bindings: Vec<TagBinding> = index
            .iter()
            .flat_map(|(repo, tags)| {
                tags.iter()
                    .filter(|(_, id)| id.as_str() == image_id)
                    .map(|(tag, id)| TagBinding {
                        repo: repo.clone(),
                        tag: tag.clone(),
                        image_id: id.clone(),
                    })
            })
            .collect();
        bindings.sort_by(|a, b| (&a.repo, &a.tag).cmp(&(&b.repo, &b.tag)));
        bindings
    }
}
