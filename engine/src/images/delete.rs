//! Image deletion engine.
//!
//! Untag plus conditional cascading delete. The engine is a synchronous
//! call chain with no internal locking: concurrent deletions targeting
//! overlapping ids are only as safe as the graph and index collaborators
//! make them.

use std::collections::HashSet;
use std::sync::Arc;

use wharf_core::container::short_id;
use wharf_core::error::{Result, WharfError};
use wharf_core::event::{events, AuditEvent, EventEmitter};

use super::graph::ImageGraph;
use super::image::Image;
use super::reference::{image_reference, parse_repository_tag, DEFAULT_TAG};
use super::tags::{TagBinding, TagStore};
use crate::containers::ContainerProvider;

/// One observable effect of a delete request, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteEffect {
    /// A `(repo, tag)` binding was removed.
    Untagged { reference: String },
    /// An image node was removed from the graph.
    Deleted { id: String },
}

/// The deletion engine.
pub struct ImageDeleter {
    graph: Arc<dyn ImageGraph>,
    tags: Arc<dyn TagStore>,
    containers: Arc<dyn ContainerProvider>,
    events: EventEmitter,
}

impl ImageDeleter {
    pub fn new(
        graph: Arc<dyn ImageGraph>,
        tags: Arc<dyn TagStore>,
        containers: Arc<dyn ContainerProvider>,
        events: EventEmitter,
    ) -> Self {
        Self {
            graph,
            tags,
            containers,
            events,
        }
    }

    /// Delete an image by name (`repo[:tag]` or raw id/prefix).
    ///
    /// Returns the ordered effects of the operation. An empty list with no
    /// error means the image is still referenced and nothing was removable.
    ///
    /// Errors from the recursive parent prune propagate exactly one level:
    /// the top-level caller sees a failure from its direct parent recursion,
    /// deeper cascade failures are dropped.
    pub fn delete_image(
        &self,
        name: &str,
        top_level: bool,
        force: bool,
        no_prune: bool,
    ) -> Result<Vec<DeleteEffect>> {
        let mut effects = Vec::new();
        self.delete_into(name, top_level, force, no_prune, &mut effects)?;
        Ok(effects)
    }

    fn delete_into(
        &self,
        name: &str,
        top_level: bool,
        force: bool,
        no_prune: bool,
        effects: &mut Vec<DeleteEffect>,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return Err(WharfError::Validation(
                "Image name can not be blank".to_string(),
            ));
        }

        let (repo_name, mut tag) = parse_repository_tag(name);
        if tag.is_empty() {
            tag = DEFAULT_TAG.to_string();
        }

        let img = self.resolve(name, &repo_name, &tag)?;

        // A raw id (or id prefix) deletion discards any repo:tag reading of
        // the name and operates on the full binding set.
        let by_id = img.id.starts_with(name);
        let bindings = self.tags.by_id(&img.id);

        let selected: Vec<TagBinding> = if by_id {
            let distinct: HashSet<&str> = bindings.iter().map(|b| b.repo.as_str()).collect();
            if distinct.len() > 1 && top_level && !force {
                return Err(WharfError::Conflict(format!(
                    "cannot delete image {name} because it is tagged in multiple repositories, use -f to force"
                )));
            }
            bindings.clone()
        } else {
            vec![TagBinding {
                repo: repo_name.clone(),
                tag: tag.clone(),
                image_id: img.id.clone(),
            }]
        };

        // A recursive prune stops at any ancestor that is still tagged:
        // no effects, no error.
        if !top_level && !bindings.is_empty() {
            return Ok(());
        }

        // In-use check whenever this pass could remove the last binding.
        if bindings.len() <= 1 || selected.len() == bindings.len() {
            self.check_not_in_use(&img.id, force)?;
        }

        for binding in &selected {
            if self.tags.delete(&binding.repo, &binding.tag)? {
                let reference = binding.reference();
                self.events
                    .emit(AuditEvent::with_reference(events::IMAGE_UNTAG, &reference));
                tracing::info!(reference = %reference, id = %short_id(&img.id), "untagged image");
                effects.push(DeleteEffect::Untagged { reference });
            }
        }

        let remaining = self.tags.by_id(&img.id);
        if remaining.is_empty() && !self.has_children(&img.id) {
            // Clear residual bindings before dropping the node.
            self.tags.delete_all(&img.id)?;
            self.graph.delete(&img.id)?;
            self.events
                .emit(AuditEvent::with_reference(events::IMAGE_DELETE, &img.id));
            tracing::info!(id = %short_id(&img.id), "deleted image");
            effects.push(DeleteEffect::Deleted {
                id: img.id.clone(),
            });

            if let Some(parent) = img.parent.as_deref() {
                if !no_prune {
                    let nested = self.delete_into(parent, false, force, no_prune, effects);
                    if top_level {
                        return nested;
                    }
                }
            }
        }

        Ok(())
    }

    /// Resolve a delete request to an image: the repository index first,
    /// then the graph by id/prefix. The not-found report distinguishes a
    /// known repository with a missing tag from a name nothing matches.
    fn resolve(&self, name: &str, repo_name: &str, tag: &str) -> Result<Image> {
        if let Some(id) = self.tags.get(repo_name, tag) {
            if let Some(img) = self.graph.lookup(&id) {
                return Ok(img);
            }
        }
        if let Some(img) = self.graph.lookup(name) {
            return Ok(img);
        }
        if self.tags.repository_exists(repo_name) {
            return Err(WharfError::NotFound {
                reference: image_reference(repo_name, tag),
            });
        }
        Err(WharfError::NotFound {
            reference: name.to_string(),
        })
    }

    fn has_children(&self, image_id: &str) -> bool {
        self.graph
            .by_parent()
            .get(image_id)
            .is_some_and(|children| !children.is_empty())
    }

    /// Walk every container's image ancestry looking for `image_id`.
    ///
    /// Running containers always block, force or not. Stopped containers
    /// block only without force.
    fn check_not_in_use(&self, image_id: &str, force: bool) -> Result<()> {
        'containers: for container in self.containers.containers() {
            // A container whose image is gone from the graph pins nothing.
            let Some(mut current) = self.graph.lookup(&container.image_id) else {
                continue;
            };
            loop {
                if current.id == image_id {
                    let sid = short_id(image_id);
                    let scid = short_id(&container.id);
                    if container.running {
                        return Err(WharfError::Conflict(if force {
                            format!(
                                "cannot force delete {sid} because the running container {scid} is using it, stop it and retry"
                            )
                        } else {
                            format!(
                                "cannot delete {sid} because the running container {scid} is using it, stop it and use -f to force"
                            )
                        }));
                    }
                    if !force {
                        return Err(WharfError::Conflict(format!(
                            "cannot delete {sid} because the container {scid} is using it, use -f to force"
                        )));
                    }
                    // Stopped and forced: overridable, move on.
                    continue 'containers;
                }
                match current.parent.as_deref().and_then(|p| self.graph.lookup(p)) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }
        Ok(())
    }
}
