//! `wharf tag` command — bind a reference to an existing image.

use std::path::Path;

use clap::Args;
use wharf_core::container::short_id;
use wharf_engine::{image_reference, parse_repository_tag, ImageGraph, TagStore, DEFAULT_TAG};

#[derive(Args)]
pub struct TagArgs {
    /// Source image (id, id prefix or existing repo:tag)
    pub image: String,

    /// New reference (repo[:tag])
    pub reference: String,
}

pub fn execute(root: &Path, args: TagArgs) -> Result<(), Box<dyn std::error::Error>> {
    let handles = super::open_engine(root)?;

    // Resolve the source through the index first, then the graph.
    let (src_repo, mut src_tag) = parse_repository_tag(&args.image);
    if src_tag.is_empty() {
        src_tag = DEFAULT_TAG.to_string();
    }
    let source = handles
        .tags
        .get(&src_repo, &src_tag)
        .and_then(|id| handles.graph.lookup(&id))
        .or_else(|| handles.graph.lookup(&args.image))
        .ok_or_else(|| format!("No such image: {}", args.image))?;

    let (repo, mut tag) = parse_repository_tag(&args.reference);
    if tag.is_empty() {
        tag = DEFAULT_TAG.to_string();
    }
    handles.tags.set(&repo, &tag, &source.id)?;

    println!(
        "Tagged {} as {}",
        short_id(&source.id),
        image_reference(&repo, &tag)
    );
    Ok(())
}
