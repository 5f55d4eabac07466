//! `wharf images` command — list images and their bindings.

use std::path::Path;

use clap::Args;
use wharf_core::container::short_id;
use wharf_engine::{ImageGraph, TagStore};

use crate::output;

#[derive(Args)]
pub struct ImagesArgs {
    /// Show full image ids
    #[arg(long)]
    pub no_trunc: bool,
}

pub fn execute(root: &Path, args: ImagesArgs) -> Result<(), Box<dyn std::error::Error>> {
    let handles = super::open_engine(root)?;

    let mut images = handles.graph.images();
    images.sort_by(|a, b| b.created.cmp(&a.created));

    let mut table = output::new_table(&["IMAGE ID", "TAGS", "PARENT", "LAST USED", "SIZE"]);
    for image in &images {
        let id = if args.no_trunc {
            image.id.clone()
        } else {
            short_id(&image.id)
        };
        let bindings = handles.tags.by_id(&image.id);
        let tags = if bindings.is_empty() {
            "<none>".to_string()
        } else {
            bindings
                .iter()
                .map(|b| b.reference())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let parent = image
            .parent
            .as_deref()
            .map(short_id)
            .unwrap_or_else(|| "-".to_string());
        let last_used = image
            .last_use_time
            .map(|t| output::format_ago(&t))
            .unwrap_or_else(|| "never".to_string());

        table.add_row(vec![
            id,
            tags,
            parent,
            last_used,
            output::format_bytes(image.size_bytes),
        ]);
    }

    println!("{table}");
    Ok(())
}
