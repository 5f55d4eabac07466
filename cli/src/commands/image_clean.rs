//! `wharf image-clean` command — run the image collector loop.

use std::path::Path;
use std::time::Duration;

use clap::Args;
use wharf_core::config::GcConfig;
use wharf_engine::ImageGc;

#[derive(Args)]
pub struct ImageCleanArgs {
    /// Sleep between collection cycles, in nanoseconds
    pub clean_interval_ns: u64,

    /// Usage percent below which a cycle is skipped
    pub retain_percent: f64,
}

pub async fn execute(root: &Path, args: ImageCleanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let handles = super::open_engine(root)?;

    let gc = ImageGc::new(
        handles.graph.clone(),
        handles.deleter.clone(),
        handles.events.clone(),
        GcConfig {
            clean_interval: Duration::from_nanos(args.clean_interval_ns),
            retain_percent: args.retain_percent,
        },
    );

    // Never returns in normal operation.
    gc.run().await;
    Ok(())
}
