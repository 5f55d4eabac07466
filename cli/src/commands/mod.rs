//! CLI command definitions and dispatch.

mod image_clean;
mod images;
mod rmi;
mod start;
mod status;
mod tag;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use wharf_core::config::{DaemonPaths, DEFAULT_ROOT};
use wharf_core::event::EventEmitter;
use wharf_engine::{DiskContainers, DiskImageGraph, DiskTagStore, ImageDeleter};

/// Wharf — container engine image lifecycle tooling.
#[derive(Parser)]
#[command(name = "wharf", version, about)]
pub struct Cli {
    /// Daemon state root directory
    #[arg(long, global = true, default_value = DEFAULT_ROOT)]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Command {
    /// Remove one or more images
    Rmi(rmi::RmiArgs),
    /// Run the storage-pressure image collector loop
    ImageClean(image_clean::ImageCleanArgs),
    /// List images
    Images(images::ImagesArgs),
    /// Create a tag that refers to an existing image
    Tag(tag::TagArgs),
    /// Launch the monitor supervisor for a created container
    Start(start::StartArgs),
    /// Show recovered supervisor status for a container
    Status(status::StatusArgs),
}

/// Open engine handles rooted at the daemon state directory.
pub(crate) struct EngineHandles {
    pub graph: Arc<DiskImageGraph>,
    pub tags: Arc<DiskTagStore>,
    pub events: EventEmitter,
    pub deleter: Arc<ImageDeleter>,
}

pub(crate) fn open_engine(root: &Path) -> Result<EngineHandles, Box<dyn std::error::Error>> {
    let graph = Arc::new(DiskImageGraph::open(&root.join("graph"))?);
    let tags = Arc::new(DiskTagStore::open(&root.join("repositories"))?);
    let containers = Arc::new(DiskContainers::new(DaemonPaths::new(root)));
    let events = EventEmitter::default();
    let deleter = Arc::new(ImageDeleter::new(
        graph.clone(),
        tags.clone(),
        containers,
        events.clone(),
    ));
    Ok(EngineHandles {
        graph,
        tags,
        events,
        deleter,
    })
}

/// Dispatch a parsed CLI to the appropriate command handler.
pub async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Rmi(args) => rmi::execute(&cli.root, args),
        Command::ImageClean(args) => image_clean::execute(&cli.root, args).await,
        Command::Images(args) => images::execute(&cli.root, args),
        Command::Tag(args) => tag::execute(&cli.root, args),
        Command::Start(args) => start::execute(&cli.root, args),
        Command::Status(args) => status::execute(&cli.root, args),
    }
}
