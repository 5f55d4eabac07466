//! Wharf Engine - image lifecycle implementation.
//!
//! The daemon-side half of wharf: the image graph and repository index
//! seams with their disk-backed implementations, the deletion engine, the
//! storage-pressure garbage collector, the execution driver and the
//! monitor process controller.

pub mod containers;
pub mod driver;
pub mod images;
pub mod monitor;

// Re-export common types
pub use containers::{ContainerProvider, ContainerSummary, DiskContainers};
pub use driver::{ExecDriver, HostDriver};
pub use images::{
    image_reference, parse_repository_tag, DeleteEffect, DiskImageGraph, DiskTagStore, Image,
    ImageDeleter, ImageGc, ImageGraph, TagBinding, TagStore, UsageReporter, DEFAULT_TAG,
};
pub use monitor::{MonitorController, MONITOR_BIN};

/// Wharf Engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
