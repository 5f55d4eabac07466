//! Image lifecycle: graph and repository index seams, reference parsing,
//! the deletion engine and the garbage collector.

pub mod delete;
pub mod gc;
pub mod graph;
pub mod image;
pub mod reference;
pub mod tags;

pub use delete::{DeleteEffect, ImageDeleter};
pub use gc::ImageGc;
pub use graph::{DiskImageGraph, ImageGraph, UsageReporter};
pub use image::Image;
pub use reference::{image_reference, parse_repository_tag, DEFAULT_TAG};
pub use tags::{DiskTagStore, TagBinding, TagStore};
