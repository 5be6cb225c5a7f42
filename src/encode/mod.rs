//! Image encoding and persistence.

pub mod export;

pub use export::{FileExporter, ImageExporter, InMemoryExporter, encode_image, ensure_parent_dir};
