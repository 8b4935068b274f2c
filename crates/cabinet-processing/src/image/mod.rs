//! Image processing module

pub mod thumbnail;

pub use thumbnail::{ThumbnailGenerator, ThumbnailSet};
