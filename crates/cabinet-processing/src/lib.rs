//! Cabinet Processing Library
//!
//! Derived asset generation. Thumbnails are produced with the `image` crate behind the
//! `image` feature.

#[cfg(feature = "image")]
pub mod image;

#[cfg(feature = "image")]
pub use crate::image::{ThumbnailGenerator, ThumbnailSet};
