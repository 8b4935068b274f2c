//! Width-bounded thumbnails.
//!
//! A thumbnail keeps the source aspect ratio, is never wider than the source and is
//! encoded in the source format when the encoder supports it, PNG otherwise. The same
//! input always yields the same bytes.

use anyhow::Context;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Thumbnails of one source image, in the order the widths were requested.
pub type ThumbnailSet = Vec<(u32, Bytes)>;

pub struct ThumbnailGenerator;

impl ThumbnailGenerator {
    /// Decode once and render every width.
    pub fn generate_all(data: &[u8], widths: &[u32]) -> Result<ThumbnailSet, anyhow::Error> {
        let (img, format) = Self::decode(data)?;
        widths
            .iter()
            .map(|&width| Ok((width, Self::render(&img, format, width)?)))
            .collect()
    }

    /// Encoder format for a decoded source format.
    pub fn output_format(source: Option<ImageFormat>) -> ImageFormat {
        match source {
            Some(ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Some(ImageFormat::Gif) => ImageFormat::Gif,
            Some(ImageFormat::WebP) => ImageFormat::WebP,
            _ => ImageFormat::Png,
        }
    }

    /// Target dimensions for `width`, preserving aspect ratio without upscaling.
    pub fn target_dimensions(source: (u32, u32), width: u32) -> (u32, u32) {
        let (src_w, src_h) = source;
        if width == 0 || src_w == 0 || width >= src_w {
            return (src_w, src_h);
        }
        let height = (u64::from(src_h) * u64::from(width) + u64::from(src_w) / 2) / u64::from(src_w);
        (width, height.max(1) as u32)
    }

    fn decode(data: &[u8]) -> Result<(DynamicImage, ImageFormat), anyhow::Error> {
        let reader = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .context("Failed to read image header")?;
        let format = Self::output_format(reader.format());
        let img = reader.decode().context("Failed to decode image")?;
        Ok((img, format))
    }

    fn render(img: &DynamicImage, format: ImageFormat, width: u32) -> Result<Bytes, anyhow::Error> {
        let (target_w, target_h) = Self::target_dimensions(img.dimensions(), width);
        let resized = if (target_w, target_h) == img.dimensions() {
            img.clone()
        } else {
            img.resize_exact(target_w, target_h, FilterType::Lanczos3)
        };

        // JPEG has no alpha channel.
        let resized = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
            _ => resized,
        };

        let mut buffer = Vec::with_capacity((target_w * target_h * 3) as usize);
        resized
            .write_to(&mut Cursor::new(&mut buffer), format)
            .with_context(|| format!("Failed to encode {:?} thumbnail", format))?;

        tracing::debug!(
            width = target_w,
            height = target_h,
            format = ?format,
            size_bytes = buffer.len(),
            "Thumbnail rendered"
        );

        Ok(Bytes::from(buffer))
    }
}
