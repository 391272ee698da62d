//! Source image loading and normalization.

use crate::error::{ClipError, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

/// Loads source images and fits them to the provider's frame size.
pub trait ImagePreprocessor: Send + Sync {
    /// Loads the image at `path`.
    fn load(&self, path: &Path) -> Result<DynamicImage>;

    /// Scales `image` to cover `width` x `height`, then crops the center.
    fn resize_and_center_crop(&self, image: DynamicImage, width: u32, height: u32) -> DynamicImage;
}

/// [`ImagePreprocessor`] backed by the `image` crate with Lanczos resampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct LanczosPreprocessor;

impl ImagePreprocessor for LanczosPreprocessor {
    fn load(&self, path: &Path) -> Result<DynamicImage> {
        if !path.exists() {
            return Err(ClipError::ImageNotFound(path.to_path_buf()));
        }
        let image = image::open(path)?;
        Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
    }

    fn resize_and_center_crop(&self, image: DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (new_width, new_height) = cover_size(image.width(), image.height(), width, height);
        let resized = if (new_width, new_height) == (image.width(), image.height()) {
            image
        } else {
            image.resize_exact(new_width, new_height, FilterType::Lanczos3)
        };

        let left = (new_width - width) / 2;
        let top = (new_height - height) / 2;
        resized.crop_imm(left, top, width, height)
    }
}

/// Smallest size with the source aspect ratio that covers the target.
fn cover_size(src_width: u32, src_height: u32, width: u32, height: u32) -> (u32, u32) {
    let src_width = src_width.max(1);
    let src_height = src_height.max(1);
    let target_ratio = width as f64 / height.max(1) as f64;
    let src_ratio = src_width as f64 / src_height as f64;

    if src_ratio > target_ratio {
        // wider than the target: fit height
        let scaled = (src_width as f64 * height as f64 / src_height as f64) as u32;
        (scaled.max(width), height)
    } else {
        let scaled = (src_height as f64 * width as f64 / src_width as f64) as u32;
        (width, scaled.max(height))
    }
}

/// Encodes an image as PNG bytes.
pub(crate) fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
