//! Image loading and preprocessing.
//!
//! Decode, resize to the network input size, and extract pixel values
//! the way the Inception graph expects them.

use anyhow::{Context, Result};
use image::{imageops, DynamicImage, RgbImage};
use std::path::Path;

use crate::config::{InceptionSettings, ResizingKind};

/// Pixel values ready to be fed to the network.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelTensor {
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

/// Decode an image file.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("Failed to load image: {}", path.display()))
}

/// Bring `image` to exactly `width` x `height`.
pub fn resize_image(image: &DynamicImage, width: u32, height: u32, kind: ResizingKind) -> DynamicImage {
    let (w, h) = (image.width().max(1) as f32, image.height().max(1) as f32);

    match kind {
        ResizingKind::Fill => image.resize_exact(width, height, imageops::FilterType::Triangle),
        ResizingKind::IsoCrop => {
            let scale = (width as f32 / w).max(height as f32 / h);
            let new_w = ((w * scale).ceil() as u32).max(width);
            let new_h = ((h * scale).ceil() as u32).max(height);

            let scaled = image.resize_exact(new_w, new_h, imageops::FilterType::Triangle);
            let x_offset = (new_w - width) / 2;
            let y_offset = (new_h - height) / 2;

            scaled.crop_imm(x_offset, y_offset, width, height)
        }
        ResizingKind::IsoPad => {
            let scale = (width as f32 / w).min(height as f32 / h);
            let new_w = ((w * scale).round() as u32).clamp(1, width);
            let new_h = ((h * scale).round() as u32).clamp(1, height);

            let scaled = image
                .resize_exact(new_w, new_h, imageops::FilterType::Triangle)
                .to_rgb8();
            let mut padded = RgbImage::new(width, height);
            let x_offset = (width - new_w) / 2;
            let y_offset = (height - new_h) / 2;
            imageops::overlay(&mut padded, &scaled, x_offset as i64, y_offset as i64);

            DynamicImage::from(padded)
        }
    }
}

/// Convert an already-resized image to network input values.
///
/// Each channel value becomes `(value - mean) * scale`, in RGB order.
pub fn extract_pixels(image: &DynamicImage, settings: &InceptionSettings) -> PixelTensor {
    let rgb = image.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let mut data = vec![0.0f32; 3 * width * height];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let value = (pixel[c] as f32 - settings.mean) * settings.scale;
            let index = if settings.channels_last {
                (y * width + x) * 3 + c
            } else {
                c * width * height + y * width + x
            };
            data[index] = value;
        }
    }

    let shape = if settings.channels_last {
        [1, height, width, 3]
    } else {
        [1, 3, height, width]
    };

    PixelTensor { shape, data }
}

/// Load, resize and extract pixels in one go.
pub fn load_pixels(path: &Path, settings: &InceptionSettings) -> Result<PixelTensor> {
    let image = load_image(path)?;
    let resized = resize_image(
        &image,
        settings.image_width,
        settings.image_height,
        settings.resizing,
    );
    Ok(extract_pixels(&resized, settings))
}
