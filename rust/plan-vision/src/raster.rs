// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raster loading and binary masks
//!
//! Masks are `GrayImage`s holding 255 for set pixels and 0 elsewhere, so they
//! can go straight into imageproc's labelling.

use crate::components::PixelBox;
use crate::config::InkConfig;
use crate::error::{PlanError, Result};
use image::{GrayImage, ImageReader, Luma, RgbImage};
use std::path::Path;
use tracing::debug;

pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

/// Source drawing plus its ink mask. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct RasterPlan {
    pub rgb: RgbImage,
    pub ink: GrayImage,
}

impl RasterPlan {
    pub fn from_rgb(rgb: RgbImage, config: &InkConfig) -> Self {
        let ink = ink_mask(&rgb, config.near_white_threshold);
        Self { rgb, ink }
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }
}

/// Open and decode an image file as RGB and derive its ink mask
pub fn load_raster(path: impl AsRef<Path>, config: &InkConfig) -> Result<RasterPlan> {
    let rgb = load_rgb(path)?;
    Ok(RasterPlan::from_rgb(rgb, config))
}

/// Open and decode an image file as 8-bit RGB
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage> {
    let path = path.as_ref();
    let image_load = |source| PlanError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path)
        .map_err(|e| image_load(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| image_load(image::ImageError::IoError(e)))?;
    let rgb = reader.decode().map_err(image_load)?.to_rgb8();

    debug!(
        path = %path.display(),
        width = rgb.width(),
        height = rgb.height(),
        "Loaded raster"
    );
    Ok(rgb)
}

/// Ink mask: set where all three channels are below `threshold`
pub fn ink_mask(rgb: &RgbImage, threshold: u8) -> GrayImage {
    mask_from_rgb(rgb, |[r, g, b]| r < threshold && g < threshold && b < threshold)
}

/// Grayscale as the mean of the three channels
pub fn channel_mean(rgb: [u8; 3]) -> f64 {
    (rgb[0] as f64 + rgb[1] as f64 + rgb[2] as f64) / 3.0
}

/// Wall mask: set where the channel-mean gray is below `max_gray`
pub fn wall_mask(rgb: &RgbImage, max_gray: f64) -> GrayImage {
    mask_from_rgb(rgb, |px| channel_mean(px) < max_gray)
}

/// Euclidean RGB distance
pub fn color_distance(px: [u8; 3], color: [f64; 3]) -> f64 {
    let dr = px[0] as f64 - color[0];
    let dg = px[1] as f64 - color[1];
    let db = px[2] as f64 - color[2];
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Colour mask: set where the pixel lies strictly within `tolerance` of `color`
pub fn color_distance_mask(rgb: &RgbImage, color: [f64; 3], tolerance: f64) -> GrayImage {
    mask_from_rgb(rgb, |px| color_distance(px, color) < tolerance)
}

fn mask_from_rgb<F>(rgb: &RgbImage, predicate: F) -> GrayImage
where
    F: Fn([u8; 3]) -> bool,
{
    let mut mask = GrayImage::new(rgb.width(), rgb.height());
    for (x, y, pixel) in rgb.enumerate_pixels() {
        if predicate(pixel.0) {
            mask.put_pixel(x, y, Luma([MASK_ON]));
        }
    }
    mask
}

pub fn is_set(mask: &GrayImage, x: u32, y: u32) -> bool {
    mask.get_pixel(x, y).0[0] > 128
}

/// Number of set pixels
pub fn mask_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] > 128).count()
}

/// Inclusive bounding box of all set pixels, `None` for an empty mask
pub fn mask_extent(mask: &GrayImage) -> Option<PixelBox> {
    let mut extent: Option<PixelBox> = None;
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel.0[0] <= 128 {
            continue;
        }
        match extent.as_mut() {
            Some(b) => b.include(x, y),
            None => extent = Some(PixelBox::at(x, y)),
        }
    }
    extent
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_ink_mask_threshold() {
        let mut img = RgbImage::from_pixel(3, 1, Rgb([255, 255, 255]));
        img.put_pixel(0, 0, Rgb([239, 239, 239]));
        // One channel at the threshold keeps the pixel out of the mask
        img.put_pixel(1, 0, Rgb([10, 240, 10]));

        let mask = ink_mask(&img, 240);
        assert!(is_set(&mask, 0, 0));
        assert!(!is_set(&mask, 1, 0));
        assert!(!is_set(&mask, 2, 0));
    }

    #[test]
    fn test_wall_mask_uses_channel_mean() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([255, 255, 255]));
        img.put_pixel(0, 0, Rgb([200, 20, 10])); // mean 76.7
        img.put_pixel(1, 0, Rgb([90, 90, 60])); // mean 80.0

        let mask = wall_mask(&img, 80.0);
        assert!(is_set(&mask, 0, 0));
        assert!(!is_set(&mask, 1, 0));
    }

    #[test]
    fn test_color_distance_mask() {
        let mut img = RgbImage::from_pixel(2, 1, Rgb([0, 0, 0]));
        img.put_pixel(1, 0, Rgb([193, 176, 213]));

        let mask = color_distance_mask(&img, [190.0, 180.0, 210.0], 30.0);
        assert!(!is_set(&mask, 0, 0));
        assert!(is_set(&mask, 1, 0));
        assert_eq!(mask_count(&mask), 1);
    }

    #[test]
    fn test_mask_extent() {
        let mut mask = GrayImage::new(10, 10);
        assert!(mask_extent(&mask).is_none());

        mask.put_pixel(2, 7, Luma([MASK_ON]));
        mask.put_pixel(6, 3, Luma([MASK_ON]));
        let extent = mask_extent(&mask).unwrap();
        assert_eq!(extent, PixelBox { min_x: 2, min_y: 3, max_x: 6, max_y: 7 });
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_raster("/nonexistent/plan.png", &InkConfig::default()).unwrap_err();
        assert!(matches!(err, PlanError::ImageLoad { .. }));
        assert!(!err.is_extraction_failure());
    }

    #[test]
    fn test_load_roundtrip_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.png");
        let mut img = RgbImage::from_pixel(4, 4, Rgb([255, 255, 255]));
        img.put_pixel(1, 2, Rgb([0, 0, 0]));
        img.save(&path).unwrap();

        let raster = load_raster(&path, &InkConfig::default()).unwrap();
        assert_eq!(raster.width(), 4);
        assert_eq!(mask_count(&raster.ink), 1);
        assert!(is_set(&raster.ink, 1, 2));
    }
}
