// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connected-component labelling of binary masks
//!
//! Shared by the wall-mask detectors (windows, balcony door) and the colour
//! zone classifier. Labelling itself is imageproc's union-find pass with
//! 4-connectivity; this module relabels components in raster order of their
//! first pixel and gathers area, bounding box and centroid.

use crate::raster::{MASK_OFF, MASK_ON};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Inclusive axis-aligned pixel box
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PixelBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelBox {
    /// Box covering a single pixel
    pub fn at(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    pub fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// `max_x - min_x`
    pub fn span_x(&self) -> u32 {
        self.max_x - self.min_x
    }

    /// `max_y - min_y`
    pub fn span_y(&self) -> u32 {
        self.max_y - self.min_y
    }

    /// Number of pixel columns covered
    pub fn pixel_width(&self) -> u32 {
        self.span_x() + 1
    }

    /// Centre of the box in pixel coordinates (col, row)
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x as f64 + self.max_x as f64) / 2.0,
            (self.min_y as f64 + self.max_y as f64) / 2.0,
        )
    }

    /// Whether any side of `self` lies within `margin` pixels of the matching side of `extent`
    pub fn touches(&self, extent: &PixelBox, margin: u32) -> bool {
        self.min_x <= extent.min_x + margin
            || self.max_x + margin >= extent.max_x
            || self.min_y <= extent.min_y + margin
            || self.max_y + margin >= extent.max_y
    }
}

/// A maximal 4-connected blob of set mask pixels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectedComponent {
    /// 1-based id in raster order of the component's first pixel
    pub id: u32,
    /// Pixel count
    pub area: u32,
    pub bbox: PixelBox,
    /// Mean pixel coordinate (col, row)
    pub centroid: (f64, f64),
}

/// Label image plus per-component statistics
#[derive(Debug, Clone)]
pub struct ComponentLabels {
    /// Component id per pixel, 0 for background
    pub labels: ImageBuffer<Luma<u32>, Vec<u32>>,
    /// Components ordered by id
    pub components: Vec<ConnectedComponent>,
}

impl ComponentLabels {
    /// Mask of all pixels belonging to the given component ids
    pub fn mask_of(&self, ids: &[u32]) -> GrayImage {
        let mut mask = GrayImage::new(self.labels.width(), self.labels.height());
        if ids.is_empty() {
            return mask;
        }
        for (x, y, label) in self.labels.enumerate_pixels() {
            let value = if label.0[0] != 0 && ids.contains(&label.0[0]) {
                MASK_ON
            } else {
                MASK_OFF
            };
            mask.put_pixel(x, y, Luma([value]));
        }
        mask
    }

    pub fn get(&self, id: u32) -> Option<&ConnectedComponent> {
        id.checked_sub(1)
            .and_then(|idx| self.components.get(idx as usize))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[derive(Debug)]
struct Accumulator {
    first_index: u64,
    area: u32,
    bbox: PixelBox,
    sum_x: f64,
    sum_y: f64,
}

/// Label the 4-connected components of a binary mask
pub fn label_components(mask: &GrayImage) -> ComponentLabels {
    let mut labels = connected_components(mask, Connectivity::Four, Luma([MASK_OFF]));
    let width = labels.width() as u64;

    let mut stats: FxHashMap<u32, Accumulator> = FxHashMap::default();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label.0[0];
        if label == 0 {
            continue;
        }
        let acc = stats.entry(label).or_insert_with(|| Accumulator {
            first_index: y as u64 * width + x as u64,
            area: 0,
            bbox: PixelBox::at(x, y),
            sum_x: 0.0,
            sum_y: 0.0,
        });
        acc.area += 1;
        acc.bbox.include(x, y);
        acc.sum_x += x as f64;
        acc.sum_y += y as f64;
    }

    let mut ordered: Vec<(u32, Accumulator)> = stats.into_iter().collect();
    ordered.sort_by_key(|(_, acc)| acc.first_index);

    let mut remap: FxHashMap<u32, u32> = FxHashMap::default();
    let components = ordered
        .into_iter()
        .enumerate()
        .map(|(idx, (raw, acc))| {
            let id = idx as u32 + 1;
            remap.insert(raw, id);
            ConnectedComponent {
                id,
                area: acc.area,
                bbox: acc.bbox,
                centroid: (acc.sum_x / acc.area as f64, acc.sum_y / acc.area as f64),
            }
        })
        .collect();

    for label in labels.pixels_mut() {
        if label.0[0] != 0 {
            label.0[0] = remap.get(&label.0[0]).copied().unwrap_or(0);
        }
    }

    ComponentLabels { labels, components }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                mask.put_pixel(x, y, Luma([MASK_ON]));
            }
        }
    }

    #[test]
    fn test_components_in_raster_order() {
        let mut mask = GrayImage::new(40, 40);
        fill(&mut mask, 20, 2, 30, 5); // first in raster order
        fill(&mut mask, 2, 10, 5, 30);
        fill(&mut mask, 10, 35, 12, 36);

        let labels = label_components(&mask);
        assert_eq!(labels.len(), 3);

        let first = &labels.components[0];
        assert_eq!(first.id, 1);
        assert_eq!(first.area, 44);
        assert_eq!(first.bbox, PixelBox { min_x: 20, min_y: 2, max_x: 30, max_y: 5 });
        assert_relative_eq!(first.centroid.0, 25.0);
        assert_relative_eq!(first.centroid.1, 3.5);

        assert_eq!(labels.components[1].bbox.min_x, 2);
        assert_eq!(labels.components[2].area, 6);
        assert_eq!(labels.labels.get_pixel(3, 20).0[0], 2);
    }

    #[test]
    fn test_diagonal_pixels_are_separate() {
        let mut mask = GrayImage::new(4, 4);
        mask.put_pixel(1, 1, Luma([MASK_ON]));
        mask.put_pixel(2, 2, Luma([MASK_ON]));

        let labels = label_components(&mask);
        assert_eq!(labels.len(), 2);
    }

    #[test]
    fn test_mask_of_ids() {
        let mut mask = GrayImage::new(20, 20);
        fill(&mut mask, 0, 0, 3, 3);
        fill(&mut mask, 10, 10, 12, 12);

        let labels = label_components(&mask);
        let only_second = labels.mask_of(&[2]);
        assert_eq!(only_second.get_pixel(0, 0).0[0], MASK_OFF);
        assert_eq!(only_second.get_pixel(11, 11).0[0], MASK_ON);
        assert_eq!(labels.get(2).map(|c| c.area), Some(9));
        assert!(labels.get(0).is_none());
    }

    #[test]
    fn test_touches_extent() {
        let extent = PixelBox { min_x: 10, min_y: 10, max_x: 100, max_y: 100 };
        let inner = PixelBox { min_x: 40, min_y: 40, max_x: 60, max_y: 60 };
        let near_left = PixelBox { min_x: 12, min_y: 40, max_x: 20, max_y: 60 };
        let near_bottom = PixelBox { min_x: 40, min_y: 40, max_x: 60, max_y: 98 };

        assert!(!inner.touches(&extent, 2));
        assert!(near_left.touches(&extent, 2));
        assert!(near_bottom.touches(&extent, 2));
        assert!(!near_bottom.touches(&extent, 1));
    }
}
