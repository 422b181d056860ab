// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mapping from raster pixels to plan millimetres
//!
//! Plan space is y-up with its origin at the bounding-box minimum of the
//! pixel outline. Every detector goes through the same frame so openings,
//! balconies and water points line up with the normalized outline.

use flatplan_geometry::Point2D;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlanFrame {
    /// Outline bounding-box minimum in flipped (y-up) pixel space
    pub origin: Point2D,
    /// Millimetres per pixel
    pub scale: f64,
    /// Source image height in pixels
    pub image_height: u32,
}

impl PlanFrame {
    pub fn new(origin: Point2D, scale: f64, image_height: u32) -> Self {
        Self {
            origin,
            scale,
            image_height,
        }
    }

    /// Raster `(column, row)` to y-up pixel space
    pub fn flip(&self, col: f64, row: f64) -> Point2D {
        flip_row(col, row, self.image_height)
    }

    /// Raster `(column, row)` to plan millimetres
    pub fn to_plan(&self, col: f64, row: f64) -> Point2D {
        self.flip(col, row).translate_scale(&self.origin, self.scale)
    }

    /// Pixel length to millimetres
    pub fn length_mm(&self, px: f64) -> f64 {
        px * self.scale
    }
}

/// Raster `(column, row)` to y-up pixel space for an image of `height` rows
pub fn flip_row(col: f64, row: f64, height: u32) -> Point2D {
    Point2D::new(col, height as f64 - row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_to_plan() {
        // Outline minimum at (20, 30) in y-up pixels of a 200 px tall image
        let frame = PlanFrame::new(Point2D::new(20.0, 30.0), 2.0, 200);

        // Row 170 is 30 px above the bottom: the outline's lowest line
        let p = frame.to_plan(20.0, 170.0);
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 0.0);

        let q = frame.to_plan(45.0, 120.0);
        assert_relative_eq!(q.x, 50.0);
        assert_relative_eq!(q.y, 100.0);
        assert_relative_eq!(frame.length_mm(12.5), 25.0);
    }
}
