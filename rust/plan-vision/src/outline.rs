// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Apartment outline extraction and normalization
//!
//! The apartment boundary is assumed to be the single largest region enclosed
//! by ink in the drawing. Contours of the ink mask are filtered for noise and
//! stray marks, the largest survivor becomes the pixel outline, and the
//! outline is then moved into millimetre plan space and simplified.

use crate::config::OutlineConfig;
use crate::contours::trace_contours;
use crate::error::{PlanError, Result};
use crate::frame::{flip_row, PlanFrame};
use flatplan_geometry::{distinct_vertex_count, simplify_polygon, Polygon};
use image::GrayImage;
use tracing::{debug, info};

/// Find the apartment outline in the ink mask.
///
/// Returns a closed polygon in y-up pixel space (row 0 of the image maps to
/// `y = height`).
pub fn extract_outline(ink: &GrayImage, config: &OutlineConfig) -> Result<Polygon> {
    let height = ink.height();
    let contours = trace_contours(ink);
    let total = contours.len();

    let mut best: Option<(f64, Polygon)> = None;
    let mut survivors = 0usize;

    for contour in contours {
        if contour.len() < config.min_contour_points {
            continue;
        }

        let polygon = Polygon::from_shell(
            contour
                .iter()
                .map(|p| flip_row(p.x, p.y, height))
                .collect(),
        );
        let area = polygon.area();
        if area < config.min_area_px {
            continue;
        }

        survivors += 1;
        if best.as_ref().map_or(true, |(best_area, _)| area > *best_area) {
            best = Some((area, polygon));
        }
    }

    debug!(contours = total, survivors, "Filtered ink contours");

    let (area, outline) = best.ok_or_else(|| {
        PlanError::extraction(format!(
            "no contour survived outline filtering ({} traced, min {} points, min {} px²)",
            total, config.min_contour_points, config.min_area_px
        ))
    })?;

    info!(
        area_px = area,
        vertices = outline.exterior.len(),
        "Selected apartment outline"
    );
    Ok(outline)
}

/// Outline in plan millimetres plus the frame that produced it
#[derive(Debug, Clone)]
pub struct NormalizedOutline {
    pub polygon: Polygon,
    pub frame: PlanFrame,
}

/// Move a y-up pixel outline into millimetre plan space and simplify it.
///
/// Order matters: the bounding-box minimum is taken from the unsimplified
/// pixel outline, every ring is translated and scaled by it, and only then
/// the millimetre polygon is simplified with `tolerance_mm`.
pub fn normalize_outline(
    outline_px: &Polygon,
    scale: f64,
    tolerance_mm: f64,
    image_height: u32,
) -> Result<NormalizedOutline> {
    let bounds = outline_px
        .bounds()
        .ok_or_else(|| PlanError::extraction("outline has no vertices"))?;
    let frame = PlanFrame::new(bounds.min(), scale, image_height);

    let mm = outline_px.map_points(|p| p.translate_scale(&frame.origin, scale));
    let polygon = simplify_polygon(&mm, tolerance_mm);

    if !polygon.is_valid() {
        return Err(PlanError::extraction(format!(
            "normalized outline has only {} distinct vertices",
            distinct_vertex_count(&polygon.exterior)
        )));
    }

    debug!(
        before = mm.exterior.len(),
        after = polygon.exterior.len(),
        tolerance_mm,
        "Simplified outline"
    );

    Ok(NormalizedOutline { polygon, frame })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::MASK_ON;
    use approx::assert_relative_eq;
    use flatplan_geometry::Point2D;
    use image::Luma;

    fn fill(mask: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                mask.put_pixel(x, y, Luma([MASK_ON]));
            }
        }
    }

    #[test]
    fn test_largest_contour_wins() {
        let mut mask = GrayImage::new(200, 200);
        fill(&mut mask, 10, 10, 34, 34); // ~600 px²
        fill(&mut mask, 60, 60, 159, 159); // ~10000 px²

        let outline = extract_outline(&mask, &OutlineConfig::default()).unwrap();
        let bounds = outline.bounds().unwrap();
        assert_relative_eq!(bounds.width(), 100.0);
        assert_relative_eq!(outline.area(), 10000.0 - 0.5);
    }

    #[test]
    fn test_vertical_axis_is_flipped() {
        let mut mask = GrayImage::new(100, 100);
        // Near the top of the image
        fill(&mut mask, 10, 5, 69, 34);

        let outline = extract_outline(&mask, &OutlineConfig::default()).unwrap();
        let bounds = outline.bounds().unwrap();
        // Rows 5..=34 become y in (65.5, 95.5)
        assert_relative_eq!(bounds.min_y, 100.0 - 34.5);
        assert_relative_eq!(bounds.max_y, 100.0 - 4.5);
    }

    #[test]
    fn test_small_marks_are_rejected() {
        let mut mask = GrayImage::new(100, 100);
        // Large enough in points but too small in area: a thin text stroke
        fill(&mut mask, 10, 10, 60, 11);
        // Small blob
        fill(&mut mask, 80, 80, 84, 84);

        let err = extract_outline(&mask, &OutlineConfig::default()).unwrap_err();
        assert!(matches!(err, PlanError::Extraction(_)));
    }

    #[test]
    fn test_normalize_anchors_at_origin() {
        let outline = Polygon::from_shell(vec![
            Point2D::new(20.0, 30.0),
            Point2D::new(170.0, 30.0),
            Point2D::new(170.0, 130.0),
            Point2D::new(20.0, 130.0),
        ]);

        let normalized = normalize_outline(&outline, 2.0, 0.8, 200).unwrap();
        let bounds = normalized.polygon.bounds().unwrap();
        assert_relative_eq!(bounds.min_x, 0.0);
        assert_relative_eq!(bounds.min_y, 0.0);
        assert_relative_eq!(bounds.max_x, 300.0);
        assert_relative_eq!(bounds.max_y, 200.0);
        assert_eq!(normalized.frame.origin, Point2D::new(20.0, 30.0));
        assert!(normalized.polygon.is_valid());
    }
}
