// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Balcony polygon detection from its fill colour

use crate::components::label_components;
use crate::config::BalconyConfig;
use crate::contours::trace_contours;
use crate::frame::PlanFrame;
use crate::raster::color_distance_mask;
use flatplan_geometry::{simplify_polygon, Polygon};
use image::RgbImage;
use tracing::{debug, warn};

/// Find the balcony outline in plan millimetres.
///
/// Pixels close to the balcony fill colour are labelled; among components of
/// balcony size the top-most one is traced and its longest contour mapped
/// through `frame`. Returns `None` when no component qualifies.
pub fn detect_balcony_polygon(
    rgb: &RgbImage,
    frame: &PlanFrame,
    config: &BalconyConfig,
) -> Option<Polygon> {
    let target = config.target_rgb.map(f64::from);
    let labels = label_components(&color_distance_mask(rgb, target, config.color_tolerance));

    // Components are in scan order, so min_by_key keeps the first on ties
    let candidate = labels
        .components
        .iter()
        .filter(|c| (config.min_area..=config.max_area).contains(&c.area))
        .min_by_key(|c| c.bbox.min_y);

    let Some(component) = candidate else {
        warn!(
            components = labels.len(),
            "No balcony-coloured region of balcony size found"
        );
        return None;
    };

    let contours = trace_contours(&labels.mask_of(&[component.id]));
    let mut longest: Option<&Vec<_>> = None;
    for contour in &contours {
        if longest.map_or(true, |l| contour.len() > l.len()) {
            longest = Some(contour);
        }
    }
    let contour = longest?;

    let polygon = Polygon::from_shell(contour.iter().map(|p| frame.to_plan(p.x, p.y)).collect());
    let simplified = simplify_polygon(&polygon, config.simplify_tolerance_mm);

    debug!(
        component = component.id,
        area_px = component.area,
        vertices = simplified.exterior.len(),
        "Detected balcony polygon"
    );
    Some(simplified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use flatplan_geometry::Point2D;
    use image::Rgb;

    const BALCONY: Rgb<u8> = Rgb([193, 176, 213]);

    fn fill(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                img.put_pixel(x, y, color);
            }
        }
    }

    #[test]
    fn test_top_most_balcony_is_traced() {
        let mut img = RgbImage::from_pixel(300, 300, Rgb([255, 255, 255]));
        // 70x80 = 5600 px, lower one
        fill(&mut img, 150, 180, 219, 259, BALCONY);
        // 60x100 = 6000 px, top-most
        fill(&mut img, 20, 10, 79, 109, BALCONY);
        let frame = PlanFrame::new(Point2D::new(0.0, 0.0), 2.0, 300);

        let polygon = detect_balcony_polygon(&img, &frame, &BalconyConfig::default()).unwrap();
        assert!(polygon.is_valid());

        let bounds = polygon.bounds().unwrap();
        // Columns 19.5..79.5 and rows 9.5..109.5, y flipped, 2 mm/px
        assert_relative_eq!(bounds.min_x, 39.0, epsilon = 1.0);
        assert_relative_eq!(bounds.max_x, 159.0, epsilon = 1.0);
        assert_relative_eq!(bounds.min_y, 381.0, epsilon = 1.0);
        assert_relative_eq!(bounds.max_y, 581.0, epsilon = 1.0);
    }

    #[test]
    fn test_no_balcony_region() {
        let mut img = RgbImage::from_pixel(100, 100, Rgb([255, 255, 255]));
        // Right colour, far too small
        fill(&mut img, 10, 10, 19, 19, BALCONY);
        let frame = PlanFrame::new(Point2D::new(0.0, 0.0), 1.0, 100);

        assert!(detect_balcony_polygon(&img, &frame, &BalconyConfig::default()).is_none());
    }
}
