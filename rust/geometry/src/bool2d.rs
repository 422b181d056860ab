// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Union for Outline Repair
//!
//! Polygon union backed by the i_overlay crate. The plan pipeline uses it to
//! reunify outlines whose simplified rings cross themselves: the overlay
//! resolves every crossing and returns a set of simple shapes.

use crate::point::Point2D;
use crate::polygon::{close_ring, signed_area, Polygon};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;

/// Minimum area threshold - shapes smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Union a set of polygons into simple, non-overlapping pieces.
///
/// Self-intersecting rings are split at their crossings. Each returned
/// polygon has a closed exterior and closed holes.
pub fn union_polygons(polygons: &[Polygon]) -> Vec<Polygon> {
    let mut iter = polygons.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let subject = polygon_to_paths(first);
    let clip: Vec<Vec<[f64; 2]>> = iter.flat_map(polygon_to_paths).collect();

    // Result is Vec<Vec<Vec<[f64; 2]>>> - Vec of shapes, each shape is Vec of contours
    let result = subject.overlay(&clip, OverlayRule::Union, FillRule::EvenOdd);

    shapes_to_polygons(&result)
}

/// Resolve self-intersections of a single polygon
pub fn union_polygon(polygon: &Polygon) -> Vec<Polygon> {
    union_polygons(std::slice::from_ref(polygon))
}

/// Pick the polygon with the largest area (first one wins ties)
pub fn largest_polygon(polygons: Vec<Polygon>) -> Option<Polygon> {
    let mut best: Option<(f64, Polygon)> = None;
    for polygon in polygons {
        let area = polygon.area();
        match &best {
            Some((best_area, _)) if area <= *best_area => {}
            _ => best = Some((area, polygon)),
        }
    }
    best.map(|(_, polygon)| polygon)
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

/// Convert a polygon to i_overlay path format (open paths, closing vertex dropped)
fn polygon_to_paths(polygon: &Polygon) -> Vec<Vec<[f64; 2]>> {
    std::iter::once(&polygon.exterior)
        .chain(polygon.interiors.iter())
        .map(|ring| ring_to_path(ring))
        .filter(|path| path.len() >= 3)
        .collect()
}

fn ring_to_path(ring: &[Point2D]) -> Vec<[f64; 2]> {
    let mut path: Vec<[f64; 2]> = ring.iter().map(Point2D::to_array).collect();
    if path.len() > 1 && path.first() == path.last() {
        path.pop();
    }
    path
}

/// Convert i_overlay result shapes back to polygons
///
/// i_overlay returns Vec<Vec<Vec<[f64; 2]>>> where:
/// - Outer Vec: list of shapes
/// - Middle Vec: list of contours per shape (first is outer, rest are holes)
/// - Inner Vec: list of points per contour
fn shapes_to_polygons(shapes: &[Vec<Vec<[f64; 2]>>]) -> Vec<Polygon> {
    let mut polygons = Vec::with_capacity(shapes.len());

    for shape in shapes {
        let Some((outer, holes)) = shape.split_first() else {
            continue;
        };
        let exterior: Vec<Point2D> = outer.iter().map(|p| Point2D::from(*p)).collect();
        if exterior.len() < 3 || signed_area(&exterior).abs() <= MIN_AREA_THRESHOLD {
            continue;
        }

        let interiors = holes
            .iter()
            .map(|hole| hole.iter().map(|p| Point2D::from(*p)).collect::<Vec<_>>())
            .filter(|hole| hole.len() >= 3 && signed_area(hole).abs() > MIN_AREA_THRESHOLD)
            .map(|hole| close_ring(&hole))
            .collect();

        polygons.push(Polygon {
            exterior: close_ring(&exterior),
            interiors,
        });
    }

    polygons
}
