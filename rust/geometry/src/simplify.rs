// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line and polygon simplification
//!
//! Douglas-Peucker runs on closed rings (the start vertex doubles as the end
//! vertex). Polygon simplification keeps the result a single simple polygon:
//! when a ring comes out self-intersecting, or a hole ends up touching the
//! shell or another hole, the rings are reunified with a boolean union and
//! the largest piece is kept. A collapsed shell falls back to the input.

use crate::bool2d::{largest_polygon, union_polygon};
use crate::point::Point2D;
use crate::polygon::{
    close_ring, distinct_vertex_count, ring_is_simple, rings_intersect, signed_area, Polygon,
};
use crate::projection::point_segment_distance;

/// Douglas-Peucker line simplification algorithm.
///
/// The first and last points are always kept. Distances are measured to the
/// chord segment, so a closed ring (first == last) splits at the vertex
/// farthest from its start.
pub fn douglas_peucker(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    // Explicit stack: contour rings can run to thousands of vertices
    let mut spans = vec![(0usize, n - 1)];
    while let Some((start, end)) = spans.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in (start + 1)..end {
            let dist = point_segment_distance(&points[i], &points[start], &points[end]);
            if dist > max_dist {
                max_dist = dist;
                max_idx = i;
            }
        }

        if max_dist > epsilon {
            keep[max_idx] = true;
            spans.push((start, max_idx));
            spans.push((max_idx, end));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Simplify a ring, returning a closed ring
pub fn simplify_ring(ring: &[Point2D], tolerance: f64) -> Vec<Point2D> {
    let closed = close_ring(ring);
    douglas_peucker(&closed, tolerance)
}

fn collapsed(ring: &[Point2D]) -> bool {
    distinct_vertex_count(ring) < 3 || signed_area(ring).abs() <= f64::EPSILON
}

/// Simplify a polygon within `tolerance` while keeping it a single simple polygon.
///
/// - an empty (collapsed) shell returns the unsimplified input;
/// - a self-intersecting ring, or a hole touching the shell or another hole,
///   is split by union and the largest piece kept;
/// - holes that collapse are dropped.
pub fn simplify_polygon(polygon: &Polygon, tolerance: f64) -> Polygon {
    let shell = simplify_ring(&polygon.exterior, tolerance);
    if collapsed(&shell) {
        return polygon.clone();
    }

    let holes: Vec<Vec<Point2D>> = polygon
        .interiors
        .iter()
        .map(|hole| simplify_ring(hole, tolerance))
        .filter(|hole| !collapsed(hole))
        .collect();

    let candidate = Polygon::new(shell, holes);
    if is_simple_polygon(&candidate) {
        return candidate;
    }

    repair_polygon(&candidate).unwrap_or_else(|| polygon.clone())
}

fn is_simple_polygon(polygon: &Polygon) -> bool {
    let rings: Vec<&Vec<Point2D>> = std::iter::once(&polygon.exterior)
        .chain(polygon.interiors.iter())
        .collect();
    if !rings.iter().all(|ring| ring_is_simple(ring)) {
        return false;
    }
    rings
        .iter()
        .enumerate()
        .all(|(i, a)| rings[i + 1..].iter().all(|b| !rings_intersect(a, b)))
}

/// Reunify a self-intersecting polygon and keep the largest simple piece
pub fn repair_polygon(polygon: &Polygon) -> Option<Polygon> {
    largest_polygon(union_polygon(polygon)).filter(Polygon::is_valid)
}
