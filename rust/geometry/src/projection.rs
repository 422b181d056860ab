// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point-to-segment projection and nearest-edge search

use crate::error::{Error, Result};
use crate::point::Point2D;
use serde::{Deserialize, Serialize};

/// Segments shorter than this are treated as a single point
const DEGENERATE_LENGTH_SQ: f64 = 1e-20;

/// Projection of a point onto a single segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Arc-length from the segment start to the closest point, in `[0, length]`
    pub offset: f64,
    /// Closest point on the segment
    pub closest: Point2D,
    /// Euclidean distance from the query point to `closest`
    pub distance: f64,
}

/// Project `p` onto segment `ab`, clamped to the segment's own span
pub fn project_to_segment(p: &Point2D, a: &Point2D, b: &Point2D) -> SegmentProjection {
    let ab = a.vector_to(b);
    let length_sq = ab.norm_squared();

    if length_sq < DEGENERATE_LENGTH_SQ {
        return SegmentProjection {
            offset: 0.0,
            closest: *a,
            distance: p.distance_to(a),
        };
    }

    let t = (a.vector_to(p).dot(&ab) / length_sq).clamp(0.0, 1.0);
    let closest = Point2D::from_nalgebra(&(a.to_nalgebra() + ab * t));

    SegmentProjection {
        offset: t * length_sq.sqrt(),
        closest,
        distance: p.distance_to(&closest),
    }
}

/// Distance from `p` to segment `ab`
pub fn point_segment_distance(p: &Point2D, a: &Point2D, b: &Point2D) -> f64 {
    project_to_segment(p, a, b).distance
}

/// An opening position expressed against the outline:
/// the nearest boundary edge and the arc-length offset along it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EdgeProjection {
    /// Edge endpoints, a consecutive vertex pair of the outline
    pub edge: (Point2D, Point2D),
    /// Arc-length from `edge.0` to the projected point
    pub offset: f64,
    /// Distance from the query point to its projection
    pub distance: f64,
    /// Index of the edge's start vertex in the ring
    pub edge_index: usize,
}

impl EdgeProjection {
    pub fn edge_length(&self) -> f64 {
        self.edge.0.distance_to(&self.edge.1)
    }
}

/// Project `point` onto the nearest edge of `ring`.
///
/// Edges are consecutive vertex pairs in ring order. Each edge is searched
/// with a clamped segment projection; the edge with the smallest distance
/// wins and ties keep the first edge encountered.
pub fn project_onto_ring(point: &Point2D, ring: &[Point2D]) -> Result<EdgeProjection> {
    if ring.len() < 2 {
        return Err(Error::DegenerateOutline(ring.len()));
    }

    let mut best: Option<EdgeProjection> = None;
    for (idx, pair) in ring.windows(2).enumerate() {
        let projection = project_to_segment(point, &pair[0], &pair[1]);
        let better = best
            .as_ref()
            .map_or(true, |current| projection.distance < current.distance);
        if better {
            best = Some(EdgeProjection {
                edge: (pair[0], pair[1]),
                offset: projection.offset,
                distance: projection.distance,
                edge_index: idx,
            });
        }
    }

    best.ok_or(Error::DegenerateOutline(ring.len()))
}
