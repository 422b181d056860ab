// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Closed rings and polygons with holes
//!
//! Rings are stored explicitly closed: the first and the last point coincide.
//! All constructors in this module close their input, so downstream code can
//! walk consecutive vertex pairs as edges without wrapping.

use crate::point::Point2D;
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing coincident vertices
const EPSILON_2D: f64 = 1e-9;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of a point set, `None` when empty
    pub fn of_points<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in iter {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn min(&self) -> Point2D {
        Point2D::new(self.min_x, self.min_y)
    }
}

/// Return a copy of `points` with the closing vertex appended if missing
pub fn close_ring(points: &[Point2D]) -> Vec<Point2D> {
    let mut ring = points.to_vec();
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first.distance_to(&last) > EPSILON_2D {
            ring.push(first);
        }
    }
    ring
}

/// Whether the first and last points coincide
pub fn is_closed(ring: &[Point2D]) -> bool {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => ring.len() > 1 && first.distance_to(last) <= EPSILON_2D,
        _ => false,
    }
}

/// Number of vertices ignoring the duplicated closing point
pub fn distinct_vertex_count(ring: &[Point2D]) -> usize {
    if is_closed(ring) {
        ring.len() - 1
    } else {
        ring.len()
    }
}

/// Signed area via the shoelace formula.
/// Positive = counter-clockwise, Negative = clockwise.
/// Works on open or closed rings.
pub fn signed_area(ring: &[Point2D]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += ring[i].x * ring[j].y;
        area -= ring[j].x * ring[i].y;
    }

    area * 0.5
}

/// Twice the signed area of triangle (a, b, c)
fn orientation(a: &Point2D, b: &Point2D, c: &Point2D) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: &Point2D, b: &Point2D, p: &Point2D) -> bool {
    p.x >= a.x.min(b.x) - EPSILON_2D
        && p.x <= a.x.max(b.x) + EPSILON_2D
        && p.y >= a.y.min(b.y) - EPSILON_2D
        && p.y <= a.y.max(b.y) + EPSILON_2D
}

/// Whether closed segments `ab` and `cd` share at least one point
pub fn segments_intersect(a: &Point2D, b: &Point2D, c: &Point2D, d: &Point2D) -> bool {
    let o1 = orientation(a, b, c);
    let o2 = orientation(a, b, d);
    let o3 = orientation(c, d, a);
    let o4 = orientation(c, d, b);

    let proper = ((o1 > EPSILON_2D && o2 < -EPSILON_2D) || (o1 < -EPSILON_2D && o2 > EPSILON_2D))
        && ((o3 > EPSILON_2D && o4 < -EPSILON_2D) || (o3 < -EPSILON_2D && o4 > EPSILON_2D));
    if proper {
        return true;
    }

    (o1.abs() <= EPSILON_2D && on_segment(a, b, c))
        || (o2.abs() <= EPSILON_2D && on_segment(a, b, d))
        || (o3.abs() <= EPSILON_2D && on_segment(c, d, a))
        || (o4.abs() <= EPSILON_2D && on_segment(c, d, b))
}

/// Whether any edge of ring `a` touches or crosses any edge of ring `b`
pub fn rings_intersect(a: &[Point2D], b: &[Point2D]) -> bool {
    let a = close_ring(a);
    let b = close_ring(b);
    a.windows(2).any(|ea| {
        b.windows(2)
            .any(|eb| segments_intersect(&ea[0], &ea[1], &eb[0], &eb[1]))
    })
}

/// Whether a closed ring is simple: at least 3 distinct vertices, no
/// self-intersections and no spikes folding back onto the previous edge.
pub fn ring_is_simple(ring: &[Point2D]) -> bool {
    let ring = close_ring(ring);
    if ring.len() < 4 {
        return false;
    }
    let n = ring.len() - 1;
    if signed_area(&ring).abs() <= EPSILON_2D {
        return false;
    }

    for i in 0..n {
        let (a, b) = (&ring[i], &ring[i + 1]);
        if a.distance_to(b) <= EPSILON_2D {
            return false;
        }
        for j in (i + 1)..n {
            let (c, d) = (&ring[j], &ring[j + 1]);
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                // Adjacent edges share one vertex; they only conflict when
                // they are collinear and fold back over each other.
                let shared = if j == i + 1 { b } else { a };
                let far_this = if j == i + 1 { a } else { b };
                let far_other = if j == i + 1 { d } else { c };
                if orientation(far_this, shared, far_other).abs() <= EPSILON_2D {
                    let v1 = shared.vector_to(far_this);
                    let v2 = shared.vector_to(far_other);
                    if v1.dot(&v2) > 0.0 {
                        return false;
                    }
                }
                continue;
            }
            if segments_intersect(a, b, c, d) {
                return false;
            }
        }
    }

    true
}

/// Polygon with a closed exterior shell and zero or more closed holes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Polygon {
    /// Exterior ring (closed)
    pub exterior: Vec<Point2D>,
    /// Interior rings (closed)
    pub interiors: Vec<Vec<Point2D>>,
}

impl Polygon {
    /// Create a polygon, closing every ring
    pub fn new(exterior: Vec<Point2D>, interiors: Vec<Vec<Point2D>>) -> Self {
        Self {
            exterior: close_ring(&exterior),
            interiors: interiors.iter().map(|ring| close_ring(ring)).collect(),
        }
    }

    /// Polygon without holes
    pub fn from_shell(exterior: Vec<Point2D>) -> Self {
        Self::new(exterior, Vec::new())
    }

    /// Area of the shell minus the area of the holes
    pub fn area(&self) -> f64 {
        let holes: f64 = self.interiors.iter().map(|h| signed_area(h).abs()).sum();
        signed_area(&self.exterior).abs() - holes
    }

    /// Bounds of the exterior ring
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of_points(&self.exterior)
    }

    /// Whether the shell is closed and has at least 3 distinct vertices
    pub fn is_valid(&self) -> bool {
        is_closed(&self.exterior) && distinct_vertex_count(&self.exterior) >= 3
    }

    /// Consecutive vertex pairs of the exterior ring, in vertex order
    pub fn edges(&self) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
        self.exterior.windows(2).map(|w| (w[0], w[1]))
    }

    /// Apply `f` to every vertex of every ring
    pub fn map_points<F>(&self, f: F) -> Polygon
    where
        F: Fn(&Point2D) -> Point2D,
    {
        Polygon {
            exterior: self.exterior.iter().map(&f).collect(),
            interiors: self
                .interiors
                .iter()
                .map(|ring| ring.iter().map(&f).collect())
                .collect(),
        }
    }
}
