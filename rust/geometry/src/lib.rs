// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Flatplan Geometry
//!
//! The small 2D toolkit behind floor plan extraction: closed rings and
//! polygons, Douglas-Peucker simplification that keeps polygons simple,
//! boolean union via i_overlay, and nearest-edge projection for openings.

pub mod bool2d;
pub mod error;
pub mod point;
pub mod polygon;
pub mod projection;
pub mod simplify;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};

pub use bool2d::{largest_polygon, union_polygon, union_polygons};
pub use error::{Error, Result};
pub use point::Point2D;
pub use polygon::{
    close_ring, distinct_vertex_count, is_closed, ring_is_simple, rings_intersect, signed_area,
    Bounds, Polygon,
};
pub use projection::{project_onto_ring, project_to_segment, EdgeProjection, SegmentProjection};
pub use simplify::{douglas_peucker, repair_polygon, simplify_polygon, simplify_ring};
