// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Iso-contour tracing of binary masks (marching squares at level 0.5)
//!
//! Samples sit at pixel centres, so every contour vertex lies halfway between
//! a set pixel and an unset neighbour. The grid is treated as surrounded by
//! unset pixels, which makes every contour a closed ring. Saddle cells keep
//! diagonal set pixels apart, matching the 4-connected component labelling.

use crate::raster::is_set;
use flatplan_geometry::Point2D;
use image::GrayImage;
use rustc_hash::{FxHashMap, FxHashSet};

/// Crossing position in doubled pixel coordinates (exact half-pixel keys)
type Key = (i64, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

use Edge::{Bottom, Left, Right, Top};

/// Segments per cell case. Corner bits: top-left 8, top-right 4,
/// bottom-right 2, bottom-left 1.
const CASES: [&[(Edge, Edge)]; 16] = [
    &[],
    &[(Left, Bottom)],
    &[(Bottom, Right)],
    &[(Left, Right)],
    &[(Top, Right)],
    &[(Top, Right), (Left, Bottom)],
    &[(Top, Bottom)],
    &[(Left, Top)],
    &[(Left, Top)],
    &[(Top, Bottom)],
    &[(Left, Top), (Bottom, Right)],
    &[(Top, Right)],
    &[(Left, Right)],
    &[(Bottom, Right)],
    &[(Left, Bottom)],
    &[],
];

#[derive(Debug, Clone, Copy, Default)]
struct Links {
    ends: [Key; 2],
    len: u8,
}

impl Links {
    fn push(&mut self, key: Key) {
        if (self.len as usize) < self.ends.len() {
            self.ends[self.len as usize] = key;
            self.len += 1;
        }
    }
}

fn edge_key(edge: Edge, cx: i64, cy: i64) -> Key {
    match edge {
        Top => (2 * cx + 1, 2 * cy),
        Right => (2 * cx + 2, 2 * cy + 1),
        Bottom => (2 * cx + 1, 2 * cy + 2),
        Left => (2 * cx, 2 * cy + 1),
    }
}

fn key_to_point(key: Key) -> Point2D {
    Point2D::new(key.0 as f64 / 2.0, key.1 as f64 / 2.0)
}

/// Trace all iso-contours of `mask`.
///
/// Each contour is a closed ring (first point repeated at the end) in
/// `(column, row)` pixel coordinates. Contours are returned in raster order
/// of their top-left-most crossing.
pub fn trace_contours(mask: &GrayImage) -> Vec<Vec<Point2D>> {
    let width = mask.width() as i64;
    let height = mask.height() as i64;
    let sample = |x: i64, y: i64| -> u8 {
        let inside = x >= 0 && y >= 0 && x < width && y < height;
        u8::from(inside && is_set(mask, x as u32, y as u32))
    };

    let mut links: FxHashMap<Key, Links> = FxHashMap::default();
    for cy in -1..height {
        for cx in -1..width {
            let case = (sample(cx, cy) << 3)
                | (sample(cx + 1, cy) << 2)
                | (sample(cx + 1, cy + 1) << 1)
                | sample(cx, cy + 1);

            for &(from, to) in CASES[case as usize] {
                let a = edge_key(from, cx, cy);
                let b = edge_key(to, cx, cy);
                links.entry(a).or_default().push(b);
                links.entry(b).or_default().push(a);
            }
        }
    }

    let mut starts: Vec<Key> = links.keys().copied().collect();
    starts.sort_unstable_by_key(|&(x, y)| (y, x));

    let mut visited: FxHashSet<Key> = FxHashSet::default();
    let mut contours = Vec::new();

    for start in starts {
        if visited.contains(&start) {
            continue;
        }

        let mut ring = Vec::new();
        let mut prev: Option<Key> = None;
        let mut current = start;

        loop {
            visited.insert(current);
            ring.push(key_to_point(current));

            let Some(entry) = links.get(&current) else {
                break;
            };
            if entry.len < 2 {
                break;
            }
            let next = match prev {
                Some(p) if entry.ends[0] == p => entry.ends[1],
                _ => entry.ends[0],
            };

            prev = Some(current);
            current = next;
            if current == start || visited.contains(&current) {
                break;
            }
        }

        if ring.len() >= 3 {
            ring.push(ring[0]);
            contours.push(ring);
        }
    }

    contours
}
