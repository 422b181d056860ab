// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Colour-based zone classification
//!
//! Rendered plan pages fill rooms with a flat tint. The dominant tint is found
//! by clustering a random pixel sample; pixels close to it are labelled, and
//! each component is classified by area and by whether it touches the extent
//! of the colour mask:
//!
//! - larger than `main_area_threshold`: main living area
//! - balcony-sized and touching the extent: balcony
//! - wet-area-sized and inside the extent: bathroom or kitchen, which seeds a
//!   water point at its centroid
//!
//! The heuristic is approximate. Plans with two similar tints, or rooms whose
//! tint bleeds into the legend, are misclassified rather than rejected.

use crate::components::{label_components, ComponentLabels, PixelBox};
use crate::config::ZoneConfig;
use crate::kmeans::{kmeans, sample_indices, squared_distance, KMeansParams, Rgb, SeededRng};
use crate::raster::{color_distance_mask, mask_extent};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Fill colour assumed when the image has no pixels at all
const FALLBACK_COLOR: Rgb = [252.0, 216.0, 215.0];

/// Dominant room-fill colour and the distance tolerance around it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MainColor {
    pub rgb: Rgb,
    pub tolerance: f64,
}

/// Summary of one cluster as seen by the selection rules
#[derive(Debug, Clone, Copy, PartialEq)]
struct ClusterStats {
    center: Rgb,
    count: usize,
}

impl ClusterStats {
    fn brightness(&self) -> f64 {
        (self.center[0] + self.center[1] + self.center[2]) / 3.0
    }

    fn red_bias(&self) -> f64 {
        (self.center[0] - (self.center[1] + self.center[2]) / 2.0).max(0.0)
    }

    fn color_range(&self) -> f64 {
        let max = self.center.iter().cloned().fold(f64::MIN, f64::max);
        let min = self.center.iter().cloned().fold(f64::MAX, f64::min);
        max - min
    }
}

/// Index of the highest positive score; the first cluster wins ties
fn best_positive<F>(clusters: &[ClusterStats], candidates: &[usize], score: F) -> Option<usize>
where
    F: Fn(&ClusterStats) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for &idx in candidates {
        let s = score(&clusters[idx]);
        if s > 0.0 && best.map_or(true, |(_, b)| s > b) {
            best = Some((idx, s));
        }
    }
    best.map(|(idx, _)| idx)
}

fn most_populous(clusters: &[ClusterStats], candidates: impl Iterator<Item = usize>) -> Option<usize> {
    let mut best: Option<usize> = None;
    for idx in candidates {
        if best.map_or(true, |b| clusters[idx].count > clusters[b].count) {
            best = Some(idx);
        }
    }
    best
}

/// Choose the room-fill cluster.
///
/// A cluster qualifies when it holds at least `min_cluster_share` of the
/// sample and its mean brightness is neither background nor ink. Qualifying
/// clusters are ranked by red bias times population, then by channel range
/// times population, then by population alone. Without any qualifying cluster
/// the most populous cluster is taken.
fn select_cluster(clusters: &[ClusterStats], sample_size: usize, config: &ZoneConfig) -> usize {
    let qualifying: Vec<usize> = (0..clusters.len())
        .filter(|&idx| {
            let c = &clusters[idx];
            let share = c.count as f64 / sample_size as f64;
            share >= config.min_cluster_share
                && c.brightness() <= config.background_brightness
                && c.brightness() >= config.ink_brightness
        })
        .collect();

    best_positive(clusters, &qualifying, |c| c.red_bias() * c.count as f64)
        .or_else(|| best_positive(clusters, &qualifying, |c| c.color_range() * c.count as f64))
        .or_else(|| most_populous(clusters, qualifying.iter().copied()))
        .or_else(|| most_populous(clusters, 0..clusters.len()))
        .unwrap_or(0)
}

/// Percentile with linear interpolation between order statistics
fn percentile(values: &mut [f64], pct: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(values[lo] + (values[hi] - values[lo]) * (rank - lo as f64))
}

/// Find the dominant room-fill colour of a page.
///
/// `seed` drives both the pixel sample and the clustering.
pub fn detect_main_color(rgb: &RgbImage, config: &ZoneConfig, seed: u64) -> MainColor {
    let pixels: Vec<Rgb> = rgb
        .pixels()
        .map(|p| [p.0[0] as f64, p.0[1] as f64, p.0[2] as f64])
        .collect();

    if pixels.is_empty() {
        return MainColor {
            rgb: FALLBACK_COLOR,
            tolerance: config.min_tolerance,
        };
    }

    let mut rng = SeededRng::new(seed);
    let sample: Vec<Rgb> = sample_indices(pixels.len(), config.max_samples, &mut rng)
        .into_iter()
        .map(|idx| pixels[idx])
        .collect();

    let params = KMeansParams {
        clusters: config.clusters,
        restarts: config.restarts,
        max_iterations: config.max_iterations,
        convergence: config.convergence,
    };
    let clustering = kmeans(&sample, &params, &mut rng);
    if clustering.centers.is_empty() {
        return MainColor {
            rgb: FALLBACK_COLOR,
            tolerance: config.min_tolerance,
        };
    }

    let clusters: Vec<ClusterStats> = clustering
        .centers
        .iter()
        .zip(clustering.counts())
        .map(|(center, count)| ClusterStats {
            center: *center,
            count,
        })
        .collect();

    let chosen = select_cluster(&clusters, sample.len(), config);
    let center = clusters[chosen].center;

    let mut distances: Vec<f64> = sample
        .iter()
        .zip(&clustering.labels)
        .filter(|(_, label)| **label == chosen)
        .map(|(p, _)| squared_distance(p, &center).sqrt())
        .collect();
    let tolerance = percentile(&mut distances, config.tolerance_percentile)
        .unwrap_or(config.min_tolerance)
        .clamp(config.min_tolerance, config.max_tolerance);

    debug!(
        samples = sample.len(),
        cluster = chosen,
        population = clusters[chosen].count,
        inertia = clustering.inertia,
        "Selected room-fill cluster"
    );

    MainColor {
        rgb: center,
        tolerance,
    }
}

/// Statistics of one colour component that passed the size and legend filters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneComponent {
    pub label_id: u32,
    pub area_px: u32,
    /// `[min_x, min_y, max_x, max_y]`, inclusive
    pub bbox_px: [u32; 4],
    pub touches_edge: bool,
}

/// Outcome of zone classification on one page
#[derive(Debug, Clone)]
pub struct ZoneClassification {
    pub main_color: MainColor,
    /// Extent of the colour mask, `None` when nothing matched
    pub extent: Option<PixelBox>,
    pub components: Vec<ZoneComponent>,
    pub main_ids: Vec<u32>,
    pub balcony_ids: Vec<u32>,
    pub wet_ids: Vec<u32>,
    pub labels: ComponentLabels,
}

/// Classify the colour components of a page into main area, balconies and wet areas
pub fn classify_zones(rgb: &RgbImage, config: &ZoneConfig, seed: u64) -> ZoneClassification {
    let main_color = detect_main_color(rgb, config, seed);
    let mask = color_distance_mask(rgb, main_color.rgb, main_color.tolerance);
    let labels = label_components(&mask);

    let mut result = ZoneClassification {
        main_color,
        extent: mask_extent(&mask),
        components: Vec::new(),
        main_ids: Vec::new(),
        balcony_ids: Vec::new(),
        wet_ids: Vec::new(),
        labels,
    };

    let Some(extent) = result.extent else {
        warn!(color = ?main_color.rgb, "Room-fill colour matched no pixels");
        return result;
    };

    let legend_top = rgb.height().saturating_sub(config.bottom_margin_px);
    let [balcony_min, balcony_max] = config.balcony_area;
    let [wet_min, wet_max] = config.wet_area;

    for component in &result.labels.components {
        if component.area < config.min_component_area || component.bbox.max_y >= legend_top {
            continue;
        }

        let touches_edge = component.bbox.touches(&extent, config.edge_margin_px);
        let b = component.bbox;
        result.components.push(ZoneComponent {
            label_id: component.id,
            area_px: component.area,
            bbox_px: [b.min_x, b.min_y, b.max_x, b.max_y],
            touches_edge,
        });

        if component.area > config.main_area_threshold {
            result.main_ids.push(component.id);
        } else if touches_edge && (balcony_min..=balcony_max).contains(&component.area) {
            result.balcony_ids.push(component.id);
        } else if !touches_edge && (wet_min..=wet_max).contains(&component.area) {
            result.wet_ids.push(component.id);
        }
    }

    info!(
        components = result.components.len(),
        main = result.main_ids.len(),
        balconies = result.balcony_ids.len(),
        wet = result.wet_ids.len(),
        "Classified zones"
    );
    result
}

/// Plumbing marker at a wet-area centroid
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WaterPoint {
    pub label_id: u32,
    pub x_px: f64,
    pub y_px: f64,
    pub x_mm: f64,
    pub y_mm: f64,
}

/// Water points of the wet areas, in page pixels and page millimetres (y-up)
pub fn water_points(zones: &ZoneClassification, image_height: u32, mm_per_px: f64) -> Vec<WaterPoint> {
    zones
        .wet_ids
        .iter()
        .filter_map(|&id| zones.labels.get(id))
        .map(|c| {
            let (x, y) = c.centroid;
            WaterPoint {
                label_id: c.id,
                x_px: x,
                y_px: y,
                x_mm: x * mm_per_px,
                y_mm: (image_height as f64 - y) * mm_per_px,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb as Pixel;

    const WHITE: Pixel<u8> = Pixel([255, 255, 255]);
    const PINK: Pixel<u8> = Pixel([240, 150, 150]);

    fn fill(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Pixel<u8>) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                img.put_pixel(x, y, color);
            }
        }
    }

    fn stats(center: Rgb, count: usize) -> ClusterStats {
        ClusterStats { center, count }
    }

    #[test]
    fn test_percentile_interpolates() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0, 5.0];
        assert_relative_eq!(percentile(&mut values, 50.0).unwrap(), 3.0);
        assert_relative_eq!(percentile(&mut values, 95.0).unwrap(), 4.8);
        assert!(percentile(&mut [], 95.0).is_none());
    }

    #[test]
    fn test_reddish_cluster_preferred() {
        let clusters = vec![
            stats([255.0, 255.0, 255.0], 500), // background
            stats([120.0, 120.0, 200.0], 300), // bluish, more populous
            stats([230.0, 160.0, 160.0], 150), // reddish
            stats([10.0, 10.0, 10.0], 50),     // ink
        ];
        let chosen = select_cluster(&clusters, 1000, &ZoneConfig::default());
        assert_eq!(chosen, 2);
    }

    #[test]
    fn test_color_range_fallback() {
        let clusters = vec![
            stats([255.0, 255.0, 255.0], 500),
            stats([128.0, 128.0, 128.0], 300),
            stats([100.0, 140.0, 200.0], 200),
        ];
        let chosen = select_cluster(&clusters, 1000, &ZoneConfig::default());
        assert_eq!(chosen, 2);
    }

    #[test]
    fn test_population_fallback_and_share_filter() {
        let clusters = vec![
            stats([128.0, 128.0, 128.0], 300),
            stats([90.0, 90.0, 90.0], 695),
            // Reddish but below the minimum share
            stats([230.0, 100.0, 100.0], 5),
        ];
        let chosen = select_cluster(&clusters, 1000, &ZoneConfig::default());
        assert_eq!(chosen, 1);

        // Only background and ink: most populous overall
        let clusters = vec![stats([255.0, 255.0, 255.0], 800), stats([0.0, 0.0, 0.0], 200)];
        assert_eq!(select_cluster(&clusters, 1000, &ZoneConfig::default()), 0);
    }

    #[test]
    fn test_dominant_flat_color_is_selected() {
        // 80 % gray, 20 % white: no red bias and no channel range
        let mut img = RgbImage::from_pixel(100, 100, Pixel([128, 128, 128]));
        fill(&mut img, 0, 0, 99, 19, WHITE);

        let main = detect_main_color(&img, &ZoneConfig::default(), 0);
        assert_relative_eq!(main.rgb[0], 128.0, epsilon = 1e-9);
        assert_relative_eq!(main.rgb[1], 128.0, epsilon = 1e-9);
        assert_relative_eq!(main.rgb[2], 128.0, epsilon = 1e-9);
        assert_relative_eq!(main.tolerance, 12.0);
    }

    #[test]
    fn test_classify_main_balcony_and_wet() {
        let mut img = RgbImage::from_pixel(400, 400, WHITE);
        // Main area 100x100
        fill(&mut img, 20, 20, 119, 119, PINK);
        // Balcony strip on the right of the extent, 20x50
        fill(&mut img, 300, 20, 319, 69, PINK);
        // Wet area inside the extent, 30x30
        fill(&mut img, 200, 150, 229, 179, PINK);
        // Lowest tinted block defines the extent bottom, too small to classify
        fill(&mut img, 150, 300, 159, 309, PINK);
        // Legend swatch in the bottom margin
        fill(&mut img, 20, 360, 59, 389, PINK);

        let zones = classify_zones(&img, &ZoneConfig::default(), 0);
        assert_eq!(zones.main_color.rgb, [240.0, 150.0, 150.0]);

        let extent = zones.extent.unwrap();
        assert_eq!(extent.max_y, 389);

        let area_of = |id: u32| zones.labels.get(id).unwrap().area;
        assert_eq!(zones.main_ids.len(), 1);
        assert_eq!(area_of(zones.main_ids[0]), 10_000);
        assert_eq!(zones.balcony_ids.len(), 1);
        assert_eq!(area_of(zones.balcony_ids[0]), 1000);
        assert_eq!(zones.wet_ids.len(), 1);
        assert_eq!(area_of(zones.wet_ids[0]), 900);

        // The legend swatch and the small block are not recorded
        assert_eq!(zones.components.len(), 3);

        let points = water_points(&zones, 400, 0.5);
        assert_eq!(points.len(), 1);
        assert_relative_eq!(points[0].x_px, 214.5);
        assert_relative_eq!(points[0].y_px, 164.5);
        assert_relative_eq!(points[0].x_mm, 107.25);
        assert_relative_eq!(points[0].y_mm, (400.0 - 164.5) * 0.5);
    }

    #[test]
    fn test_blank_page_has_no_zones() {
        let img = RgbImage::from_pixel(50, 50, WHITE);
        let zones = classify_zones(&img, &ZoneConfig::default(), 3);
        assert!(zones.main_ids.is_empty());
        assert!(zones.balcony_ids.is_empty());
        assert!(zones.wet_ids.is_empty());
    }
}
