// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Zone classification over a batch of rendered plan pages
//!
//! Each page is classified independently, so pages run on the rayon pool.
//! Nothing is written until every page has succeeded; then one SVG overlay
//! per page and a `plan_data.json` summary land in the output directory.

use crate::components::PixelBox;
use crate::config::ZoneConfig;
use crate::contours::trace_contours;
use crate::error::Result;
use crate::overlay::{encode_png_base64, render_svg, OverlayLayers};
use crate::raster::load_rgb;
use crate::zones::{classify_zones, water_points, WaterPoint, ZoneComponent};
use flatplan_geometry::{distinct_vertex_count, simplify_ring, Point2D};
use image::{GrayImage, RgbImage};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const SUMMARY_FILE: &str = "plan_data.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Classification result for one page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSummary {
    pub page_index: usize,
    pub label: String,
    pub source: String,
    pub output_svg: String,
    pub image_size_px: ImageSize,
    pub mm_per_px: f64,
    pub ceiling_height_m: f64,
    pub main_component_ids: Vec<u32>,
    pub balcony_component_ids: Vec<u32>,
    pub water_component_ids: Vec<u32>,
    pub component_stats: Vec<ZoneComponent>,
    /// Extent of the room-fill mask; all zeros when nothing matched
    pub bounds_px: PixelBox,
    pub main_color_rgb: [f64; 3],
    pub main_color_tolerance: f64,
    pub water_points: Vec<WaterPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchSummary {
    pub ceiling_height_m: f64,
    pub plans: Vec<PageSummary>,
}

/// A processed page, not yet written
#[derive(Debug, Clone)]
pub struct PageOutput {
    pub summary: PageSummary,
    pub svg: String,
}

/// File-name friendly label: whitespace runs become `_`, anything that is not
/// a word character or `-` is dropped
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut in_whitespace = false;
    for ch in value.trim().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                slug.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            slug.push(ch);
        }
    }

    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "plan".to_string()
    } else {
        slug.to_string()
    }
}

/// Unique labels for a list of page images, in input order
fn page_labels(pages: &[PathBuf]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    pages
        .iter()
        .enumerate()
        .map(|(idx, path)| {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let base = slugify(&stem);
            let mut label = base.clone();
            let mut n = idx + 1;
            while !seen.insert(label.clone()) {
                label = format!("{}_{}", base, n);
                n += 1;
            }
            label
        })
        .collect()
}

/// Closed, simplified outlines of every region in `mask`, in pixel coordinates
pub fn contour_rings(mask: &GrayImage, tolerance_px: f64) -> Vec<Vec<Point2D>> {
    trace_contours(mask)
        .into_iter()
        .filter(|contour| contour.len() >= 3)
        .map(|contour| simplify_ring(&contour, tolerance_px))
        .filter(|ring| distinct_vertex_count(ring) >= 3)
        .collect()
}

/// Classify one page and render its overlay
pub fn process_page(
    rgb: &RgbImage,
    page_index: usize,
    label: &str,
    source: &str,
    config: &ZoneConfig,
    seed: u64,
) -> Result<PageOutput> {
    let zones = classify_zones(rgb, config, seed);
    let main_rings = contour_rings(&zones.labels.mask_of(&zones.main_ids), config.contour_simplify_px);
    let balcony_rings = contour_rings(
        &zones.labels.mask_of(&zones.balcony_ids),
        config.contour_simplify_px,
    );
    let points = water_points(&zones, rgb.height(), config.page_mm_per_px);

    let png = encode_png_base64(rgb)?;
    let svg = render_svg(
        rgb.width(),
        rgb.height(),
        &png,
        &OverlayLayers {
            main_areas: &main_rings,
            balcony_areas: &balcony_rings,
            water_points: &points,
        },
    );

    debug!(
        page = page_index,
        label,
        main_rings = main_rings.len(),
        balcony_rings = balcony_rings.len(),
        water_points = points.len(),
        "Processed page"
    );

    let summary = PageSummary {
        page_index,
        label: label.to_string(),
        source: source.to_string(),
        output_svg: format!("{}.svg", label),
        image_size_px: ImageSize {
            width: rgb.width(),
            height: rgb.height(),
        },
        mm_per_px: config.page_mm_per_px,
        ceiling_height_m: config.ceiling_height_m,
        main_component_ids: zones.main_ids.clone(),
        balcony_component_ids: zones.balcony_ids.clone(),
        water_component_ids: zones.wet_ids.clone(),
        component_stats: zones.components.clone(),
        bounds_px: zones.extent.unwrap_or(PixelBox::at(0, 0)),
        main_color_rgb: zones.main_color.rgb,
        main_color_tolerance: zones.main_color.tolerance,
        water_points: points,
    };

    Ok(PageOutput { summary, svg })
}

/// Classify every page and write overlays plus the summary into `output_dir`.
///
/// Pages are processed in parallel; `plans` in the summary follows input order.
pub fn run_batch(
    pages: &[PathBuf],
    output_dir: &Path,
    config: &ZoneConfig,
    seed: u64,
) -> Result<BatchSummary> {
    let labels = page_labels(pages);

    let outputs = pages
        .par_iter()
        .zip(labels.par_iter())
        .enumerate()
        .map(|(idx, (path, label))| {
            let rgb = load_rgb(path)?;
            let source = path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            process_page(&rgb, idx, label, &source, config, seed)
        })
        .collect::<Result<Vec<_>>>()?;

    std::fs::create_dir_all(output_dir)?;
    for output in &outputs {
        std::fs::write(output_dir.join(&output.summary.output_svg), &output.svg)?;
    }

    let summary = BatchSummary {
        ceiling_height_m: config.ceiling_height_m,
        plans: outputs.into_iter().map(|o| o.summary).collect(),
    };
    std::fs::write(
        output_dir.join(SUMMARY_FILE),
        serde_json::to_string_pretty(&summary)?,
    )?;

    info!(
        pages = summary.plans.len(),
        output = %output_dir.display(),
        "Batch complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::MASK_ON;
    use image::Luma;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Block 2 /  Plan 7.1 "), "Block_2__Plan_71");
        assert_eq!(slugify("plan-a_b"), "plan-a_b");
        assert_eq!(slugify("Планировка 3"), "Планировка_3");
        assert_eq!(slugify(" ?! "), "plan");
    }

    #[test]
    fn test_duplicate_labels_get_suffix() {
        let pages = vec![
            PathBuf::from("a/page.png"),
            PathBuf::from("b/page.png"),
            PathBuf::from("other.png"),
        ];
        assert_eq!(page_labels(&pages), vec!["page", "page_2", "other"]);
    }

    #[test]
    fn test_suffixed_label_skips_taken_names() {
        let pages = vec![
            PathBuf::from("page_3.png"),
            PathBuf::from("a/page.png"),
            PathBuf::from("b/page.png"),
        ];
        let labels = page_labels(&pages);
        assert_eq!(labels, vec!["page_3", "page", "page_4"]);
        let unique: FxHashSet<&String> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len());
    }

    #[test]
    fn test_contour_rings_are_closed_and_simplified() {
        let mut mask = GrayImage::new(40, 40);
        for y in 5..25 {
            for x in 5..35 {
                mask.put_pixel(x, y, Luma([MASK_ON]));
            }
        }

        let rings = contour_rings(&mask, 2.0);
        assert_eq!(rings.len(), 1);
        let ring = &rings[0];
        assert_eq!(ring.first(), ring.last());
        assert!(ring.len() < 20);
        assert!(distinct_vertex_count(ring) >= 4);
    }
}
