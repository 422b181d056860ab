// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raster floor plan to vector plan extraction
//!
//! This crate turns a line-art apartment drawing into an `apartment.v1`
//! plan document:
//! 1. Loading the drawing and masking its ink
//! 2. Tracing the apartment outline as the largest enclosed ink region
//! 3. Scaling the outline to millimetres from a known reference dimension
//! 4. Detecting windows and the balcony door on the wall hatching and
//!    placing them along the outline
//! 5. Finding the balcony from its fill colour
//!
//! A second entry point classifies the colour-filled zones of rendered plan
//! pages in batch and writes SVG overlays for review.
//!
//! # Usage
//!
//! ```rust,ignore
//! use flatplan_vision::{extract_plan_from_path, PlanConfig};
//!
//! let mut config = PlanConfig::default();
//! config.calibration.reference_mm = 1410.0;
//! config.calibration.reference_px = 166.0;
//!
//! let plan = extract_plan_from_path("plan.png", &config)?;
//! println!("{}", plan.to_json_pretty()?);
//! ```

pub mod balcony;
pub mod batch;
pub mod components;
pub mod config;
pub mod contours;
pub mod document;
pub mod error;
pub mod frame;
pub mod kmeans;
pub mod openings;
pub mod outline;
pub mod overlay;
pub mod raster;
pub mod zones;

pub use balcony::detect_balcony_polygon;
pub use batch::{run_batch, slugify, BatchSummary, PageSummary};
pub use components::{label_components, ComponentLabels, ConnectedComponent, PixelBox};
pub use config::{
    BalconyConfig, BalconyDoorConfig, CalibrationConfig, DocumentConfig, EntranceConfig,
    InkConfig, OutlineConfig, PlanConfig, WallMaskConfig, WindowConfig, ZoneConfig,
};
pub use contours::trace_contours;
pub use document::{assemble_plan, round1, PlanDocument, PlanParts};
pub use error::{PlanError, Result};
pub use frame::PlanFrame;
pub use openings::{detect_balcony_door, detect_windows, label_walls, DetectedOpening};
pub use outline::{extract_outline, normalize_outline, NormalizedOutline};
pub use raster::{load_raster, load_rgb, RasterPlan};
pub use zones::{classify_zones, detect_main_color, water_points, MainColor, ZoneClassification};

use flatplan_geometry::Point2D;
use std::path::Path;
use tracing::info;

/// Run the full single-drawing pipeline on a loaded raster.
///
/// Stages run strictly in order; any extraction failure aborts the run and
/// nothing partial is returned.
pub fn extract_plan(raster: &RasterPlan, config: &PlanConfig) -> Result<PlanDocument> {
    let outline_px = extract_outline(&raster.ink, &config.outline)?;

    let scale = config.calibration.scale_mm_per_px()?;
    let normalized = normalize_outline(
        &outline_px,
        scale,
        config.outline.simplify_tolerance_mm,
        raster.height(),
    )?;
    let frame = normalized.frame;
    let outline = &normalized.polygon;
    info!(
        scale_mm_per_px = scale,
        vertices = outline.exterior.len(),
        "Normalized outline"
    );

    let walls = label_walls(&raster.rgb, &config.wall_mask);
    let windows = detect_windows(&walls, &frame, outline, &config.windows)?;
    let door = detect_balcony_door(&walls, &frame, outline, &config.balcony_door)?;
    let balcony = detect_balcony_polygon(&raster.rgb, &frame, &config.balcony);

    let water: Vec<Point2D> = if config.enrich_water_points {
        let zones = classify_zones(&raster.rgb, &config.zones, config.zones.seed);
        water_points(&zones, raster.height(), frame.scale)
            .iter()
            .map(|p| frame.to_plan(p.x_px, p.y_px))
            .collect()
    } else {
        Vec::new()
    };

    info!(
        windows = windows.len(),
        balcony = balcony.is_some(),
        water_points = water.len(),
        "Detected plan features"
    );

    let doors = [door];
    Ok(assemble_plan(
        &PlanParts {
            outline,
            windows: &windows,
            doors: &doors,
            balcony: balcony.as_ref(),
            water_points: &water,
        },
        config,
    ))
}

/// Load a drawing from disk and run [`extract_plan`]
pub fn extract_plan_from_path(path: impl AsRef<Path>, config: &PlanConfig) -> Result<PlanDocument> {
    let raster = load_raster(path, &config.ink)?;
    extract_plan(&raster, config)
}
