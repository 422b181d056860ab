// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tunable constants of the extraction pipeline
//!
//! Every threshold the detectors use lives here so a new drawing style can be
//! handled by editing a JSON file. Defaults match the line-art plans the
//! pipeline was tuned on.

use crate::error::{PlanError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlanConfig {
    pub calibration: CalibrationConfig,
    pub ink: InkConfig,
    pub outline: OutlineConfig,
    pub wall_mask: WallMaskConfig,
    pub windows: WindowConfig,
    pub balcony_door: BalconyDoorConfig,
    pub balcony: BalconyConfig,
    pub zones: ZoneConfig,
    pub document: DocumentConfig,
    /// Run the colour zone classifier on the plan image and emit water points
    pub enrich_water_points: bool,
}

impl PlanConfig {
    /// Load a configuration from a JSON file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: PlanConfig = serde_json::from_str(&text).map_err(|e| {
            PlanError::Config(format!("{}: {}", path.display(), e))
        })?;
        config.calibration.scale_mm_per_px()?;
        Ok(config)
    }
}

/// Known dimension from the source drawing, e.g. "1410 mm spans 166 px".
///
/// This is an external calibration input confirmed by a human (or OCR) per
/// drawing, never derived from image content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Reference length in millimetres
    pub reference_mm: f64,
    /// The same length measured in pixels
    pub reference_px: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            reference_mm: 1410.0,
            reference_px: 166.0,
        }
    }
}

impl CalibrationConfig {
    pub fn new(reference_mm: f64, reference_px: f64) -> Self {
        Self {
            reference_mm,
            reference_px,
        }
    }

    /// Uniform scale factor in millimetres per pixel
    pub fn scale_mm_per_px(&self) -> Result<f64> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(self.reference_mm) || !valid(self.reference_px) {
            return Err(PlanError::Config(format!(
                "calibration needs positive lengths, got {} mm over {} px",
                self.reference_mm, self.reference_px
            )));
        }
        Ok(self.reference_mm / self.reference_px)
    }
}

/// Ink mask: pixels darker than near-white on every channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InkConfig {
    /// A pixel is ink when all three channels are below this value
    pub near_white_threshold: u8,
}

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            near_white_threshold: 240,
        }
    }
}

/// Outline extraction and normalization
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutlineConfig {
    /// Contours with fewer points are noise
    pub min_contour_points: usize,
    /// Contours enclosing less area (px²) are stray marks or text
    pub min_area_px: f64,
    /// Simplification tolerance applied in millimetre space
    pub simplify_tolerance_mm: f64,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            min_contour_points: 40,
            min_area_px: 500.0,
            simplify_tolerance_mm: 0.8,
        }
    }
}

/// Wall mask: dark hatching lines on the grayscale (channel mean) image
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WallMaskConfig {
    /// A pixel is wall when its gray value is below this
    pub max_gray: f64,
}

impl Default for WallMaskConfig {
    fn default() -> Self {
        Self { max_gray: 80.0 }
    }
}

/// Window heuristics (thin components along the bottom exterior wall)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub min_area: u32,
    pub max_area: u32,
    /// Maximum bbox height (y1 - y0) in pixels
    pub max_height_px: u32,
    /// Minimum bbox width (x1 - x0) in pixels
    pub min_width_px: u32,
    /// Component top must lie within this many pixels of the image bottom
    pub bottom_band_px: u32,
    pub height_mm: f64,
    pub sill_height_mm: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            min_area: 30,
            max_area: 600,
            max_height_px: 15,
            min_width_px: 10,
            bottom_band_px: 50,
            height_mm: 1570.0,
            sill_height_mm: 480.0,
        }
    }
}

/// Balcony door heuristics and the door's fixed attributes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BalconyDoorConfig {
    pub min_area: u32,
    pub max_area: u32,
    /// Component top must lie within this many pixels of the image top
    pub top_band_px: u32,
    /// Minimum bbox width and height (x1 - x0, y1 - y0) in pixels
    pub min_side_px: u32,
    pub id: String,
    pub height_mm: f64,
    pub swing: String,
    pub hinge: String,
    pub from: String,
    pub to: String,
}

impl Default for BalconyDoorConfig {
    fn default() -> Self {
        Self {
            min_area: 150,
            max_area: 4000,
            top_band_px: 150,
            min_side_px: 20,
            id: "door_balcony_1".into(),
            height_mm: 2040.0,
            swing: "out".into(),
            hinge: "right".into(),
            from: "z_main".into(),
            to: "balcony_1".into(),
        }
    }
}

/// Balcony polygon: a fill of known colour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BalconyConfig {
    pub target_rgb: [u8; 3],
    /// Pixels closer than this (RGB euclidean) to the target are balcony fill
    pub color_tolerance: f64,
    pub min_area: u32,
    pub max_area: u32,
    pub simplify_tolerance_mm: f64,
    pub id: String,
    pub name: String,
}

impl Default for BalconyConfig {
    fn default() -> Self {
        Self {
            target_rgb: [193, 176, 213],
            color_tolerance: 30.0,
            min_area: 4000,
            max_area: 7000,
            simplify_tolerance_mm: 5.0,
            id: "balcony_1".into(),
            name: "Loggia".into(),
        }
    }
}

/// Colour clustering and component classification for rendered plan pages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZoneConfig {
    /// Upper bound on sampled pixels
    pub max_samples: usize,
    /// Number of colour clusters
    pub clusters: usize,
    /// Independent k-means runs; the lowest inertia wins
    pub restarts: usize,
    pub max_iterations: usize,
    /// Stop when the summed squared centre shift of an iteration is at most
    /// this fraction of the mean per-channel colour variance
    pub convergence: f64,
    /// Clusters brighter than this (channel mean) are paper background
    pub background_brightness: f64,
    /// Clusters darker than this (channel mean) are annotation ink
    pub ink_brightness: f64,
    /// Clusters holding less than this share of the sample are ignored
    pub min_cluster_share: f64,
    /// Percentile of in-cluster distances used as the colour tolerance
    pub tolerance_percentile: f64,
    pub min_tolerance: f64,
    pub max_tolerance: f64,
    /// Components smaller than this (px) are discarded
    pub min_component_area: u32,
    /// Components whose bottom lies this close to the image bottom are legend
    pub bottom_margin_px: u32,
    /// Components larger than this are the main living area
    pub main_area_threshold: u32,
    /// Inclusive area range of balconies (touching the mask extent)
    pub balcony_area: [u32; 2],
    /// Inclusive area range of wet areas (not touching the mask extent)
    pub wet_area: [u32; 2],
    /// Distance from the colour-mask extent that counts as touching it
    pub edge_margin_px: u32,
    /// Douglas-Peucker tolerance for overlay contours (px)
    pub contour_simplify_px: f64,
    /// Millimetres per pixel of a rendered page
    pub page_mm_per_px: f64,
    pub ceiling_height_m: f64,
    /// Seed for pixel sampling and cluster initialisation
    pub seed: u64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            max_samples: 200_000,
            clusters: 6,
            restarts: 3,
            max_iterations: 300,
            convergence: 1e-4,
            background_brightness: 245.0,
            ink_brightness: 40.0,
            min_cluster_share: 0.01,
            tolerance_percentile: 95.0,
            min_tolerance: 12.0,
            max_tolerance: 45.0,
            min_component_area: 200,
            bottom_margin_px: 50,
            main_area_threshold: 6000,
            balcony_area: [500, 6000],
            wet_area: [600, 6000],
            edge_margin_px: 2,
            contour_simplify_px: 2.0,
            // Pages rendered at 2x of 72 dpi
            page_mm_per_px: 25.4 / 144.0,
            ceiling_height_m: 2.6,
            seed: 0,
        }
    }
}

/// Entrance door: a known constant of the drawing convention, not detected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EntranceConfig {
    pub id: String,
    pub edge: [[f64; 2]; 2],
    pub offset: f64,
    pub width: f64,
    pub height: f64,
    pub swing: String,
    pub hinge: String,
    pub from: String,
    pub to: String,
}

impl Default for EntranceConfig {
    fn default() -> Self {
        Self {
            id: "door_entrance".into(),
            edge: [[0.0, 123.2], [0.0, 1813.5]],
            offset: 900.0,
            width: 900.0,
            height: 2040.0,
            swing: "in".into(),
            hinge: "left".into(),
            from: "exterior".into(),
            to: "z_main".into(),
        }
    }
}

/// Fixed parts of the plan document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentConfig {
    pub entrance: EntranceConfig,
    pub main_zone_id: String,
    pub main_zone_name: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            entrance: EntranceConfig::default(),
            main_zone_id: "z_main".into(),
            main_zone_name: "Living area".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_scale() {
        let scale = CalibrationConfig::default().scale_mm_per_px().unwrap();
        assert_relative_eq!(scale, 1410.0 / 166.0);
    }

    #[test]
    fn test_invalid_calibration() {
        assert!(CalibrationConfig::new(100.0, 0.0).scale_mm_per_px().is_err());
        assert!(CalibrationConfig::new(-5.0, 10.0).scale_mm_per_px().is_err());
        assert!(CalibrationConfig::new(f64::NAN, 10.0).scale_mm_per_px().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "calibration": { "reference_mm": 100.0, "reference_px": 50.0 },
                        "windows": { "height_mm": 1400.0 } }"#;
        let config: PlanConfig = serde_json::from_str(json).unwrap();

        assert_relative_eq!(config.calibration.scale_mm_per_px().unwrap(), 2.0);
        assert_relative_eq!(config.windows.height_mm, 1400.0);
        assert_relative_eq!(config.windows.sill_height_mm, 480.0);
        assert_eq!(config.outline.min_contour_points, 40);
        assert_eq!(config.zones.clusters, 6);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, r#"{ "zones": { "seed": 7 } }"#).unwrap();

        let config = PlanConfig::from_file(&path).unwrap();
        assert_eq!(config.zones.seed, 7);
        assert_eq!(config.calibration, CalibrationConfig::default());
    }
}
