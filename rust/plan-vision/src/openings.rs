// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Window and balcony-door detection
//!
//! The dark wall-hatching mask is labelled once with [`label_walls`]; both
//! detectors pick components from those labels by size and position. A detected component is placed on the plan by projecting
//! its bounding-box centre onto the nearest edge of the normalized outline.

use crate::components::{label_components, ComponentLabels, ConnectedComponent};
use crate::config::{BalconyDoorConfig, WallMaskConfig, WindowConfig};
use crate::error::{PlanError, Result};
use crate::frame::PlanFrame;
use crate::raster::wall_mask;
use flatplan_geometry::{project_onto_ring, Point2D, Polygon};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

/// A door or window positioned along the outline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedOpening {
    pub id: String,
    /// Nearest outline edge, a consecutive vertex pair
    pub edge: (Point2D, Point2D),
    /// Arc-length from `edge.0` to the projected centre
    pub offset: f64,
    pub width: f64,
    pub height: f64,
    pub sill_height: Option<f64>,
    pub swing: Option<String>,
    pub hinge: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Placement of a component on the outline, before ids and defaults
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    edge: (Point2D, Point2D),
    offset: f64,
    width: f64,
}

fn place_component(
    component: &ConnectedComponent,
    frame: &PlanFrame,
    outline: &Polygon,
) -> Result<Placement> {
    let (cx, cy) = component.bbox.center();
    let center = frame.to_plan(cx, cy);
    let projection = project_onto_ring(&center, &outline.exterior)?;

    Ok(Placement {
        edge: projection.edge,
        offset: projection.offset,
        width: frame.length_mm(component.bbox.pixel_width() as f64),
    })
}

fn is_window_candidate(component: &ConnectedComponent, image_height: u32, config: &WindowConfig) -> bool {
    let band_top = image_height.saturating_sub(config.bottom_band_px);
    (config.min_area..=config.max_area).contains(&component.area)
        && component.bbox.min_y >= band_top
        && component.bbox.span_y() <= config.max_height_px
        && component.bbox.span_x() >= config.min_width_px
}

fn is_door_candidate(component: &ConnectedComponent, config: &BalconyDoorConfig) -> bool {
    (config.min_area..=config.max_area).contains(&component.area)
        && component.bbox.min_y <= config.top_band_px
        && component.bbox.span_x() >= config.min_side_px
        && component.bbox.span_y() >= config.min_side_px
}

/// Connected components of the wall-hatching mask
pub fn label_walls(rgb: &RgbImage, config: &WallMaskConfig) -> ComponentLabels {
    label_components(&wall_mask(rgb, config.max_gray))
}

/// Detect windows along the bottom wall of the drawing.
///
/// Windows are thin horizontal wall-mask components inside the bottom band.
/// The result is ordered by offset and numbered `window_1, window_2, ...` in
/// that order.
pub fn detect_windows(
    walls: &ComponentLabels,
    frame: &PlanFrame,
    outline: &Polygon,
    config: &WindowConfig,
) -> Result<Vec<DetectedOpening>> {
    let image_height = walls.labels.height();
    let mut placements = walls
        .components
        .iter()
        .filter(|c| is_window_candidate(c, image_height, config))
        .map(|c| place_component(c, frame, outline))
        .collect::<Result<Vec<_>>>()?;

    // Stable: equal offsets keep scan order
    placements.sort_by(|a, b| a.offset.partial_cmp(&b.offset).unwrap_or(Ordering::Equal));

    let windows: Vec<DetectedOpening> = placements
        .into_iter()
        .enumerate()
        .map(|(idx, p)| DetectedOpening {
            id: format!("window_{}", idx + 1),
            edge: p.edge,
            offset: p.offset,
            width: p.width,
            height: config.height_mm,
            sill_height: Some(config.sill_height_mm),
            swing: None,
            hinge: None,
            from: None,
            to: None,
        })
        .collect();

    debug!(
        wall_components = walls.len(),
        windows = windows.len(),
        "Window detection"
    );
    Ok(windows)
}

/// Detect the door leading onto the balcony.
///
/// Takes the first wall-mask component in scan order that is large enough in
/// both directions and starts near the top of the drawing.
pub fn detect_balcony_door(
    walls: &ComponentLabels,
    frame: &PlanFrame,
    outline: &Polygon,
    config: &BalconyDoorConfig,
) -> Result<DetectedOpening> {
    let component = walls
        .components
        .iter()
        .find(|c| is_door_candidate(c, config))
        .ok_or_else(|| {
            PlanError::extraction(format!(
                "no wall component matches the balcony door ({} candidates, area {}..={}, top band {} px)",
                walls.len(),
                config.min_area,
                config.max_area,
                config.top_band_px
            ))
        })?;

    let placement = place_component(component, frame, outline)?;
    info!(
        component = component.id,
        offset = placement.offset,
        width = placement.width,
        "Detected balcony door"
    );

    Ok(DetectedOpening {
        id: config.id.clone(),
        edge: placement.edge,
        offset: placement.offset,
        width: placement.width,
        height: config.height_mm,
        sill_height: None,
        swing: Some(config.swing.clone()),
        hinge: Some(config.hinge.clone()),
        from: Some(config.from.clone()),
        to: Some(config.to.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;

    const INK: Rgb<u8> = Rgb([0, 0, 0]);

    fn blank(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
    }

    fn walls(img: &RgbImage) -> ComponentLabels {
        label_walls(img, &WallMaskConfig::default())
    }

    fn fill(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                img.put_pixel(x, y, INK);
            }
        }
    }

    /// 200x200 mm square outline, frame origin at pixel (0, 0), 1 mm/px
    fn square_setup(image_height: u32) -> (PlanFrame, Polygon) {
        let frame = PlanFrame::new(Point2D::new(0.0, 0.0), 1.0, image_height);
        let outline = Polygon::from_shell(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(200.0, 0.0),
            Point2D::new(200.0, 200.0),
            Point2D::new(0.0, 200.0),
        ]);
        (frame, outline)
    }

    #[test]
    fn test_window_in_bottom_band() {
        let mut img = blank(200, 200);
        // 40x10 px, bottom row 40 px above the image bottom
        fill(&mut img, 80, 150, 119, 159);
        let (frame, outline) = square_setup(200);

        let windows = detect_windows(&walls(&img), &frame, &outline, &WindowConfig::default())
            .unwrap();

        assert_eq!(windows.len(), 1);
        let w = &windows[0];
        assert_eq!(w.id, "window_1");
        assert_relative_eq!(w.width, 40.0);
        assert_relative_eq!(w.height, 1570.0);
        assert_eq!(w.sill_height, Some(480.0));
        // Centre (99.5, 154.5) -> plan (99.5, 45.5), nearest the bottom edge
        assert_eq!(w.edge, (Point2D::new(0.0, 0.0), Point2D::new(200.0, 0.0)));
        assert_relative_eq!(w.offset, 99.5);
    }

    #[test]
    fn test_windows_outside_band_or_too_tall_are_ignored() {
        let mut img = blank(200, 200);
        // Too high up
        fill(&mut img, 20, 60, 59, 69);
        // In the band but taller than 15 px
        fill(&mut img, 100, 160, 119, 185);
        let (frame, outline) = square_setup(200);

        let windows = detect_windows(&walls(&img), &frame, &outline, &WindowConfig::default())
            .unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn test_windows_numbered_by_offset() {
        let mut img = blank(200, 200);
        // Scan order: the right window's top row comes first
        fill(&mut img, 150, 170, 179, 175);
        fill(&mut img, 20, 180, 49, 185);
        let (frame, outline) = square_setup(200);

        let windows = detect_windows(&walls(&img), &frame, &outline, &WindowConfig::default())
            .unwrap();

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].id, "window_1");
        assert_eq!(windows[1].id, "window_2");
        assert!(windows[0].offset < windows[1].offset);
        assert_relative_eq!(windows[0].offset, 34.5);
    }

    #[test]
    fn test_balcony_door_first_candidate() {
        let mut img = blank(200, 200);
        // Hollow 30x30 frame near the top: 116 px
        fill(&mut img, 60, 10, 89, 10);
        fill(&mut img, 60, 39, 89, 39);
        fill(&mut img, 60, 10, 60, 39);
        fill(&mut img, 89, 10, 89, 39);
        // A second candidate later in scan order
        fill(&mut img, 120, 40, 149, 69);
        let (frame, outline) = square_setup(200);

        let door = detect_balcony_door(&walls(&img), &frame, &outline, &BalconyDoorConfig::default())
            .unwrap();

        // The hollow frame is below the area minimum, so the solid block wins
        assert_relative_eq!(door.width, 30.0);
        assert_eq!(door.id, "door_balcony_1");
        assert_eq!(door.swing.as_deref(), Some("out"));
        assert_eq!(door.hinge.as_deref(), Some("right"));
        assert_eq!(door.from.as_deref(), Some("z_main"));
        assert_eq!(door.to.as_deref(), Some("balcony_1"));
        assert_relative_eq!(door.height, 2040.0);
        assert!(door.sill_height.is_none());
    }

    #[test]
    fn test_windows_and_door_share_wall_labels() {
        let mut img = blank(200, 200);
        fill(&mut img, 80, 150, 119, 159);
        fill(&mut img, 120, 40, 149, 69);
        let (frame, outline) = square_setup(200);

        let labels = walls(&img);
        assert_eq!(labels.len(), 2);

        let windows = detect_windows(&labels, &frame, &outline, &WindowConfig::default()).unwrap();
        let door =
            detect_balcony_door(&labels, &frame, &outline, &BalconyDoorConfig::default()).unwrap();

        assert_eq!(windows.len(), 1);
        assert_relative_eq!(windows[0].width, 40.0);
        assert_relative_eq!(door.width, 30.0);
    }

    #[test]
    fn test_missing_balcony_door_is_extraction_failure() {
        let img = blank(200, 200);
        let (frame, outline) = square_setup(200);

        let err = detect_balcony_door(&walls(&img), &frame, &outline, &BalconyDoorConfig::default())
            .unwrap_err();
        assert!(err.is_extraction_failure());
    }

    #[test]
    fn test_degenerate_outline_fails_projection() {
        let mut img = blank(200, 200);
        fill(&mut img, 80, 150, 119, 159);
        let frame = PlanFrame::new(Point2D::new(0.0, 0.0), 1.0, 200);
        let outline = Polygon {
            exterior: vec![Point2D::new(0.0, 0.0)],
            interiors: vec![],
        };

        let err = detect_windows(&walls(&img), &frame, &outline, &WindowConfig::default())
            .unwrap_err();
        assert!(err.is_extraction_failure());
    }
}
