// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SVG overlays for reviewing zone classification
//!
//! The page image is embedded as a base64 PNG and the classified areas are
//! drawn on top in page pixel coordinates.

use crate::error::{PlanError, Result};
use crate::zones::WaterPoint;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flatplan_geometry::Point2D;
use image::{ImageFormat, RgbImage};
use std::fmt::Write as _;
use std::io::Cursor;

const STYLE: &str = "\
      .main-area { fill: rgba(240, 100, 120, 0.35); stroke: #ff6f91; stroke-width: 2; }
      .balcony-area { fill: rgba(66, 135, 245, 0.35); stroke: #1d68d0; stroke-width: 2; }
      .water-point { fill: #008080; stroke: white; stroke-width: 1.5; }";

const WATER_POINT_RADIUS: f64 = 6.0;

/// PNG-encode an image and wrap it in base64
pub fn encode_png_base64(rgb: &RgbImage) -> Result<String> {
    let mut bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(PlanError::ImageEncode)?;
    Ok(STANDARD.encode(bytes))
}

/// SVG path data for a closed ring in pixel coordinates
pub fn ring_path(ring: &[Point2D]) -> String {
    let points: Vec<String> = ring.iter().map(|p| format!("{:.2},{:.2}", p.x, p.y)).collect();
    format!("M {} Z", points.join(" L "))
}

/// Layers drawn over the page image
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayLayers<'a> {
    pub main_areas: &'a [Vec<Point2D>],
    pub balcony_areas: &'a [Vec<Point2D>],
    pub water_points: &'a [WaterPoint],
}

fn write_group(svg: &mut String, id: &str, class: &str, rings: &[Vec<Point2D>]) {
    if rings.is_empty() {
        return;
    }
    let _ = writeln!(svg, "  <g id=\"{}\" class=\"{}\">", id, class);
    for ring in rings {
        let _ = writeln!(svg, "    <path d=\"{}\" />", ring_path(ring));
    }
    svg.push_str("  </g>\n");
}

/// Render the overlay document
pub fn render_svg(width: u32, height: u32, png_base64: &str, layers: &OverlayLayers<'_>) -> String {
    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = width,
        h = height
    );
    let _ = writeln!(svg, "  <defs>\n    <style>\n{}\n    </style>\n  </defs>", STYLE);
    let _ = writeln!(
        svg,
        "  <image width=\"{}\" height=\"{}\" href=\"data:image/png;base64,{}\" />",
        width, height, png_base64
    );

    write_group(&mut svg, "main-areas", "main-area", layers.main_areas);
    write_group(&mut svg, "balcony-areas", "balcony-area", layers.balcony_areas);

    if !layers.water_points.is_empty() {
        svg.push_str("  <g id=\"water-points\">\n");
        for p in layers.water_points {
            let _ = writeln!(
                svg,
                "    <circle class=\"water-point\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" />",
                p.x_px, p.y_px, WATER_POINT_RADIUS
            );
        }
        svg.push_str("  </g>\n");
    }

    svg.push_str("</svg>");
    svg
}
