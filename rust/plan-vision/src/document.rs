// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `apartment.v1` plan document
//!
//! Assembly is pure composition: no detection happens here, only rounding
//! to one decimal and filling in the fixed parts of the schema.

use crate::config::PlanConfig;
use crate::error::Result;
use crate::openings::DetectedOpening;
use flatplan_geometry::{Point2D, Polygon};
use serde::{Deserialize, Serialize};

pub const DOCUMENT_VERSION: &str = "apartment.v1";

/// Round half away from zero to one decimal place
pub fn round1(value: f64) -> f64 {
    let rounded = (value * 10.0).round() / 10.0;
    // Avoid serializing "-0.0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn round_point(p: &Point2D) -> [f64; 2] {
    [round1(p.x), round1(p.y)]
}

fn round_ring(ring: &[Point2D]) -> Vec<[f64; 2]> {
    ring.iter().map(round_point).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanDocument {
    pub version: String,
    pub units: Units,
    pub coordinate_system: CoordinateSystem,
    pub outline: OutlineShape,
    pub entrance: OpeningEntry,
    pub zones: Vec<ZoneEntry>,
    pub balconies: Vec<BalconyEntry>,
    pub openings: Openings,
    pub water_points: Vec<WaterPointEntry>,
    pub dimensions: Vec<Dimension>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Units {
    pub length: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateSystem {
    pub origin: [f64; 2],
    pub x: String,
    pub y: String,
    pub elevation_zero: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutlineShape {
    #[serde(rename = "type")]
    pub kind: String,
    pub vertices: Vec<[f64; 2]>,
}

/// A door or window as serialized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpeningEntry {
    pub id: String,
    pub edge: [[f64; 2]; 2],
    pub offset: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sill_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hinge: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl From<&DetectedOpening> for OpeningEntry {
    fn from(o: &DetectedOpening) -> Self {
        Self {
            id: o.id.clone(),
            edge: [round_point(&o.edge.0), round_point(&o.edge.1)],
            offset: round1(o.offset),
            width: round1(o.width),
            height: round1(o.height),
            sill_height: o.sill_height.map(round1),
            swing: o.swing.clone(),
            hinge: o.hinge.clone(),
            from: o.from.clone(),
            to: o.to.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneEntry {
    pub id: String,
    pub name: String,
    pub polygon: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalconyEntry {
    pub id: String,
    pub name: String,
    pub polygon: Vec<[f64; 2]>,
    pub access_door_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Openings {
    pub doors: Vec<OpeningEntry>,
    pub windows: Vec<OpeningEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaterPointEntry {
    pub id: String,
    pub point: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dimension {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub from: [f64; 2],
    pub to: [f64; 2],
    pub value: f64,
}

impl PlanDocument {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Every polygon in the document: outline, zones and balconies
    pub fn polygons(&self) -> impl Iterator<Item = &[[f64; 2]]> {
        std::iter::once(self.outline.vertices.as_slice())
            .chain(self.zones.iter().map(|z| z.polygon.as_slice()))
            .chain(self.balconies.iter().map(|b| b.polygon.as_slice()))
    }
}

/// Everything the detectors produced for one drawing
#[derive(Debug, Clone, Copy)]
pub struct PlanParts<'a> {
    /// Normalized outline in plan millimetres
    pub outline: &'a Polygon,
    pub windows: &'a [DetectedOpening],
    pub doors: &'a [DetectedOpening],
    pub balcony: Option<&'a Polygon>,
    /// Water point positions in plan millimetres
    pub water_points: &'a [Point2D],
}

/// Compose the plan document
pub fn assemble_plan(parts: &PlanParts<'_>, config: &PlanConfig) -> PlanDocument {
    let outline = round_ring(&parts.outline.exterior);
    let entrance = &config.document.entrance;

    let (width, depth) = parts
        .outline
        .bounds()
        .map(|b| (round1(b.width()), round1(b.height())))
        .unwrap_or((0.0, 0.0));

    let access_door_id = parts
        .doors
        .first()
        .map(|d| d.id.clone())
        .unwrap_or_else(|| config.balcony_door.id.clone());

    PlanDocument {
        version: DOCUMENT_VERSION.to_string(),
        units: Units {
            length: "mm".to_string(),
        },
        coordinate_system: CoordinateSystem {
            origin: [0.0, 0.0],
            x: "right".to_string(),
            y: "up".to_string(),
            elevation_zero: 0.0,
        },
        outline: OutlineShape {
            kind: "Polygon".to_string(),
            vertices: outline.clone(),
        },
        entrance: OpeningEntry {
            id: entrance.id.clone(),
            edge: [
                [round1(entrance.edge[0][0]), round1(entrance.edge[0][1])],
                [round1(entrance.edge[1][0]), round1(entrance.edge[1][1])],
            ],
            offset: round1(entrance.offset),
            width: round1(entrance.width),
            height: round1(entrance.height),
            sill_height: None,
            swing: Some(entrance.swing.clone()),
            hinge: Some(entrance.hinge.clone()),
            from: Some(entrance.from.clone()),
            to: Some(entrance.to.clone()),
        },
        zones: vec![ZoneEntry {
            id: config.document.main_zone_id.clone(),
            name: config.document.main_zone_name.clone(),
            polygon: outline,
        }],
        balconies: parts
            .balcony
            .map(|polygon| BalconyEntry {
                id: config.balcony.id.clone(),
                name: config.balcony.name.clone(),
                polygon: round_ring(&polygon.exterior),
                access_door_id,
            })
            .into_iter()
            .collect(),
        openings: Openings {
            doors: parts.doors.iter().map(OpeningEntry::from).collect(),
            windows: parts.windows.iter().map(OpeningEntry::from).collect(),
        },
        water_points: parts
            .water_points
            .iter()
            .enumerate()
            .map(|(idx, p)| WaterPointEntry {
                id: format!("water_{}", idx + 1),
                point: round_point(p),
            })
            .collect(),
        dimensions: vec![
            Dimension {
                id: "overall_width".to_string(),
                kind: "linear".to_string(),
                from: [0.0, 0.0],
                to: [width, 0.0],
                value: width,
            },
            Dimension {
                id: "overall_depth".to_string(),
                kind: "linear".to_string(),
                from: [0.0, 0.0],
                to: [0.0, depth],
                value: depth,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rectangle() -> Polygon {
        Polygon::from_shell(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(300.04, 0.0),
            Point2D::new(300.04, 199.96),
            Point2D::new(0.0, 199.96),
        ])
    }

    fn window() -> DetectedOpening {
        DetectedOpening {
            id: "window_1".into(),
            edge: (Point2D::new(0.0, 0.0), Point2D::new(300.04, 0.0)),
            offset: 120.25,
            width: 40.0,
            height: 1570.0,
            sill_height: Some(480.0),
            swing: None,
            hinge: None,
            from: None,
            to: None,
        }
    }

    #[test]
    fn test_round1() {
        assert_relative_eq!(round1(1.25), 1.3);
        assert_relative_eq!(round1(-1.25), -1.3);
        assert_relative_eq!(round1(12.34), 12.3);
        assert!(round1(-0.04).is_sign_positive());
    }

    #[test]
    fn test_assemble_rectangle() {
        let outline = rectangle();
        let windows = vec![window()];
        let parts = PlanParts {
            outline: &outline,
            windows: &windows,
            doors: &[],
            balcony: None,
            water_points: &[],
        };
        let doc = assemble_plan(&parts, &PlanConfig::default());

        assert_eq!(doc.version, "apartment.v1");
        assert_eq!(doc.outline.vertices.len(), 5);
        assert_eq!(doc.outline.vertices[0], doc.outline.vertices[4]);
        assert_eq!(doc.outline.vertices[2], [300.0, 200.0]);
        assert_eq!(doc.dimensions.len(), 2);
        assert_relative_eq!(doc.dimensions[0].value, 300.0);
        assert_relative_eq!(doc.dimensions[1].value, 200.0);
        assert_eq!(doc.dimensions[1].to, [0.0, 200.0]);
        assert_eq!(doc.zones[0].polygon, doc.outline.vertices);
        assert!(doc.balconies.is_empty());
        assert!(doc.water_points.is_empty());
        assert_relative_eq!(doc.openings.windows[0].offset, 120.3);
    }

    #[test]
    fn test_json_field_names() {
        let outline = rectangle();
        let balcony = rectangle();
        let water = [Point2D::new(10.04, 20.06)];
        let parts = PlanParts {
            outline: &outline,
            windows: &[window()],
            doors: &[],
            balcony: Some(&balcony),
            water_points: &water,
        };
        let json = assemble_plan(&parts, &PlanConfig::default())
            .to_json_pretty()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["coordinateSystem"]["elevationZero"], 0.0);
        assert_eq!(value["outline"]["type"], "Polygon");
        assert_eq!(value["entrance"]["swing"], "in");
        assert_eq!(value["balconies"][0]["accessDoorId"], "door_balcony_1");
        assert_eq!(value["openings"]["windows"][0]["sillHeight"], 480.0);
        assert!(value["openings"]["windows"][0].get("swing").is_none());
        assert_eq!(value["waterPoints"][0]["id"], "water_1");
        assert_eq!(value["waterPoints"][0]["point"][1], 20.1);
        assert_eq!(value["dimensions"][0]["type"], "linear");
    }

    #[test]
    fn test_document_round_trips() {
        let outline = rectangle();
        let parts = PlanParts {
            outline: &outline,
            windows: &[],
            doors: &[],
            balcony: None,
            water_points: &[],
        };
        let doc = assemble_plan(&parts, &PlanConfig::default());
        let parsed = PlanDocument::from_json(&doc.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }
}
