// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for plan extraction

use std::path::PathBuf;
use thiserror::Error;

/// Result type for plan extraction
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors raised by the extraction pipeline.
///
/// `Extraction` is the semantic failure: the heuristics found nothing usable
/// in an otherwise readable drawing. Everything else is an I/O or input error.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Cannot load image '{path}': {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Plan extraction failed: {0}")]
    Extraction(String),

    #[error("Plan extraction failed: {0}")]
    Geometry(#[from] flatplan_geometry::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot encode image: {0}")]
    ImageEncode(#[source] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlanError {
    pub fn extraction(message: impl Into<String>) -> Self {
        PlanError::Extraction(message.into())
    }

    /// Whether this is a heuristic failure rather than an I/O or input error
    pub fn is_extraction_failure(&self) -> bool {
        matches!(self, PlanError::Extraction(_) | PlanError::Geometry(_))
    }
}
