//! Wire types for `POST /api/visualize`.

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Request body sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizeRequest {
    pub code: String,
    pub language: Language,
}

/// Kind of artifact the service produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationKind {
    Static,
    Interactive,
    #[serde(rename = "3d")]
    ThreeD,
}

impl VisualizationKind {
    /// Artifact file name written into the visualization directory.
    pub fn file_name(self) -> &'static str {
        match self {
            VisualizationKind::Static => "visualization.png",
            VisualizationKind::Interactive | VisualizationKind::ThreeD => "visualization.html",
        }
    }
}

/// Successful response body.
///
/// Only `visualizationUrl` is required; the other fields are informational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viz_id: Option<String>,
    /// Server-relative path to the rendered artifact.
    pub visualization_url: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<VisualizationKind>,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}
