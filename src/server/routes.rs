//! Route handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::ServerState;
use crate::{
    language::Language,
    protocol::{ErrorResponse, VisualizationKind, VisualizeResponse},
};

pub const MISSING_FIELDS_MESSAGE: &str = "Code and language are required";
pub const BAD_LANGUAGE_MESSAGE: &str = "Language must be either \"python\" or \"r\"";

/// Handler for GET /api/health
pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Handler for POST /api/visualize
pub async fn visualize_handler(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let (code, language) = match (
        payload.get("code").and_then(Value::as_str),
        payload.get("language"),
    ) {
        (Some(code), Some(language)) => (code, language),
        _ => return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS_MESSAGE),
    };
    let Ok(language) = serde_json::from_value::<Language>(language.clone()) else {
        return error_response(StatusCode::BAD_REQUEST, BAD_LANGUAGE_MESSAGE);
    };

    let kind = detect_kind(code, language);
    let file_name = kind.file_name();
    let id = Uuid::new_v4().to_string();
    let output_dir = state.visualizations_dir.join(&id);

    if let Err(e) = tokio::fs::create_dir_all(&output_dir).await {
        error!(dir = %output_dir.display(), error = %e, "failed to create visualization directory");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    match state.runner.run(code, language, &output_dir, file_name).await {
        Ok(result) if result.success => {
            info!(viz_id = %id, %language, ?kind, "visualization generated");
            let body = VisualizeResponse {
                success: true,
                visualization_url: format!("/visualizations/{}/{}", id, file_name),
                viz_id: Some(id),
                kind: Some(kind),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(result) => {
            warn!(viz_id = %id, exit_code = ?result.exit_code, "script produced no visualization");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, result.failure_message())
        }
        Err(e) => {
            let message = format!("{:#}", e);
            error!(viz_id = %id, error = %message, "visualization run failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

/// Handler for GET /visualizations/{id}/{file}
pub async fn artifact_handler(
    State(state): State<Arc<ServerState>>,
    Path((id, file)): Path<(String, String)>,
    request: Request,
) -> Response {
    let valid_name = !file.is_empty()
        && !file.starts_with('.')
        && !file.contains(['/', '\\']);
    if Uuid::parse_str(&id).is_err() || !valid_name {
        warn!(%id, %file, "rejected artifact path");
        return StatusCode::NOT_FOUND.into_response();
    }

    // ServeFile picks the content type from the extension and answers 404 itself.
    let path = state.visualizations_dir.join(&id).join(&file);
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

/// Choose the artifact kind from the libraries the code mentions.
pub fn detect_kind(code: &str, language: Language) -> VisualizationKind {
    if code.contains("plotly") {
        return VisualizationKind::Interactive;
    }
    match language {
        Language::R if code.contains("rgl") => VisualizationKind::ThreeD,
        _ => VisualizationKind::Static,
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}
