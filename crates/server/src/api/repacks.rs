//! Repack index API handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use repackhub_core::{IndexError, IndexStatus, SearchResponse};

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    /// Wait for the build to finish instead of returning immediately.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    /// Correlation token echoed back in the response; generated if absent.
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IndexStatusResponse {
    #[serde(flatten)]
    pub index: IndexStatus,
    /// Rows currently in the persisted collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_repacks: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Map an index error to its HTTP status.
pub fn error_status(error: &IndexError) -> StatusCode {
    match error {
        IndexError::NotBuilt => StatusCode::CONFLICT,
        IndexError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        IndexError::WorkerUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: IndexError) -> (StatusCode, Json<ErrorResponse>) {
    (
        error_status(&error),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/repacks/index
///
/// Rebuild the index from the repack collection. Returns 202 immediately,
/// or the build stats with `?wait=true`.
pub async fn index_repacks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IndexParams>,
) -> Response {
    let index = state.index();

    if params.wait {
        return match index.build_index().await {
            Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
            Err(e) => error_response(e).into_response(),
        };
    }

    match index.request_index().await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(SuccessResponse {
                message: "Repack indexing started".to_string(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// GET /api/v1/repacks/index/status
///
/// Index readiness plus the size of the persisted collection.
pub async fn index_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IndexStatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let index = state.index().status().await.map_err(error_response)?;

    let stored_repacks = match state.store().count() {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!("Failed to count stored repacks: {}", e);
            None
        }
    };

    Ok(Json(IndexStatusResponse {
        index,
        stored_repacks,
    }))
}

/// GET /api/v1/repacks/search
///
/// Search the live index.
pub async fn search_repacks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = params
        .request_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    state
        .index()
        .search(request_id, params.query)
        .await
        .map(Json)
        .map_err(error_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(error_status(&IndexError::NotBuilt), StatusCode::CONFLICT);
        assert_eq!(
            error_status(&IndexError::Store("x".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_status(&IndexError::WorkerUnavailable),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_status_response_flattens_index_status() {
        let response = IndexStatusResponse {
            index: IndexStatus {
                ready: true,
                records: 3,
                ..IndexStatus::default()
            },
            stored_repacks: Some(4),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ready"], true);
        assert_eq!(json["records"], 3);
        assert_eq!(json["stored_repacks"], 4);
    }
}
