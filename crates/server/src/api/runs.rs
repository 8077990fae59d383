//! Run control API handlers.

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use picgrab_core::RunRequest;

use crate::runs::{RunControlError, RunStatus};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Optional per-run overrides of the configured defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StartRunBody {
    pub api_url: Option<String>,
    pub start_page: Option<u32>,
    pub page_size: Option<u32>,
    pub download_dir: Option<PathBuf>,
    pub browser_path: Option<PathBuf>,
}

impl StartRunBody {
    pub fn apply(self, mut request: RunRequest) -> RunRequest {
        if let Some(api_url) = self.api_url {
            request.api_url = api_url;
        }
        if let Some(start_page) = self.start_page {
            request.start_page = start_page;
        }
        if let Some(page_size) = self.page_size {
            request.page_size = page_size;
        }
        if let Some(download_dir) = self.download_dir {
            request.download_dir = download_dir;
        }
        if let Some(browser_path) = self.browser_path {
            request.browser_path = browser_path;
        }
        request
    }
}

#[derive(Debug, Serialize)]
pub struct RunStartedResponse {
    pub run_id: Uuid,
    pub request: RunRequest,
}

#[derive(Debug, Serialize)]
pub struct RunCancelledResponse {
    pub run_id: Uuid,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, error: &RunControlError) -> ApiError {
    let run_id = match error {
        RunControlError::AlreadyRunning { run_id } => Some(*run_id),
        _ => None,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            run_id,
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Start a run. An empty body runs with the configured defaults.
pub async fn start_run(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<RunStartedResponse>), ApiError> {
    let overrides = if body.iter().all(u8::is_ascii_whitespace) {
        StartRunBody::default()
    } else {
        serde_json::from_slice::<StartRunBody>(&body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("invalid request body: {}", e),
                    run_id: None,
                }),
            )
        })?
    };

    let request = overrides.apply(state.default_run_request());

    match state.runs().start(request.clone()).await {
        Ok(run_id) => Ok((
            StatusCode::ACCEPTED,
            Json(RunStartedResponse { run_id, request }),
        )),
        Err(e @ RunControlError::AlreadyRunning { .. }) => {
            Err(error_response(StatusCode::CONFLICT, &e))
        }
        Err(e) => Err(error_response(StatusCode::BAD_REQUEST, &e)),
    }
}

/// Ask the active run to stop.
pub async fn cancel_run(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RunCancelledResponse>, ApiError> {
    match state.runs().cancel().await {
        Ok(run_id) => Ok(Json(RunCancelledResponse {
            run_id,
            message: "Stop requested".to_string(),
        })),
        Err(e) => Err(error_response(StatusCode::NOT_FOUND, &e)),
    }
}

/// Current run state and the outcome of the last run.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<RunStatus> {
    Json(state.runs().status().await)
}
