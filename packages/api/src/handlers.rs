use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scenebox_preview::{LocalPushRequest, PreviewError, PreviewRequest};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

/// Error response carrying the descriptive message from the failing layer.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl ToString) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<PreviewError> for ApiError {
    fn from(err: PreviewError) -> Self {
        let status = if err.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            match &err {
                PreviewError::Provider(_) | PreviewError::SandboxStopped { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        };

        if status.is_server_error() {
            error!(%err, "request failed");
        }
        ApiError::new(status, err)
    }
}

impl From<scenebox_sandbox::ProviderError> for ApiError {
    fn from(err: scenebox_sandbox::ProviderError) -> Self {
        ApiError::from(PreviewError::Provider(err))
    }
}

/// Liveness endpoint for load balancers and the admin tooling.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocateBody {
    pub user_id: Option<String>,
    pub template_id: Option<String>,
    pub template_name: Option<String>,
}

/// Allocate (or reuse) a sandbox for a caller.
pub async fn create_sandbox(
    State(state): State<AppState>,
    Json(body): Json<AllocateBody>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .allocator
        .allocate(scenebox_sandbox::AllocateRequest {
            user_id: body.user_id,
            template_id: body.template_id,
            template_name: body.template_name,
            studio_port: None,
        })
        .await?;

    info!(sandbox_id = %result.sandbox_id, "sandbox allocated via API");
    Ok((StatusCode::CREATED, Json(result)))
}

/// Lifecycle status for a sandbox (currently an `unknown` stub).
pub async fn get_sandbox_status(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Json<scenebox_sandbox::StatusResult> {
    Json(state.allocator.status(&id).await)
}

/// Release a sandbox. Unknown ids succeed as a no-op.
pub async fn delete_sandbox(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.allocator.destroy(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The preview orchestration call: compile, deploy, expose, optionally wait.
pub async fn create_preview(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.flow.create_preview(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Write the compiled file set to a host path, skipping the sandbox.
pub async fn local_push(
    State(state): State<AppState>,
    Json(request): Json<LocalPushRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.pusher.push(request).await?;
    Ok((StatusCode::CREATED, Json(report)))
}
