// ABOUTME: HTTP API layer for Scenebox providing REST endpoints and routing
// ABOUTME: Integration layer over the allocator, preview flow, and local pusher

use axum::{
    routing::{delete, get, post},
    Router,
};
use scenebox_preview::{LocalPusher, PreviewFlow};
use scenebox_sandbox::SandboxAllocator;
use std::sync::Arc;

pub mod handlers;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub allocator: Arc<SandboxAllocator>,
    pub flow: Arc<PreviewFlow>,
    pub pusher: Arc<LocalPusher>,
}

/// Creates the full Scenebox API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/sandboxes", post(handlers::create_sandbox))
        .route("/api/sandboxes/{id}", get(handlers::get_sandbox_status))
        .route("/api/sandboxes/{id}", delete(handlers::delete_sandbox))
        .route("/api/preview", post(handlers::create_preview))
        .route("/api/local/push", post(handlers::local_push))
        .with_state(state)
}
