use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Service status. `degraded` means the backend is missing and no workspace can
/// finish signing in.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let backend = state.backend.is_some();
    Json(json!({
        "status": if backend { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "service": "recipebox",
        "backend": backend,
        "missingConfig": state.config.missing_backend_vars,
        "metadata": state.metadata.is_some(),
        "workspaces": state.workspaces.len().await,
    }))
}
