use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::extract::CurrentWorkspace;
use crate::errors::AppError;
use crate::state::AppState;
use crate::workspace::slices::SessionSlice;
use crate::workspace::Workspace;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub workspace_id: Uuid,
    pub session: SessionSlice,
}

/// POST /api/v1/session
///
/// Opens a workspace for this page load and starts anonymous sign-in. The
/// response comes back while the session is still loading.
pub async fn handle_start_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let workspace = Workspace::new(state.metadata.clone());
    state.workspaces.insert(workspace.clone()).await;
    workspace.bootstrap(state.backend().map(|b| b.sessions()));
    info!("Opened workspace {}", workspace.id);

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            workspace_id: workspace.id,
            session: workspace.session(),
        }),
    ))
}

/// GET /api/v1/session
pub async fn handle_get_session(CurrentWorkspace(workspace): CurrentWorkspace) -> Json<SessionResponse> {
    Json(SessionResponse {
        workspace_id: workspace.id,
        session: workspace.session(),
    })
}

/// DELETE /api/v1/session
///
/// Closes the workspace and signs its anonymous identity out.
pub async fn handle_end_session(
    State(state): State<AppState>,
    CurrentWorkspace(workspace): CurrentWorkspace,
) -> StatusCode {
    state.workspaces.remove(workspace.id).await;

    if let (Some(backend), Some(uid)) = (state.backend(), workspace.session().uid) {
        if let Err(e) = backend.sessions().sign_out(uid).await {
            warn!("Sign-out failed for {uid}: {e}");
        }
    }

    info!("Closed workspace {}", workspace.id);
    StatusCode::NO_CONTENT
}
