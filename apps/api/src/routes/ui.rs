use axum::{extract::Path, Json};
use serde::Deserialize;

use super::extract::CurrentWorkspace;
use crate::errors::AppError;
use crate::resolver::extract_video_id;
use crate::view::View;
use crate::workspace::slices::{UiAction, UiSlice};

#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    pub view: View,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub search: String,
}

/// GET /api/v1/ui
pub async fn handle_get_ui(CurrentWorkspace(workspace): CurrentWorkspace) -> Json<UiSlice> {
    Json(workspace.ui())
}

/// PUT /api/v1/ui/view
pub async fn handle_set_view(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Json(req): Json<ViewRequest>,
) -> Json<UiSlice> {
    workspace.dispatch_ui(UiAction::SetView(req.view));
    Json(workspace.ui())
}

/// PUT /api/v1/ui/search
pub async fn handle_set_search(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Json(req): Json<SearchRequest>,
) -> Json<UiSlice> {
    workspace.dispatch_ui(UiAction::SetSearch(req.search));
    Json(workspace.ui())
}

/// POST /api/v1/player/:video_id
///
/// Opens the embedded player. Only well-formed 11-character ids are accepted.
pub async fn handle_open_player(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Path(video_id): Path<String>,
) -> Result<Json<UiSlice>, AppError> {
    let canonical = format!("https://youtu.be/{video_id}");
    if extract_video_id(&canonical).as_deref() != Some(video_id.as_str()) {
        return Err(AppError::Validation(format!("'{video_id}' is not a video id")));
    }

    workspace.dispatch_ui(UiAction::OpenPlayer(video_id));
    Ok(Json(workspace.ui()))
}

/// DELETE /api/v1/player
pub async fn handle_close_player(CurrentWorkspace(workspace): CurrentWorkspace) -> Json<UiSlice> {
    workspace.dispatch_ui(UiAction::ClosePlayer);
    Json(workspace.ui())
}
