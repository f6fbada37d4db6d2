use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::extract::CurrentWorkspace;
use super::{outcome_response, OutcomeResponse};
use crate::actions;
use crate::errors::AppError;
use crate::models::recipe::Category;
use crate::state::AppState;
use crate::workspace::slices::DraftView;

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TagsRequest {
    pub tags: Vec<Category>,
}

/// GET /api/v1/draft
pub async fn handle_get_draft(CurrentWorkspace(workspace): CurrentWorkspace) -> Json<DraftView> {
    Json(workspace.draft().view())
}

/// POST /api/v1/draft
pub async fn handle_open_draft(CurrentWorkspace(workspace): CurrentWorkspace) -> Json<DraftView> {
    workspace.open_draft();
    Json(workspace.draft().view())
}

/// DELETE /api/v1/draft
///
/// Closes the dialog. Its fields are cleared a second later.
pub async fn handle_close_draft(CurrentWorkspace(workspace): CurrentWorkspace) -> StatusCode {
    workspace.close_draft();
    StatusCode::NO_CONTENT
}

/// PUT /api/v1/draft/url
///
/// The response carries the immediate state; the resolved title follows on the
/// `draft` event stream once the debounce window has passed.
pub async fn handle_set_url(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Json(req): Json<UrlRequest>,
) -> Json<DraftView> {
    workspace.set_draft_url(&req.url);
    Json(workspace.draft().view())
}

/// PUT /api/v1/draft/tags
pub async fn handle_set_tags(
    CurrentWorkspace(workspace): CurrentWorkspace,
    Json(req): Json<TagsRequest>,
) -> Json<DraftView> {
    workspace.set_draft_tags(req.tags);
    Json(workspace.draft().view())
}

/// POST /api/v1/draft/submit
pub async fn handle_submit_draft(
    State(state): State<AppState>,
    CurrentWorkspace(workspace): CurrentWorkspace,
) -> Result<OutcomeResponse, AppError> {
    let outcome = actions::submit_draft(state.backend(), &workspace).await?;
    Ok(outcome_response(outcome))
}
