use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{outcome_response, OutcomeResponse};
use crate::actions::{self, Intent};
use crate::errors::AppError;
use crate::models::recipe::NewRecipe;
use crate::resolver::{extract_video_id, thumbnail_url};
use crate::state::AppState;
use crate::view::{build_sections, Section};

use super::extract::CurrentWorkspace;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsResponse {
    pub loaded: bool,
    pub revision: u64,
    pub search: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub intent: Intent,
}

/// GET /api/v1/recipes
///
/// Category sections filtered by `search`, or by the workspace's current search
/// when the parameter is absent. Empty until the session is ready.
pub async fn handle_list_sections(
    State(state): State<AppState>,
    CurrentWorkspace(workspace): CurrentWorkspace,
    Query(query): Query<SearchQuery>,
) -> Json<SectionsResponse> {
    let search = query.search.unwrap_or_else(|| workspace.ui().search);

    if !workspace.session().is_ready() {
        return Json(SectionsResponse {
            loaded: false,
            revision: 0,
            sections: build_sections(&[], &search),
            search,
        });
    }

    let slice = state.live.recipes();
    Json(SectionsResponse {
        loaded: slice.loaded,
        revision: slice.revision,
        sections: build_sections(&slice.recipes, &search),
        search,
    })
}

/// POST /api/v1/recipes
///
/// Appends a recipe given explicitly. The video id must match the URL, the
/// thumbnail is always derived from that id and the title must not be blank.
pub async fn handle_add_recipe(
    State(state): State<AppState>,
    CurrentWorkspace(workspace): CurrentWorkspace,
    Json(mut recipe): Json<NewRecipe>,
) -> Result<OutcomeResponse, AppError> {
    match extract_video_id(&recipe.youtube_url) {
        Some(id) if id == recipe.video_id => {}
        _ => {
            return Err(AppError::Validation(
                "videoId does not match youtubeUrl".to_string(),
            ))
        }
    }
    if recipe.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    recipe.thumbnail_url = thumbnail_url(&recipe.video_id);

    let outcome = actions::add_recipe(state.backend(), &workspace, recipe).await;
    Ok(outcome_response(outcome))
}

/// DELETE /api/v1/recipes/:video_id
pub async fn handle_delete_recipe(
    State(state): State<AppState>,
    CurrentWorkspace(workspace): CurrentWorkspace,
    Path(video_id): Path<String>,
) -> OutcomeResponse {
    let outcome = actions::delete_recipe_by_video_id(state.backend(), &workspace, &video_id).await;
    outcome_response(outcome)
}

/// POST /api/v1/recipes/:video_id/intent
pub async fn handle_mark_intent(
    State(state): State<AppState>,
    CurrentWorkspace(workspace): CurrentWorkspace,
    Path(video_id): Path<String>,
    Json(req): Json<IntentRequest>,
) -> OutcomeResponse {
    let outcome = actions::mark_intent(&state.live, &workspace, &video_id, req.intent);
    outcome_response(outcome)
}
