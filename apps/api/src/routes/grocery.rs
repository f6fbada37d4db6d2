use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::extract::CurrentWorkspace;
use super::{outcome_response, OutcomeResponse};
use crate::actions;
use crate::state::AppState;
use crate::workspace::slices::{GrocerySlice, UiAction};
use crate::workspace::Workspace;

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryResponse {
    #[serde(flatten)]
    pub list: GrocerySlice,
    pub editing: bool,
    pub buffer: String,
}

fn snapshot(state: &AppState, workspace: &Workspace) -> GroceryResponse {
    let ui = workspace.ui();
    let list = if workspace.session().is_ready() {
        state.live.grocery()
    } else {
        GrocerySlice::default()
    };
    GroceryResponse {
        list,
        editing: ui.grocery_editing,
        buffer: ui.grocery_buffer,
    }
}

/// GET /api/v1/grocery
pub async fn handle_get_grocery(
    State(state): State<AppState>,
    CurrentWorkspace(workspace): CurrentWorkspace,
) -> Json<GroceryResponse> {
    Json(snapshot(&state, &workspace))
}

/// POST /api/v1/grocery/edit
///
/// Enters edit mode with the buffer seeded from the live text.
pub async fn handle_begin_edit(
    State(state): State<AppState>,
    CurrentWorkspace(workspace): CurrentWorkspace,
) -> Json<GroceryResponse> {
    let current = snapshot(&state, &workspace).list.content;
    workspace.dispatch_ui(UiAction::BeginGroceryEdit(current));
    Json(snapshot(&state, &workspace))
}

/// PUT /api/v1/grocery
pub async fn handle_save_grocery(
    State(state): State<AppState>,
    CurrentWorkspace(workspace): CurrentWorkspace,
    Json(req): Json<SaveRequest>,
) -> OutcomeResponse {
    workspace.dispatch_ui(UiAction::UpdateGroceryBuffer(req.content.clone()));
    let outcome = actions::save_grocery(state.backend(), &workspace, &req.content).await;
    outcome_response(outcome)
}
