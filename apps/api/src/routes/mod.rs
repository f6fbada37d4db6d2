pub mod draft;
pub mod events;
pub mod extract;
pub mod grocery;
pub mod health;
pub mod recipes;
pub mod session;
pub mod ui;

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::actions::{Outcome, OutcomeKind};
use crate::state::AppState;

pub type OutcomeResponse = (StatusCode, Json<Outcome>);

/// Mutation outcomes travel as JSON with a status matching their kind. The
/// same message has already been shown as a toast in the workspace.
pub fn outcome_response(outcome: Outcome) -> OutcomeResponse {
    let status = match outcome.kind {
        OutcomeKind::Done => StatusCode::OK,
        OutcomeKind::NotFound => StatusCode::NOT_FOUND,
        OutcomeKind::NotReady => StatusCode::CONFLICT,
        OutcomeKind::Failed => StatusCode::BAD_GATEWAY,
    };
    (status, Json(outcome))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session and live updates
        .route(
            "/api/v1/session",
            post(session::handle_start_session)
                .get(session::handle_get_session)
                .delete(session::handle_end_session),
        )
        .route("/api/v1/events", get(events::handle_events))
        // Recipes
        .route(
            "/api/v1/recipes",
            get(recipes::handle_list_sections).post(recipes::handle_add_recipe),
        )
        .route(
            "/api/v1/recipes/:video_id",
            axum::routing::delete(recipes::handle_delete_recipe),
        )
        .route(
            "/api/v1/recipes/:video_id/intent",
            post(recipes::handle_mark_intent),
        )
        // Page state
        .route("/api/v1/ui", get(ui::handle_get_ui))
        .route("/api/v1/ui/view", put(ui::handle_set_view))
        .route("/api/v1/ui/search", put(ui::handle_set_search))
        .route("/api/v1/player/:video_id", post(ui::handle_open_player))
        .route("/api/v1/player", axum::routing::delete(ui::handle_close_player))
        // Add-recipe dialog
        .route(
            "/api/v1/draft",
            get(draft::handle_get_draft)
                .post(draft::handle_open_draft)
                .delete(draft::handle_close_draft),
        )
        .route("/api/v1/draft/url", put(draft::handle_set_url))
        .route("/api/v1/draft/tags", put(draft::handle_set_tags))
        .route("/api/v1/draft/submit", post(draft::handle_submit_draft))
        // Grocery list
        .route(
            "/api/v1/grocery",
            get(grocery::handle_get_grocery).put(grocery::handle_save_grocery),
        )
        .route("/api/v1/grocery/edit", post(grocery::handle_begin_edit))
        .with_state(state)
}
