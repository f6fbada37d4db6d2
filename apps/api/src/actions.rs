//! Mutation handlers. Every handler reports through a toast in the calling
//! workspace and returns an [`Outcome`]; backend failures are logged and
//! never propagate as errors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::client::BackendClient;
use crate::errors::AppError;
use crate::feed::LiveState;
use crate::models::recipe::{normalize_tags, NewRecipe};
use crate::resolver::extract_video_id;
use crate::store::DocumentStore;
use crate::workspace::slices::{DraftAction, UiAction};
use crate::workspace::Workspace;

pub const STILL_LOADING: &str = "Still loading, please wait...";
pub const RECIPE_ADDED: &str = "Recipe added!";
pub const ADD_FAILED: &str = "Failed to add recipe.";
pub const RECIPE_DELETED: &str = "Recipe deleted.";
pub const RECIPE_NOT_FOUND: &str = "Recipe not found.";
pub const DELETE_FAILED: &str = "Failed to delete recipe.";
pub const GROCERY_SAVED: &str = "Grocery list saved!";
pub const GROCERY_SAVE_FAILED: &str = "Failed to save grocery list.";

const UNTITLED: &str = "Untitled recipe";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Done,
    NotFound,
    NotReady,
    Failed,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub message: String,
}

impl Outcome {
    fn new(kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shows the outcome as a toast and hands it back.
    fn report(self, workspace: &Workspace) -> Self {
        workspace.show_toast(self.message.clone());
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Cook,
    Order,
}

/// The store, provided the workspace has finished signing in.
fn ready_store(
    backend: Option<&BackendClient>,
    workspace: &Workspace,
) -> Result<Arc<dyn DocumentStore>, Outcome> {
    match backend {
        Some(backend) if workspace.session().is_ready() => Ok(backend.store()),
        _ => Err(Outcome::new(OutcomeKind::NotReady, STILL_LOADING).report(workspace)),
    }
}

pub async fn add_recipe(
    backend: Option<&BackendClient>,
    workspace: &Workspace,
    mut recipe: NewRecipe,
) -> Outcome {
    let store = match ready_store(backend, workspace) {
        Ok(store) => store,
        Err(outcome) => return outcome,
    };

    recipe.tags = normalize_tags(&recipe.tags);
    match store.insert_recipe(&recipe).await {
        Ok(stored) => {
            info!("Workspace {} added recipe {} ({})", workspace.id, stored.id, stored.video_id);
            Outcome::new(OutcomeKind::Done, RECIPE_ADDED).report(workspace)
        }
        Err(e) => {
            error!("Failed to add recipe {}: {e}", recipe.video_id);
            Outcome::new(OutcomeKind::Failed, ADD_FAILED).report(workspace)
        }
    }
}

/// Deletes the first recipe stored under `video_id`. Other recipes sharing
/// the id are left alone.
pub async fn delete_recipe_by_video_id(
    backend: Option<&BackendClient>,
    workspace: &Workspace,
    video_id: &str,
) -> Outcome {
    let store = match ready_store(backend, workspace) {
        Ok(store) => store,
        Err(outcome) => return outcome,
    };

    let matches = match store.find_recipes_by_video_id(video_id).await {
        Ok(matches) => matches,
        Err(e) => {
            error!("Failed to look up recipe {video_id}: {e}");
            return Outcome::new(OutcomeKind::Failed, DELETE_FAILED).report(workspace);
        }
    };

    let Some(target) = matches.first() else {
        return Outcome::new(OutcomeKind::NotFound, RECIPE_NOT_FOUND).report(workspace);
    };

    match store.delete_recipe(target.id).await {
        Ok(()) => {
            info!("Workspace {} deleted recipe {} ({video_id})", workspace.id, target.id);
            if workspace
                .ui()
                .player
                .is_some_and(|p| p.video_id == video_id)
            {
                workspace.dispatch_ui(UiAction::ClosePlayer);
            }
            Outcome::new(OutcomeKind::Done, RECIPE_DELETED).report(workspace)
        }
        Err(e) => {
            error!("Failed to delete recipe {}: {e}", target.id);
            Outcome::new(OutcomeKind::Failed, DELETE_FAILED).report(workspace)
        }
    }
}

/// Saves the grocery text. Edit mode ends only when the write succeeds.
pub async fn save_grocery(
    backend: Option<&BackendClient>,
    workspace: &Workspace,
    content: &str,
) -> Outcome {
    let store = match ready_store(backend, workspace) {
        Ok(store) => store,
        Err(outcome) => return outcome,
    };

    match store.merge_grocery(content).await {
        Ok(_) => {
            workspace.dispatch_ui(UiAction::GrocerySaved);
            Outcome::new(OutcomeKind::Done, GROCERY_SAVED).report(workspace)
        }
        Err(e) => {
            error!("Failed to save grocery list: {e}");
            Outcome::new(OutcomeKind::Failed, GROCERY_SAVE_FAILED).report(workspace)
        }
    }
}

/// Submits the add-recipe dialog. Refused while the draft has no valid,
/// fully resolved URL. The dialog closes once the append completes, whatever
/// its result.
pub async fn submit_draft(
    backend: Option<&BackendClient>,
    workspace: &Workspace,
) -> Result<Outcome, AppError> {
    let draft = workspace.draft();
    if !draft.open {
        return Err(AppError::Validation("The add-recipe dialog is not open".to_string()));
    }
    if !draft.can_submit() {
        return Err(AppError::Validation(
            "Paste a valid video link before submitting".to_string(),
        ));
    }

    let resolution = &draft.resolution;
    let (Some(video_id), Some(thumbnail_url)) =
        (resolution.video_id.clone(), resolution.thumbnail_url.clone())
    else {
        return Err(AppError::Validation("Draft has no video id".to_string()));
    };
    if extract_video_id(&draft.url).as_deref() != Some(video_id.as_str()) {
        return Err(AppError::Validation(
            "The link changed; wait for it to resolve".to_string(),
        ));
    }

    let recipe = NewRecipe {
        youtube_url: draft.url.trim().to_string(),
        video_id,
        thumbnail_url,
        title: resolution
            .title
            .clone()
            .unwrap_or_else(|| UNTITLED.to_string()),
        tags: draft.effective_tags(),
    };

    workspace.dispatch_draft(DraftAction::Submitting(true));
    let outcome = add_recipe(backend, workspace, recipe).await;
    workspace.close_draft();
    Ok(outcome)
}

/// "I will cook" / "I will order". Nothing is stored.
pub fn mark_intent(live: &LiveState, workspace: &Workspace, video_id: &str, intent: Intent) -> Outcome {
    let recipes = live.recipes();
    let Some(recipe) = recipes.find_by_video_id(video_id) else {
        return Outcome::new(OutcomeKind::NotFound, RECIPE_NOT_FOUND).report(workspace);
    };

    let message = match intent {
        Intent::Cook => format!("Time to cook {}!", recipe.title),
        Intent::Order => format!("Ordering in instead of {}. Enjoy!", recipe.title),
    };
    Outcome::new(OutcomeKind::Done, message).report(workspace)
}
