//! State containers. Each slice is plain data with an action enum and an
//! `apply` reducer; the workspace and the live subscriptions own the
//! `watch` channels that carry them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::grocery::GroceryList;
use crate::models::recipe::{normalize_tags, Category, Recipe};
use crate::resolver::{embed_url, Resolution};
use crate::session::Session;
use crate::view::View;

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Loading,
    Ready,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSlice {
    pub status: SessionStatus,
    pub uid: Option<Uuid>,
    /// Last sign-in failure. The status stays `Loading` after a failure.
    pub last_error: Option<String>,
}

pub enum SessionAction {
    SignedIn(Session),
    SignInFailed(String),
}

impl SessionSlice {
    pub fn is_ready(&self) -> bool {
        self.status == SessionStatus::Ready
    }

    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::SignedIn(session) => {
                self.status = SessionStatus::Ready;
                self.uid = Some(session.uid);
                self.last_error = None;
            }
            SessionAction::SignInFailed(reason) => {
                self.last_error = Some(reason);
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recipe list + grocery document (fed by live subscriptions)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecipeListSlice {
    pub recipes: Vec<Recipe>,
    pub loaded: bool,
    pub revision: u64,
}

pub enum RecipeListAction {
    Replaced(Vec<Recipe>),
}

impl RecipeListSlice {
    pub fn apply(&mut self, action: RecipeListAction) {
        match action {
            RecipeListAction::Replaced(recipes) => {
                self.recipes = recipes;
                self.loaded = true;
                self.revision += 1;
            }
        }
    }

    pub fn find_by_video_id(&self, video_id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.video_id == video_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrocerySlice {
    pub content: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub loaded: bool,
    pub revision: u64,
}

pub enum GroceryAction {
    Replaced(GroceryList),
}

impl GrocerySlice {
    pub fn apply(&mut self, action: GroceryAction) {
        match action {
            GroceryAction::Replaced(list) => {
                self.content = list.content;
                self.updated_at = list.updated_at;
                self.loaded = true;
                self.revision += 1;
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Transient UI
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub video_id: String,
    pub embed_url: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UiSlice {
    pub view: View,
    pub search: String,
    pub toast: Option<Toast>,
    pub player: Option<Player>,
    pub grocery_editing: bool,
    pub grocery_buffer: String,
}

pub enum UiAction {
    SetView(View),
    SetSearch(String),
    ShowToast(Toast),
    /// Clears the toast only if it is still the one with this id.
    DismissToast(u64),
    OpenPlayer(String),
    ClosePlayer,
    BeginGroceryEdit(String),
    UpdateGroceryBuffer(String),
    GrocerySaved,
}

impl UiSlice {
    pub fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::SetView(view) => self.view = view,
            UiAction::SetSearch(search) => self.search = search,
            UiAction::ShowToast(toast) => self.toast = Some(toast),
            UiAction::DismissToast(id) => {
                if self.toast.as_ref().is_some_and(|t| t.id == id) {
                    self.toast = None;
                }
            }
            UiAction::OpenPlayer(video_id) => {
                self.player = Some(Player {
                    embed_url: embed_url(&video_id),
                    video_id,
                });
            }
            UiAction::ClosePlayer => self.player = None,
            UiAction::BeginGroceryEdit(current) => {
                self.grocery_editing = true;
                self.grocery_buffer = current;
            }
            UiAction::UpdateGroceryBuffer(text) => self.grocery_buffer = text,
            UiAction::GrocerySaved => {
                self.grocery_editing = false;
                self.grocery_buffer.clear();
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Add-recipe dialog
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftSlice {
    pub open: bool,
    pub url: String,
    pub tags: Vec<Category>,
    pub resolution: Resolution,
    pub submitting: bool,
}

pub enum DraftAction {
    Open,
    Close,
    SetUrl(String),
    SetTags(Vec<Category>),
    Resolved(Resolution),
    Submitting(bool),
    Reset,
}

/// Draft plus the derived submit flag, as sent to the page.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    #[serde(flatten)]
    pub draft: DraftSlice,
    pub can_submit: bool,
}

impl DraftSlice {
    /// Submit needs an extracted id, a finished resolution and no submit in flight.
    pub fn can_submit(&self) -> bool {
        self.resolution.is_valid
            && self.resolution.video_id.is_some()
            && !self.resolution.is_loading
            && !self.submitting
    }

    /// Tags to store: the selection, or every category when nothing is selected.
    pub fn effective_tags(&self) -> Vec<Category> {
        normalize_tags(&self.tags)
    }

    pub fn view(&self) -> DraftView {
        DraftView {
            draft: self.clone(),
            can_submit: self.can_submit(),
        }
    }

    pub fn apply(&mut self, action: DraftAction) {
        match action {
            DraftAction::Open => self.open = true,
            DraftAction::Close => {
                self.open = false;
                self.submitting = false;
            }
            DraftAction::SetUrl(url) => self.url = url,
            DraftAction::SetTags(tags) => self.tags = tags,
            DraftAction::Resolved(resolution) => self.resolution = resolution,
            DraftAction::Submitting(submitting) => self.submitting = submitting,
            DraftAction::Reset => {
                let open = self.open;
                *self = DraftSlice {
                    open,
                    ..DraftSlice::default()
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_resolution() -> Resolution {
        Resolution {
            video_id: Some("dQw4w9WgXcQ".to_string()),
            thumbnail_url: Some("https://img.youtube.com/vi/dQw4w9WgXcQ/hqdefault.jpg".to_string()),
            title: Some("Focaccia".to_string()),
            is_valid: true,
            is_loading: false,
        }
    }

    #[test]
    fn test_failed_sign_in_stays_loading() {
        let mut slice = SessionSlice::default();
        slice.apply(SessionAction::SignInFailed("redis down".to_string()));
        assert!(!slice.is_ready());
        assert_eq!(slice.status, SessionStatus::Loading);
        assert_eq!(slice.last_error.as_deref(), Some("redis down"));
    }

    #[test]
    fn test_sign_in_makes_ready() {
        let mut slice = SessionSlice::default();
        let session = Session::anonymous();
        slice.apply(SessionAction::SignedIn(session.clone()));
        assert!(slice.is_ready());
        assert_eq!(slice.uid, Some(session.uid));
    }

    #[test]
    fn test_every_replace_bumps_revision() {
        let mut slice = RecipeListSlice::default();
        assert!(!slice.loaded);
        slice.apply(RecipeListAction::Replaced(vec![]));
        slice.apply(RecipeListAction::Replaced(vec![]));
        assert!(slice.loaded);
        assert_eq!(slice.revision, 2);
    }

    #[test]
    fn test_stale_toast_dismissal_is_ignored() {
        let mut ui = UiSlice::default();
        ui.apply(UiAction::ShowToast(Toast {
            id: 1,
            message: "first".to_string(),
        }));
        ui.apply(UiAction::ShowToast(Toast {
            id: 2,
            message: "second".to_string(),
        }));
        ui.apply(UiAction::DismissToast(1));
        assert_eq!(ui.toast.as_ref().map(|t| t.id), Some(2));
        ui.apply(UiAction::DismissToast(2));
        assert!(ui.toast.is_none());
    }

    #[test]
    fn test_player_gets_embed_url() {
        let mut ui = UiSlice::default();
        ui.apply(UiAction::OpenPlayer("dQw4w9WgXcQ".to_string()));
        assert_eq!(
            ui.player.as_ref().map(|p| p.embed_url.as_str()),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1")
        );
        ui.apply(UiAction::ClosePlayer);
        assert!(ui.player.is_none());
    }

    #[test]
    fn test_grocery_edit_cycle() {
        let mut ui = UiSlice::default();
        ui.apply(UiAction::BeginGroceryEdit("eggs".to_string()));
        ui.apply(UiAction::UpdateGroceryBuffer("eggs\nmilk".to_string()));
        assert!(ui.grocery_editing);
        assert_eq!(ui.grocery_buffer, "eggs\nmilk");
        ui.apply(UiAction::GrocerySaved);
        assert!(!ui.grocery_editing);
    }

    #[test]
    fn test_invalid_draft_cannot_submit() {
        let mut draft = DraftSlice::default();
        draft.apply(DraftAction::SetUrl("not a url".to_string()));
        assert!(!draft.can_submit());
        assert!(!draft.view().can_submit);
    }

    #[test]
    fn test_resolved_draft_can_submit_once() {
        let mut draft = DraftSlice::default();
        draft.apply(DraftAction::Resolved(valid_resolution()));
        assert!(draft.can_submit());
        draft.apply(DraftAction::Submitting(true));
        assert!(!draft.can_submit());
    }

    #[test]
    fn test_draft_without_tags_uses_every_category() {
        let draft = DraftSlice::default();
        assert_eq!(draft.effective_tags(), Category::ALL.to_vec());
    }

    #[test]
    fn test_reset_keeps_dialog_visibility() {
        let mut draft = DraftSlice::default();
        draft.apply(DraftAction::Open);
        draft.apply(DraftAction::SetUrl("https://youtu.be/dQw4w9WgXcQ".to_string()));
        draft.apply(DraftAction::SetTags(vec![Category::Lunch]));
        draft.apply(DraftAction::Reset);
        assert!(draft.open);
        assert!(draft.url.is_empty());
        assert!(draft.tags.is_empty());
    }
}
