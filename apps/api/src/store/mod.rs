//! Document store: the recipe collection and the grocery singleton.
//!
//! `PostgresStore` is the production backend; `MemoryStore` backs the tests.
//! Both publish a [`Change`] on every committed write so live
//! subscriptions can reload.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::grocery::GroceryList;
use crate::models::recipe::{NewRecipe, Recipe};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Document id of the shared grocery list.
pub const GROCERY_DOCUMENT_ID: &str = "shared/groceryList";
/// Postgres NOTIFY channel carrying [`Change`] payloads.
pub const CHANGE_CHANNEL: &str = "recipebox_changes";

const CHANGE_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Recipes,
    Grocery,
}

impl Change {
    pub fn as_str(&self) -> &'static str {
        match self {
            Change::Recipes => "recipes",
            Change::Grocery => "grocery",
        }
    }

    pub fn parse(payload: &str) -> Option<Self> {
        match payload {
            "recipes" => Some(Change::Recipes),
            "grocery" => Some(Change::Grocery),
            _ => None,
        }
    }
}

pub(crate) fn change_channel() -> broadcast::Sender<Change> {
    broadcast::channel(CHANGE_BUFFER).0
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed document '{0}'")]
    MalformedDocument(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All recipes in arrival order.
    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError>;

    /// Recipes whose stored video id equals `video_id`, in arrival order.
    async fn find_recipes_by_video_id(&self, video_id: &str) -> Result<Vec<Recipe>, StoreError>;

    async fn insert_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError>;

    async fn delete_recipe(&self, id: Uuid) -> Result<(), StoreError>;

    /// Reads the grocery singleton. A document that was never written reads as empty.
    async fn read_grocery(&self) -> Result<GroceryList, StoreError>;

    /// Writes `content` into the grocery singleton, keeping any other fields.
    async fn merge_grocery(&self, content: &str) -> Result<GroceryList, StoreError>;

    /// Stream of committed changes, starting from the moment of the call.
    fn changes(&self) -> broadcast::Receiver<Change>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_payload_round_trip() {
        for change in [Change::Recipes, Change::Grocery] {
            assert_eq!(Change::parse(change.as_str()), Some(change));
        }
        assert_eq!(Change::parse("users"), None);
    }
}
