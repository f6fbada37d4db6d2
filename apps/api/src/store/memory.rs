use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::{change_channel, Change, DocumentStore, StoreError};
use crate::models::grocery::GroceryList;
use crate::models::recipe::{NewRecipe, Recipe};

struct GroceryDocument {
    data: Map<String, Value>,
    updated_at: Option<chrono::DateTime<Utc>>,
}

/// In-process document store. Same contract as the Postgres store, no durability.
pub struct MemoryStore {
    recipes: RwLock<Vec<Recipe>>,
    grocery: RwLock<GroceryDocument>,
    changes: broadcast::Sender<Change>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            recipes: RwLock::new(Vec::new()),
            grocery: RwLock::new(GroceryDocument {
                data: Map::new(),
                updated_at: None,
            }),
            changes: change_channel(),
        }
    }

    fn publish(&self, change: Change) {
        // No receivers just means no live subscription yet.
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.recipes.read().await.clone())
    }

    async fn find_recipes_by_video_id(&self, video_id: &str) -> Result<Vec<Recipe>, StoreError> {
        Ok(self
            .recipes
            .read()
            .await
            .iter()
            .filter(|r| r.video_id == video_id)
            .cloned()
            .collect())
    }

    async fn insert_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError> {
        let stored = Recipe {
            id: Uuid::new_v4(),
            youtube_url: recipe.youtube_url.clone(),
            video_id: recipe.video_id.clone(),
            thumbnail_url: recipe.thumbnail_url.clone(),
            title: recipe.title.clone(),
            tags: recipe.tags.clone(),
            created_at: Utc::now(),
        };
        self.recipes.write().await.push(stored.clone());
        self.publish(Change::Recipes);
        Ok(stored)
    }

    async fn delete_recipe(&self, id: Uuid) -> Result<(), StoreError> {
        let removed = {
            let mut recipes = self.recipes.write().await;
            let before = recipes.len();
            recipes.retain(|r| r.id != id);
            before != recipes.len()
        };
        if removed {
            self.publish(Change::Recipes);
        }
        Ok(())
    }

    async fn read_grocery(&self) -> Result<GroceryList, StoreError> {
        let doc = self.grocery.read().await;
        Ok(GroceryList::from_document(&doc.data, doc.updated_at))
    }

    async fn merge_grocery(&self, content: &str) -> Result<GroceryList, StoreError> {
        let list = {
            let mut doc = self.grocery.write().await;
            doc.data.extend(GroceryList::patch(content));
            doc.updated_at = Some(Utc::now());
            GroceryList::from_document(&doc.data, doc.updated_at)
        };
        self.publish(Change::Grocery);
        Ok(list)
    }

    fn changes(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::recipe::Category;

    fn new_recipe(video_id: &str, title: &str) -> NewRecipe {
        NewRecipe {
            youtube_url: format!("https://youtu.be/{video_id}"),
            video_id: video_id.to_string(),
            thumbnail_url: format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg"),
            title: title.to_string(),
            tags: vec![Category::Dinner],
        }
    }

    #[tokio::test]
    async fn test_insert_keeps_arrival_order() {
        let store = MemoryStore::new();
        store.insert_recipe(&new_recipe("aaaaaaaaaaa", "First")).await.unwrap();
        store.insert_recipe(&new_recipe("bbbbbbbbbbb", "Second")).await.unwrap();

        let titles: Vec<_> = store
            .list_recipes()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn test_writes_publish_changes() {
        let store = MemoryStore::new();
        let mut changes = store.changes();

        let stored = store.insert_recipe(&new_recipe("aaaaaaaaaaa", "Soup")).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), Change::Recipes);

        store.merge_grocery("eggs").await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), Change::Grocery);

        store.delete_recipe(stored.id).await.unwrap();
        assert_eq!(changes.recv().await.unwrap(), Change::Recipes);
    }

    #[tokio::test]
    async fn test_merge_keeps_unrelated_fields() {
        let store = MemoryStore::new();
        store
            .grocery
            .write()
            .await
            .data
            .insert("owner".to_string(), Value::String("kitchen".to_string()));

        store.merge_grocery("flour").await.unwrap();

        let doc = store.grocery.read().await;
        assert_eq!(doc.data["owner"], "kitchen");
        assert_eq!(doc.data["content"], "flour");
    }

    #[tokio::test]
    async fn test_unwritten_grocery_reads_empty() {
        let store = MemoryStore::new();
        let list = store.read_grocery().await.unwrap();
        assert_eq!(list.content, "");
        assert!(list.updated_at.is_none());
    }
}
