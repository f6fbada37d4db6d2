use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgListener;
use sqlx::{PgConnection, PgPool};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{change_channel, Change, DocumentStore, StoreError, CHANGE_CHANNEL, GROCERY_DOCUMENT_ID};
use crate::models::grocery::GroceryList;
use crate::models::recipe::{NewRecipe, Recipe, RecipeRow};

const RECIPE_COLUMNS: &str = "id, youtube_url, video_id, thumbnail_url, title, tags, created_at";

/// Postgres-backed document store.
///
/// Writes announce themselves with `pg_notify` inside the writing transaction, so
/// the notification is delivered on commit and never without the write.
/// [`PostgresStore::spawn_listener`]
/// turns those notifications (from this process or any other) into [`Change`] events.
pub struct PostgresStore {
    pool: PgPool,
    changes: broadcast::Sender<Change>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            changes: change_channel(),
        }
    }

    /// Starts forwarding `LISTEN` notifications into the change broadcast.
    /// The task ends when the listener connection fails for good.
    pub async fn spawn_listener(&self) -> Result<JoinHandle<()>, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        info!("Listening for document changes on '{CHANGE_CHANNEL}'");

        let changes = self.changes.clone();
        Ok(tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => match Change::parse(notification.payload()) {
                        Some(change) => {
                            debug!("Document change: {}", change.as_str());
                            let _ = changes.send(change);
                        }
                        None => warn!("Ignoring unknown change payload '{}'", notification.payload()),
                    },
                    Err(e) => {
                        warn!("Change listener stopped: {e}");
                        break;
                    }
                }
            }
        }))
    }

}

async fn notify(conn: &mut PgConnection, change: Change) -> Result<(), StoreError> {
    sqlx::query("SELECT pg_notify($1, $2)")
        .bind(CHANGE_CHANNEL)
        .bind(change.as_str())
        .execute(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn find_recipes_by_video_id(&self, video_id: &str) -> Result<Vec<Recipe>, StoreError> {
        let rows = sqlx::query_as::<_, RecipeRow>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE video_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(video_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn insert_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, RecipeRow>(&format!(
            r#"
            INSERT INTO recipes (id, youtube_url, video_id, thumbnail_url, title, tags)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {RECIPE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&recipe.youtube_url)
        .bind(&recipe.video_id)
        .bind(&recipe.thumbnail_url)
        .bind(&recipe.title)
        .bind(recipe.tag_strings())
        .fetch_one(&mut *tx)
        .await?;
        notify(&mut *tx, Change::Recipes).await?;
        tx.commit().await?;

        info!("Inserted recipe {} ({})", row.id, row.video_id);
        Ok(Recipe::from(row))
    }

    async fn delete_recipe(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() > 0 {
            notify(&mut *tx, Change::Recipes).await?;
        }
        tx.commit().await?;

        if result.rows_affected() > 0 {
            info!("Deleted recipe {id}");
        }
        Ok(())
    }

    async fn read_grocery(&self) -> Result<GroceryList, StoreError> {
        let row: Option<(Value, DateTime<Utc>)> =
            sqlx::query_as("SELECT data, updated_at FROM documents WHERE id = $1")
                .bind(GROCERY_DOCUMENT_ID)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            None => Ok(GroceryList::default()),
            Some((data, updated_at)) => {
                let data = data
                    .as_object()
                    .ok_or_else(|| StoreError::MalformedDocument(GROCERY_DOCUMENT_ID.to_string()))?;
                Ok(GroceryList::from_document(data, Some(updated_at)))
            }
        }
    }

    async fn merge_grocery(&self, content: &str) -> Result<GroceryList, StoreError> {
        let mut tx = self.pool.begin().await?;
        // jsonb `||` merges top-level keys, so fields other than `content` survive.
        let (data, updated_at): (Value, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO documents (id, data, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (id) DO UPDATE
                SET data = documents.data || EXCLUDED.data,
                    updated_at = now()
            RETURNING data, updated_at
            "#,
        )
        .bind(GROCERY_DOCUMENT_ID)
        .bind(Value::Object(GroceryList::patch(content)))
        .fetch_one(&mut *tx)
        .await?;
        notify(&mut *tx, Change::Grocery).await?;
        tx.commit().await?;

        info!("Saved grocery list ({} bytes)", content.len());

        let data = data
            .as_object()
            .ok_or_else(|| StoreError::MalformedDocument(GROCERY_DOCUMENT_ID.to_string()))?;
        Ok(GroceryList::from_document(data, Some(updated_at)))
    }

    fn changes(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use crate::models::recipe::Category;

    async fn store() -> PostgresStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PostgresStore::new(create_pool(&url).await.unwrap())
    }

    #[tokio::test]
    #[ignore = "needs a Postgres instance at DATABASE_URL"]
    async fn test_insert_commits_row_and_notification_together() {
        let store = store().await;
        let _listener = store.spawn_listener().await.unwrap();
        let mut changes = store.changes();

        let video_id = "pgTestAbc12";
        let stored = store
            .insert_recipe(&NewRecipe {
                youtube_url: format!("https://youtu.be/{video_id}"),
                video_id: video_id.to_string(),
                thumbnail_url: format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg"),
                title: "Listener check".to_string(),
                tags: vec![Category::Lunch],
            })
            .await
            .unwrap();

        let change = tokio::time::timeout(std::time::Duration::from_secs(5), changes.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change, Change::Recipes);
        assert!(store
            .find_recipes_by_video_id(video_id)
            .await
            .unwrap()
            .iter()
            .any(|r| r.id == stored.id));

        store.delete_recipe(stored.id).await.unwrap();
        assert!(store
            .find_recipes_by_video_id(video_id)
            .await
            .unwrap()
            .iter()
            .all(|r| r.id != stored.id));
    }
}
