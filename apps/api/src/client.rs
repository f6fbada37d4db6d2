use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::BackendConfig;
use crate::db::create_pool;
#[cfg(test)]
use crate::session::memory::MemorySessionStore;
use crate::session::redis::RedisSessionStore;
use crate::session::SessionStore;
#[cfg(test)]
use crate::store::memory::MemoryStore;
use crate::store::postgres::PostgresStore;
use crate::store::DocumentStore;

/// Handle to the backend: the document store plus the identity service.
///
/// Built once at startup, shared through `AppState`, and shut down explicitly
/// before the process exits.
pub struct BackendClient {
    store: Arc<dyn DocumentStore>,
    sessions: Arc<dyn SessionStore>,
    pool: Option<PgPool>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl BackendClient {
    /// Connects to Postgres and Redis, runs migrations and starts the change listener.
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        let pool = create_pool(&config.database_url).await?;

        let store = PostgresStore::new(pool.clone());
        let listener = store
            .spawn_listener()
            .await
            .context("Failed to start document change listener")?;

        let redis = redis::Client::open(config.redis_url.clone())?;
        let sessions = RedisSessionStore::new(redis, config.session_ttl);
        sessions.ping().await.context("Redis session store unreachable")?;

        info!("Backend client connected");
        Ok(Self {
            store: Arc::new(store),
            sessions: Arc::new(sessions),
            pool: Some(pool),
            listener: Mutex::new(Some(listener)),
        })
    }

    /// A self-contained backend with no external services.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::from_parts(Arc::new(MemoryStore::new()), Arc::new(MemorySessionStore::new()))
    }

    #[cfg(test)]
    pub fn from_parts(store: Arc<dyn DocumentStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            sessions,
            pool: None,
            listener: Mutex::new(None),
        }
    }

    pub fn store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    pub fn sessions(&self) -> Arc<dyn SessionStore> {
        self.sessions.clone()
    }

    /// Stops the change listener and closes the connection pool.
    pub async fn shutdown(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(listener) = listener {
            listener.abort();
        }
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
        info!("Backend client shut down");
    }
}
