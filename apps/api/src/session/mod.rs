//! Anonymous identity. One session is signed in per workspace (browser load);
//! no credentials are ever collected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
pub mod memory;
pub mod redis;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub uid: Uuid,
    pub anonymous: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            uid: Uuid::new_v4(),
            anonymous: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Session encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn sign_in_anonymously(&self) -> Result<Session, SessionError>;

    async fn sign_out(&self, uid: Uuid) -> Result<(), SessionError>;
}
