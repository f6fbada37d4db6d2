use std::time::Duration;

use async_trait::async_trait;
use redis::Client;
use tracing::{debug, info};
use uuid::Uuid;

use super::{Session, SessionError, SessionStore};

const KEY_PREFIX: &str = "recipebox:session:";

/// Anonymous sessions kept in Redis under a TTL.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl: Duration,
}

impl RedisSessionStore {
    pub fn new(client: Client, ttl: Duration) -> Self {
        Self { client, ttl }
    }

    /// Round-trips a PING so a bad URL fails at startup instead of on first sign-in.
    pub async fn ping(&self) -> Result<(), SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis session store reachable");
        Ok(())
    }

    fn key(uid: Uuid) -> String {
        format!("{KEY_PREFIX}{uid}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn sign_in_anonymously(&self) -> Result<Session, SessionError> {
        let session = Session::anonymous();
        let encoded = serde_json::to_string(&session)?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = redis::cmd("SET")
            .arg(Self::key(session.uid))
            .arg(encoded)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;

        debug!("Signed in anonymous session {}", session.uid);
        Ok(session)
    }

    async fn sign_out(&self, uid: Uuid) -> Result<(), SessionError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: i64 = redis::cmd("DEL")
            .arg(Self::key(uid))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}
