use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Session, SessionError, SessionStore};

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn sign_in_anonymously(&self) -> Result<Session, SessionError> {
        let session = Session::anonymous();
        self.sessions
            .write()
            .await
            .insert(session.uid, session.clone());
        Ok(session)
    }

    async fn sign_out(&self, uid: Uuid) -> Result<(), SessionError> {
        self.sessions.write().await.remove(&uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_each_sign_in_is_a_new_identity() {
        let store = MemorySessionStore::new();
        let a = store.sign_in_anonymously().await.unwrap();
        let b = store.sign_in_anonymously().await.unwrap();
        assert_ne!(a.uid, b.uid);
        assert!(a.anonymous);
    }

    #[tokio::test]
    async fn test_sign_out_forgets_session() {
        let store = MemorySessionStore::new();
        let session = store.sign_in_anonymously().await.unwrap();
        assert!(store.sessions.read().await.contains_key(&session.uid));

        store.sign_out(session.uid).await.unwrap();
        assert!(!store.sessions.read().await.contains_key(&session.uid));
    }
}
