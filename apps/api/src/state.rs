use std::sync::Arc;

use tokio::sync::watch;

use crate::client::BackendClient;
use crate::config::Config;
use crate::feed::LiveState;
use crate::resolver::TitleLookup;
use crate::workspace::Workspaces;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when the backend is misconfigured or unreachable; workspaces then
    /// never finish bootstrapping.
    pub backend: Option<Arc<BackendClient>>,
    /// `None` without a YouTube API key; titles fall back to a placeholder.
    pub metadata: Option<Arc<dyn TitleLookup>>,
    pub live: LiveState,
    pub workspaces: Workspaces,
    pub config: Config,
    /// Flips to `true` once the server starts shutting down; open event
    /// streams end on it.
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn backend(&self) -> Option<&BackendClient> {
        self.backend.as_deref()
    }
}
