//! Per-browser-load state: the session slice, the transient UI slice and the
//! add-recipe draft, plus the timers that act on them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::recipe::Category;
use crate::resolver::{DebouncedResolver, TitleLookup, DEBOUNCE_WINDOW};
use crate::session::SessionStore;

pub mod slices;

use slices::{
    DraftAction, DraftSlice, SessionAction, SessionSlice, Toast, UiAction, UiSlice,
};

pub const TOAST_DURATION: Duration = Duration::from_secs(3);
/// Delay between closing the add-recipe dialog and clearing its fields.
pub const DRAFT_RESET_DELAY: Duration = Duration::from_secs(1);

pub struct Workspace {
    pub id: Uuid,
    session: watch::Sender<SessionSlice>,
    ui: Arc<watch::Sender<UiSlice>>,
    draft: Arc<watch::Sender<DraftSlice>>,
    resolver: Arc<DebouncedResolver>,
    toast_seq: AtomicU64,
    draft_reset: Mutex<Option<JoinHandle<()>>>,
    relay: JoinHandle<()>,
    last_seen: Mutex<Instant>,
    open_streams: AtomicUsize,
}

impl Workspace {
    pub fn new(lookup: Option<Arc<dyn TitleLookup>>) -> Arc<Self> {
        let resolver = Arc::new(DebouncedResolver::new(lookup, DEBOUNCE_WINDOW));
        let draft = Arc::new(watch::channel(DraftSlice::default()).0);

        // Mirror resolver output into the draft slice.
        let relay = {
            let mut resolved = resolver.subscribe();
            let draft = draft.clone();
            tokio::spawn(async move {
                while resolved.changed().await.is_ok() {
                    let resolution = resolved.borrow_and_update().clone();
                    draft.send_modify(|d| d.apply(DraftAction::Resolved(resolution)));
                }
            })
        };

        Arc::new(Self {
            id: Uuid::new_v4(),
            session: watch::channel(SessionSlice::default()).0,
            ui: Arc::new(watch::channel(UiSlice::default()).0),
            draft,
            resolver,
            toast_seq: AtomicU64::new(0),
            draft_reset: Mutex::new(None),
            relay,
            last_seen: Mutex::new(Instant::now()),
            open_streams: AtomicUsize::new(0),
        })
    }

    /// Signs in anonymously in the background. Without a session store the
    /// workspace never leaves `Loading`.
    pub fn bootstrap(self: &Arc<Self>, sessions: Option<Arc<dyn SessionStore>>) {
        let Some(sessions) = sessions else {
            warn!("Workspace {} cannot sign in: backend not configured", self.id);
            return;
        };

        let workspace = self.clone();
        tokio::spawn(async move {
            match sessions.sign_in_anonymously().await {
                Ok(session) => {
                    info!("Workspace {} signed in as {}", workspace.id, session.uid);
                    workspace.dispatch_session(SessionAction::SignedIn(session));
                }
                Err(e) => {
                    error!("Anonymous sign-in failed for workspace {}: {e}", workspace.id);
                    workspace.dispatch_session(SessionAction::SignInFailed(e.to_string()));
                }
            }
        });
    }

    pub fn session(&self) -> SessionSlice {
        self.session.borrow().clone()
    }

    pub fn ui(&self) -> UiSlice {
        self.ui.borrow().clone()
    }

    pub fn draft(&self) -> DraftSlice {
        self.draft.borrow().clone()
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionSlice> {
        self.session.subscribe()
    }

    pub fn subscribe_ui(&self) -> watch::Receiver<UiSlice> {
        self.ui.subscribe()
    }

    pub fn subscribe_draft(&self) -> watch::Receiver<DraftSlice> {
        self.draft.subscribe()
    }

    pub fn dispatch_session(&self, action: SessionAction) {
        self.session.send_modify(|s| s.apply(action));
    }

    pub fn dispatch_ui(&self, action: UiAction) {
        self.ui.send_modify(|s| s.apply(action));
    }

    pub fn dispatch_draft(&self, action: DraftAction) {
        self.draft.send_modify(|s| s.apply(action));
    }

    /// Shows `message` and hides it again after [`TOAST_DURATION`], unless a
    /// newer toast has replaced it by then.
    pub fn show_toast(&self, message: impl Into<String>) {
        let id = self.toast_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let message = message.into();
        debug!("Workspace {} toast: {message}", self.id);
        self.dispatch_ui(UiAction::ShowToast(Toast { id, message }));

        let ui = self.ui.clone();
        tokio::spawn(async move {
            tokio::time::sleep(TOAST_DURATION).await;
            ui.send_modify(|s| s.apply(UiAction::DismissToast(id)));
        });
    }

    /// Marks the workspace as in use now.
    pub fn touch(&self) {
        *self
            .last_seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    /// Registers an open event stream. The workspace is never idle while the
    /// returned guard is alive.
    pub fn attach_stream(self: &Arc<Self>) -> StreamAttachment {
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        self.touch();
        StreamAttachment {
            workspace: self.clone(),
        }
    }

    fn is_idle(&self, idle: Duration, now: Instant) -> bool {
        let last_seen = *self
            .last_seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.open_streams.load(Ordering::SeqCst) == 0 && now.duration_since(last_seen) >= idle
    }

    // ── add-recipe dialog ──────────────────────────────────────────────────

    pub fn open_draft(&self) {
        if let Some(reset) = self.lock_draft_reset().take() {
            reset.abort();
        }
        self.dispatch_draft(DraftAction::Open);
    }

    /// Records the URL and hands it to the resolver. The resolver's immediate
    /// state (cleared or pending) lands in the draft before this returns; the
    /// relay only carries the later debounced result.
    pub fn set_draft_url(&self, url: &str) {
        self.dispatch_draft(DraftAction::SetUrl(url.to_string()));
        self.resolver.submit(url);
        self.dispatch_draft(DraftAction::Resolved(self.resolver.current()));
    }

    pub fn set_draft_tags(&self, tags: Vec<Category>) {
        self.dispatch_draft(DraftAction::SetTags(tags));
    }

    /// Closes the dialog now and clears its fields after [`DRAFT_RESET_DELAY`].
    pub fn close_draft(&self) {
        self.dispatch_draft(DraftAction::Close);

        let draft = self.draft.clone();
        let resolver = self.resolver.clone();
        let reset = tokio::spawn(async move {
            tokio::time::sleep(DRAFT_RESET_DELAY).await;
            resolver.reset();
            draft.send_modify(|d| d.apply(DraftAction::Reset));
        });

        if let Some(previous) = self.lock_draft_reset().replace(reset) {
            previous.abort();
        }
    }

    fn lock_draft_reset(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.draft_reset
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.relay.abort();
        if let Some(reset) = self.lock_draft_reset().take() {
            reset.abort();
        }
    }
}

/// Held by an open event stream; see [`Workspace::attach_stream`].
pub struct StreamAttachment {
    workspace: Arc<Workspace>,
}

impl Drop for StreamAttachment {
    fn drop(&mut self) {
        self.workspace.open_streams.fetch_sub(1, Ordering::SeqCst);
        self.workspace.touch();
    }
}

/// Registry of live workspaces, keyed by workspace id.
#[derive(Clone, Default)]
pub struct Workspaces {
    inner: Arc<RwLock<HashMap<Uuid, Arc<Workspace>>>>,
}

impl Workspaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, workspace: Arc<Workspace>) {
        self.inner.write().await.insert(workspace.id, workspace);
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Workspace>> {
        self.inner.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> Option<Arc<Workspace>> {
        self.inner.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Drops every workspace that has been idle for at least `idle`. Returns
    /// how many were removed.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        let before = inner.len();
        inner.retain(|id, workspace| {
            let keep = !workspace.is_idle(idle, now);
            if !keep {
                info!("Evicting idle workspace {id}");
            }
            keep
        });
        before - inner.len()
    }

    /// Periodically evicts idle workspaces until the handle is aborted.
    pub fn spawn_sweeper(&self, idle: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let period = (idle / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle(idle).await;
                if evicted > 0 {
                    debug!("Evicted {evicted} idle workspaces");
                }
            }
        })
    }

    /// Shows the same toast in every workspace.
    pub async fn broadcast_toast(&self, message: &str) {
        for workspace in self.inner.read().await.values() {
            workspace.show_toast(message);
        }
    }
}
