use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::metadata::{resolve_title, TitleLookup};
use super::video::{extract_video_id, thumbnail_url};

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

/// Fields derived from the pasted URL.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub video_id: Option<String>,
    pub thumbnail_url: Option<String>,
    pub title: Option<String>,
    pub is_valid: bool,
    pub is_loading: bool,
}

impl Resolution {
    fn pending() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }
}

/// Latest-wins URL resolver.
///
/// Every [`submit`](Self::submit) starts a new request and cancels the previous
/// one: its debounce timer or title fetch is aborted, and a generation check
/// drops anything that still completes late. Invalid input resets the output
/// immediately; only a valid URL waits out the debounce window.
pub struct DebouncedResolver {
    lookup: Option<Arc<dyn TitleLookup>>,
    window: Duration,
    generation: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
    output: Arc<watch::Sender<Resolution>>,
}

impl DebouncedResolver {
    pub fn new(lookup: Option<Arc<dyn TitleLookup>>, window: Duration) -> Self {
        Self {
            lookup,
            window,
            generation: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
            output: Arc::new(watch::channel(Resolution::default()).0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Resolution> {
        self.output.subscribe()
    }

    pub fn current(&self) -> Resolution {
        self.output.borrow().clone()
    }

    /// Starts resolving `input`, superseding any request still in flight.
    pub fn submit(&self, input: &str) {
        let generation = self.supersede();

        let Some(video_id) = extract_video_id(input) else {
            self.output.send_replace(Resolution::default());
            return;
        };

        self.output.send_replace(Resolution::pending());

        let task = tokio::spawn(resolve(
            video_id,
            generation,
            self.window,
            self.lookup.clone(),
            self.generation.clone(),
            self.output.clone(),
        ));
        *self.lock_pending() = Some(task);
    }

    /// Drops any in-flight request and clears the output.
    pub fn reset(&self) {
        self.supersede();
        self.output.send_replace(Resolution::default());
    }

    fn supersede(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(task) = self.lock_pending().take() {
            task.abort();
        }
        generation
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for DebouncedResolver {
    fn drop(&mut self) {
        if let Some(task) = self.lock_pending().take() {
            task.abort();
        }
    }
}

async fn resolve(
    video_id: String,
    generation: u64,
    window: Duration,
    lookup: Option<Arc<dyn TitleLookup>>,
    current: Arc<AtomicU64>,
    output: Arc<watch::Sender<Resolution>>,
) {
    tokio::time::sleep(window).await;

    // The generation is checked under the channel's write lock; a superseding
    // submit bumps it before taking that lock, so stale writes are dropped.
    let is_current = || current.load(Ordering::SeqCst) == generation;

    let started = output.send_if_modified(|r| {
        if !is_current() {
            return false;
        }
        *r = Resolution {
            thumbnail_url: Some(thumbnail_url(&video_id)),
            video_id: Some(video_id.clone()),
            title: None,
            is_valid: true,
            is_loading: true,
        };
        true
    });
    if !started {
        return;
    }

    let title = resolve_title(lookup.as_deref(), &video_id).await;

    let applied = output.send_if_modified(|r| {
        if !is_current() {
            return false;
        }
        r.title = Some(title);
        r.is_loading = false;
        true
    });
    if !applied {
        debug!("Discarding stale title for {video_id}");
    }
}
