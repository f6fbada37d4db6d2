//! Live subscriptions: the recipe collection and the grocery document.
//!
//! Each subscription loads its slice once, then reloads and fully replaces the
//! slice on every matching change event. A failed read shows a toast in every
//! workspace and ends the subscription; it is not retried.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::store::{Change, DocumentStore, StoreError};
use crate::workspace::slices::{GroceryAction, GrocerySlice, RecipeListAction, RecipeListSlice};
use crate::workspace::Workspaces;

pub const RECIPES_LOAD_FAILED: &str = "Failed to load recipes.";
pub const GROCERY_LOAD_FAILED: &str = "Failed to load grocery list.";

/// Shared slices fed by the subscriptions.
#[derive(Clone)]
pub struct LiveState {
    recipes: Arc<watch::Sender<RecipeListSlice>>,
    grocery: Arc<watch::Sender<GrocerySlice>>,
}

impl Default for LiveState {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveState {
    pub fn new() -> Self {
        Self {
            recipes: Arc::new(watch::channel(RecipeListSlice::default()).0),
            grocery: Arc::new(watch::channel(GrocerySlice::default()).0),
        }
    }

    pub fn recipes(&self) -> RecipeListSlice {
        self.recipes.borrow().clone()
    }

    pub fn grocery(&self) -> GrocerySlice {
        self.grocery.borrow().clone()
    }

    pub fn subscribe_recipes(&self) -> watch::Receiver<RecipeListSlice> {
        self.recipes.subscribe()
    }

    pub fn subscribe_grocery(&self) -> watch::Receiver<GrocerySlice> {
        self.grocery.subscribe()
    }
}

/// A running subscription. Dropping it stops the task.
pub struct Subscription {
    name: &'static str,
    task: JoinHandle<()>,
}

impl Subscription {
    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!("Tearing down {} subscription", self.name);
        self.task.abort();
    }
}

/// Both standing subscriptions.
pub struct Subscriptions {
    recipes: Subscription,
    grocery: Subscription,
}

impl Subscriptions {
    pub fn start(store: Arc<dyn DocumentStore>, live: &LiveState, workspaces: Workspaces) -> Self {
        info!("Starting live subscriptions");
        Self {
            recipes: subscribe_recipes(store.clone(), live, workspaces.clone()),
            grocery: subscribe_grocery(store, live, workspaces),
        }
    }

    /// Stops both subscriptions.
    pub fn stop(self) {
        info!("Stopping live subscriptions");
        drop(self.recipes);
        drop(self.grocery);
    }
}

pub fn subscribe_recipes(
    store: Arc<dyn DocumentStore>,
    live: &LiveState,
    workspaces: Workspaces,
) -> Subscription {
    let slice = live.recipes.clone();
    let changes = store.changes();
    let task = tokio::spawn(follow(
        changes,
        Change::Recipes,
        move || {
            let store = store.clone();
            async move { store.list_recipes().await }
        },
        move |recipes| slice.send_modify(|s| s.apply(RecipeListAction::Replaced(recipes))),
        workspaces,
        RECIPES_LOAD_FAILED,
    ));
    Subscription {
        name: "recipes",
        task,
    }
}

pub fn subscribe_grocery(
    store: Arc<dyn DocumentStore>,
    live: &LiveState,
    workspaces: Workspaces,
) -> Subscription {
    let slice = live.grocery.clone();
    let changes = store.changes();
    let task = tokio::spawn(follow(
        changes,
        Change::Grocery,
        move || {
            let store = store.clone();
            async move { store.read_grocery().await }
        },
        move |list| slice.send_modify(|s| s.apply(GroceryAction::Replaced(list))),
        workspaces,
        GROCERY_LOAD_FAILED,
    ));
    Subscription {
        name: "grocery",
        task,
    }
}

/// Load, apply, then reload on every `kind` change until a read fails or the
/// change stream closes. `changes` is subscribed before the first load so no
/// write between the two is missed.
async fn follow<T, L, Fut, A>(
    mut changes: broadcast::Receiver<Change>,
    kind: Change,
    load: L,
    apply: A,
    workspaces: Workspaces,
    failure_toast: &'static str,
) where
    L: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
    A: Fn(T),
{
    loop {
        match load().await {
            Ok(value) => {
                debug!("Subscription '{}' delivered a snapshot", kind.as_str());
                apply(value);
            }
            Err(e) => {
                error!("Subscription '{}' failed: {e}", kind.as_str());
                workspaces.broadcast_toast(failure_toast).await;
                return;
            }
        }

        loop {
            match changes.recv().await {
                Ok(change) if change == kind => break,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Subscription '{}' lagged by {skipped} events; reloading", kind.as_str());
                    break;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Change stream closed; ending '{}' subscription", kind.as_str());
                    return;
                }
            }
        }
    }
}
