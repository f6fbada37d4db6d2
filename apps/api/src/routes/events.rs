//! Server-Sent Events stream for one workspace.
//!
//! Every slice the page renders is pushed as a named event carrying the full
//! slice as JSON: `session`, `ui` and `draft` for the workspace itself, and
//! the shared `recipes` and `grocery` slices once the workspace has signed in.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::Serialize;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use super::extract::CurrentWorkspace;
use crate::state::AppState;
use crate::workspace::slices::DraftSlice;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

type EventStream = BoxStream<'static, Result<Event, Infallible>>;

/// Tags each item of `items` as an SSE event called `name`.
fn named_events<S, T>(name: &'static str, items: S) -> EventStream
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    items
        .filter_map(move |item| async move {
            match serde_json::to_string(&item) {
                Ok(json) => Some(Ok(Event::default().event(name).data(json))),
                Err(e) => {
                    warn!("Failed to serialize {name} event: {e}");
                    None
                }
            }
        })
        .boxed()
}

/// GET /api/v1/events
pub async fn handle_events(
    State(state): State<AppState>,
    CurrentWorkspace(workspace): CurrentWorkspace,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("SSE client connected for workspace {}", workspace.id);

    // Shared data stays hidden until the workspace has a session.
    let mut session = workspace.subscribe_session();
    let live = state.live.clone();
    let shared = stream::once(async move {
        let ready = session.wait_for(|s| s.is_ready()).await.is_ok();
        let events: EventStream = if ready {
            stream::select(
                named_events("recipes", WatchStream::new(live.subscribe_recipes())),
                named_events("grocery", WatchStream::new(live.subscribe_grocery())),
            )
            .boxed()
        } else {
            stream::empty().boxed()
        };
        events
    })
    .flatten();

    let streams: Vec<EventStream> = vec![
        named_events("session", WatchStream::new(workspace.subscribe_session())),
        named_events("ui", WatchStream::new(workspace.subscribe_ui())),
        named_events(
            "draft",
            WatchStream::new(workspace.subscribe_draft()).map(|d: DraftSlice| d.view()),
        ),
        shared.boxed(),
    ];

    // Lives as long as the stream; an open stream keeps the workspace from
    // being evicted as idle.
    let attachment = workspace.attach_stream();
    let mut shutdown = state.shutdown.clone();
    let stop = async move {
        let _attachment = attachment;
        if shutdown.wait_for(|stopping| *stopping).await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    Sse::new(stream::select_all(streams).take_until(stop)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
