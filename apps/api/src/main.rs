mod actions;
mod client;
mod config;
mod db;
mod errors;
mod feed;
mod models;
mod resolver;
mod routes;
mod session;
mod state;
mod store;
mod view;
mod workspace;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::sync::watch;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::client::BackendClient;
use crate::config::Config;
use crate::feed::{LiveState, Subscriptions};
use crate::resolver::{TitleLookup, YouTubeClient};
use crate::routes::build_router;
use crate::state::AppState;
use crate::workspace::Workspaces;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; only malformed values are fatal
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RecipeBox v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the backend (document store + identity service)
    let backend = match &config.backend {
        Some(backend_config) => match BackendClient::connect(backend_config).await {
            Ok(backend) => Some(Arc::new(backend)),
            Err(e) => {
                error!("Backend unavailable, sessions will stay loading: {e:#}");
                None
            }
        },
        None => {
            error!(
                "Backend configuration missing ({}), sessions will stay loading",
                config.missing_backend_vars.join(", ")
            );
            None
        }
    };

    // Initialize metadata client
    let metadata: Option<Arc<dyn TitleLookup>> = match config.youtube_api_key.clone() {
        Some(key) => match YouTubeClient::new(key) {
            Ok(client) => {
                info!("YouTube metadata client initialized");
                Some(Arc::new(client))
            }
            Err(e) => {
                warn!("Failed to build YouTube client: {e}");
                None
            }
        },
        None => {
            warn!("YOUTUBE_API_KEY not set, titles will use a placeholder");
            None
        }
    };

    // Start live subscriptions
    let live = LiveState::new();
    let workspaces = Workspaces::new();
    let subscriptions = backend
        .as_ref()
        .map(|b| Subscriptions::start(b.store(), &live, workspaces.clone()));

    let sweeper = workspaces.spawn_sweeper(config.workspace_idle);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Build app state
    let state = AppState {
        backend: backend.clone(),
        metadata,
        live,
        workspaces,
        config: config.clone(),
        shutdown: shutdown_rx,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Event streams never finish on their own
            let _ = shutdown_tx.send(true);
        })
        .await?;

    sweeper.abort();
    if let Some(subscriptions) = subscriptions {
        subscriptions.stop();
    }
    if let Some(backend) = backend {
        backend.shutdown().await;
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
