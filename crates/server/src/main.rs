use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repackhub_core::{
    create_index_service, load_config, validate_config, RepackStore, SqliteRepackStore,
};
use repackhub_server::{api::create_router, state::AppState};

/// Upper bound on waiting for the index worker after the server stops.
const WORKER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("REPACKHUB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);

    let store: Arc<dyn RepackStore> = Arc::new(
        SqliteRepackStore::new(&config.database.path)
            .context("Failed to open repack store")?,
    );
    info!("Repack store initialized");

    // Create index service
    let (index_handle, index_worker) = create_index_service(Arc::clone(&store), &config.index);
    let worker_handle = tokio::spawn(index_worker.run());

    if config.index.build_on_startup {
        info!("Queueing initial repack index build");
        if let Err(e) = index_handle.request_index().await {
            warn!("Failed to queue initial index build: {}", e);
        }
    } else {
        info!("Initial index build disabled; waiting for an index request");
    }

    let state = Arc::new(AppState::new(config.clone(), index_handle, store));
    let stopping_state = Arc::clone(&state);

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown. Upgraded WebSocket connections are
    // not tracked by `serve`, so they are told to close explicitly.
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received");
            stopping_state.begin_shutdown();
        })
        .await
        .context("Server error")?;

    // The worker exits once the last index handle (held via AppState by the
    // router and any closing WebSocket task) is dropped.
    info!("Server shutting down...");
    match tokio::time::timeout(WORKER_STOP_TIMEOUT, worker_handle).await {
        Ok(_) => info!("Index worker stopped"),
        Err(_) => warn!(
            "Index worker still running after {:?}, exiting anyway",
            WORKER_STOP_TIMEOUT
        ),
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
