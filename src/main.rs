//! Dossier server binary.
//!
//! Loads configuration, wires the external-service adapters into the
//! conversation orchestrator, and serves the HTTP API. Missing service keys
//! are logged at startup but do not stop the server from listening; the
//! affected capability fails when a request exercises it.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use dossier::adapters::ai::AzureOpenAiProvider;
use dossier::adapters::http::{app_router, AppState};
use dossier::adapters::search::AzureSearchClient;
use dossier::adapters::session::InMemorySessionStore;
use dossier::adapters::storage::AzureBlobStore;
use dossier::application::{ChatOrchestrator, IngestionPipeline, RetrievalClient};
use dossier::config::AppConfig;
use dossier::ports::{CompletionProvider, DocumentStore, SearchIndex, SessionStore};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("fatal: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    for key in config.missing_keys() {
        tracing::error!(key, "required configuration missing, dependent requests will fail");
    }

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let documents: Arc<dyn DocumentStore> = Arc::new(AzureBlobStore::from_settings(&config.storage));
    let index: Arc<dyn SearchIndex> = Arc::new(AzureSearchClient::from_settings(&config.search));
    let completion: Arc<dyn CompletionProvider> =
        Arc::new(AzureOpenAiProvider::from_settings(&config.completion));

    let orchestrator = ChatOrchestrator::new(
        sessions,
        IngestionPipeline::new(documents, index.clone()),
        RetrievalClient::new(index),
        completion,
    );
    let state = AppState::new(Arc::new(orchestrator));

    let app = app_router(state, config.server.max_upload_bytes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&config));

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "dossier listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
