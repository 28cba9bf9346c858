//! Automail - email classification session service
//!
//! Drives one email-triage session against a classification backend and
//! exposes it to a presentation layer over HTTP and SSE.

mod api;
mod config;
mod contract;
mod runtime;
mod session;

use api::{create_router, AppState};
use config::AppConfig;
use contract::{HttpBackend, LoggingBackend};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "automail=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = AppConfig::from_env();

    let backend = HttpBackend::new(&config.backend_url, config.request_timeout)?;
    tracing::info!(
        backend = %backend.base_url(),
        timeout_secs = config.request_timeout.as_secs(),
        max_upload_bytes = config.max_upload_bytes,
        "Classification backend configured"
    );

    // Start the session
    let session = runtime::spawn(LoggingBackend::new(backend));
    tracing::info!(session_id = %session.session_id(), "Session started");

    let state = AppState::new(session, config.max_upload_bytes);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = config.listen_addr();
    tracing::info!("Automail server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
