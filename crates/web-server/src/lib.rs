use analytics::StatisticsEngine;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use configuration::Settings;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
///
/// The engine is a plain configuration value; every request gets its own
/// computation and nothing mutable is shared.
#[derive(Clone)]
pub struct AppState {
    pub engine: StatisticsEngine,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            engine: StatisticsEngine::new()
                .with_failure_isolation(settings.engine.isolate_failures)
                .with_risk_free_rate(settings.engine.risk_free_rate),
        }
    }
}

/// Builds the application router with its middleware stack.
pub fn build_router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/process-data", post(handlers::process_data))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit_bytes))
}

/// The main function to configure and run the web server.
///
/// Tracing must already be initialised by the caller.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let addr = settings.server.socket_addr()?;
    let app_state = Arc::new(AppState::from_settings(&settings));
    let app = build_router(app_state, settings.server.body_limit_bytes);

    tracing::info!(
        %addr,
        isolate_failures = settings.engine.isolate_failures,
        "Web server listening on http://{}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal.");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received.");
}
