pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub use config::Config;
pub use error::GatewayError;

use services::RecordSink;

/// Application state shared across handlers.
///
/// Read-only after startup: requests share nothing mutable, each one runs
/// its own classify/dispatch pipeline against the same sink handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sink: Arc<dyn RecordSink>,
}

/// Build the router. Separated from `main` so tests can drive the full
/// HTTP surface against an injected sink.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route("/webhook/{provider}", post(handlers::webhook::receive_webhook))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(std::time::Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
