pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod submission;

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::{AppState, SharedState};

pub fn build_app(config: Config) -> Router {
    let profile = config.profile;
    let max_body_size = config.max_body_size;

    tracing::info!(
        "Intake profile {:?}: fields {:?}, store at {}",
        profile,
        profile.file_fields(),
        config.data_file.display()
    );

    let state: SharedState = Arc::new(AppState::new(config));

    Router::new()
        .merge(routes::api_routes(profile))
        .route("/health", axum::routing::get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body_size))
                // Cors needs a `Default` response body, so it wraps the router directly.
                .layer(CorsLayer::permissive()),
        )
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
