//! Middleware for the coordinator
//!
//! - CORS for the operator endpoints
//! - Request spans tagged with the surface (worker protocol or operator API)

use axum::body::Body;
use axum::http::{header, Method, Request};
use std::time::Duration;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::{Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

use crate::config::CorsConfig;

/// Operator routes are nested under this prefix; everything else is the
/// worker protocol
pub const OPERATOR_PREFIX: &str = "/api/";

/// Create CORS layer from configuration
///
/// Workers are not browsers, so only the operator surface relies on this.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let wildcard = config.allowed_origins.is_empty() || config.allowed_origins.iter().any(|o| o == "*");
    if wildcard {
        // Credentials cannot be combined with a wildcard origin
        return cors.allow_origin(Any);
    }

    let origins: Vec<_> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    cors.allow_origin(origins).allow_credentials(config.allow_credentials)
}

type RequestSpan = fn(&Request<Body>) -> Span;

/// Create tracing/logging layer
pub fn tracing_layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RequestSpan> {
    TraceLayer::new_for_http()
        .make_span_with(request_span as RequestSpan)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(tower_http::LatencyUnit::Micros),
        )
}

fn request_span(request: &Request<Body>) -> Span {
    let path = request.uri().path();
    tracing::info_span!(
        "request",
        method = %request.method(),
        path,
        surface = surface(path),
    )
}

fn surface(path: &str) -> &'static str {
    if path.starts_with(OPERATOR_PREFIX) {
        "operator"
    } else {
        "worker"
    }
}
