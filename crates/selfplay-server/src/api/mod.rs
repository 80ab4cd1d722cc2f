pub mod response;

use crate::config::Config;
use crate::db::Store;
use crate::error::AppError;
use crate::features::{self, FeatureState};
use crate::middleware;
use axum::{
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::compression::{
    predicate::{NotForContentType, Predicate},
    CompressionLayer, DefaultPredicate,
};

/// Build the full application: worker protocol at the root, operator API
/// under `/api/v1`, health check, and the middleware stack
pub fn create_router(state: FeatureState, config: &Config) -> Router {
    let store = Store::from_pool(state.db.clone());

    // Network downloads are gzip already
    let compression = CompressionLayer::new()
        .compress_when(DefaultPredicate::new().and(NotForContentType::const_new("application/gzip")));

    Router::new()
        .route("/health", get(health_check))
        .with_state(store)
        .merge(features::protocol_router(state.clone()))
        .nest("/api/v1", features::admin_router(state))
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(compression)
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn health_check(State(store): State<Store>) -> Result<Response, AppError> {
    store
        .health_check()
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;
    Ok(Json(json!({
        "status": "healthy",
        "database": "connected",
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response())
}
