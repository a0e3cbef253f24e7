use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

pub mod activity;
pub mod collection;
mod extract;
pub mod recommendations;
mod state;

pub use extract::{AppJson, AppPath, AppQuery};
pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:user_id/recommendations",
            get(recommendations::recommend),
        )
        .route(
            "/users/:user_id/recommendations/cache",
            delete(recommendations::invalidate),
        )
        .route(
            "/users/:user_id/collection/:media_type/:content_id",
            put(collection::upsert).delete(collection::remove),
        )
        .route("/activity/:entity_type/:entity_id", get(activity::list))
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: bool,
    pub cache: bool,
    pub cache_backend: &'static str,
}

/// Health check endpoint
///
/// Always answers 200; a failing dependency turns the status to `degraded`.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let (database, cache) = tokio::join!(state.store.ping(), state.cache.ping());

    if let Err(e) = &database {
        tracing::warn!(error = %e, "Database health probe failed");
    }
    if let Err(e) = &cache {
        tracing::warn!(error = %e, "Cache health probe failed");
    }

    let report = HealthReport {
        status: if database.is_ok() && cache.is_ok() {
            "healthy"
        } else {
            "degraded"
        },
        database: database.is_ok(),
        cache: cache.is_ok(),
        cache_backend: state.cache.backend_name(),
    };

    (StatusCode::OK, Json(report))
}
