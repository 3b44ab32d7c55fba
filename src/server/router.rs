use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post},
};

use super::catalog;
use super::webhook;
use crate::store::SqliteStore;

pub struct AppState {
    pub store: Arc<SqliteStore>,
    /// Shared secret; when set, webhook deliveries must carry the signature
    /// headers (presence-checked only).
    pub webhook_secret: Option<String>,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhooks/repo", post(webhook::receive_repo_update))
        .route("/api/v1/repos/{id}", get(catalog::get_repo))
        .route(
            "/api/v1/repos/{id}/snapshots",
            get(catalog::list_repo_snapshots),
        )
        .route("/api/v1/repos/{id}/apps", get(catalog::list_repo_apps))
        .route("/api/v1/apps/{id}/tags", get(catalog::list_app_tags))
        .route("/api/v1/tags", get(catalog::list_tags))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
