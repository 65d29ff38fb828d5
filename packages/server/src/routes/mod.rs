use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

/// JSON API, documented in the OpenAPI spec.
pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let body_limit = usize::try_from(config.storage.max_upload_size).unwrap_or(usize::MAX);

    OpenApiRouter::new()
        .routes(routes!(
            handlers::models::list_models,
            handlers::models::create_model
        ))
        .layer(DefaultBodyLimit::max(body_limit))
}

/// HTML pages, downloads and the liveness probe.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::pages::index))
        .route("/search", post(handlers::pages::search))
        .route("/download/{*path}", get(handlers::download::download_file))
        .route("/ping", get(handlers::health::ping))
}
