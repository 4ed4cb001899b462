pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::session::handlers as sessions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions and inputs
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/documents/:slot",
            post(sessions::handle_upload_document),
        )
        .route(
            "/api/v1/sessions/:id/job-description",
            put(sessions::handle_set_job_description),
        )
        // Generation and results
        .route(
            "/api/v1/sessions/:id/generate",
            post(analysis::handle_generate_all),
        )
        .route(
            "/api/v1/sessions/:id/generate/:kind",
            post(analysis::handle_generate_kind),
        )
        .route(
            "/api/v1/sessions/:id/results",
            get(analysis::handle_list_results),
        )
        .route(
            "/api/v1/sessions/:id/results/:kind",
            get(analysis::handle_get_result),
        )
        .route(
            "/api/v1/sessions/:id/results/:kind/download",
            get(analysis::handle_download_result),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
