//! blossom-api library - JSON REST API for bots and staff tooling
//!
//! Everything under `/api` except `/api/ping` requires an API key belonging to
//! Grafeas staff.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pagination;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let protected = Router::new()
        .route("/api/volunteers", post(api::volunteers::create_volunteer))
        .route("/api/volunteers/summary", get(api::volunteers::summary))
        .route(
            "/api/volunteers/:id/gamma_plusone",
            post(api::volunteers::gamma_plusone),
        )
        .route("/api/volunteers/:id/accept_coc", post(api::volunteers::accept_coc))
        .route("/api/volunteers/:id/blacklist", post(api::volunteers::blacklist))
        .route("/api/volunteers/:id/api_key", post(api::volunteers::issue_key))
        .route(
            "/api/submissions",
            get(api::submissions::list_submissions).post(api::submissions::create_submission),
        )
        .route("/api/submissions/:id", get(api::submissions::get_submission))
        .route("/api/submissions/:id/claim", post(api::submissions::claim))
        .route("/api/submissions/:id/unclaim", post(api::submissions::unclaim))
        .route("/api/submissions/:id/done", post(api::submissions::done))
        .route("/api/submissions/:id/ocr", get(api::submissions::ocr))
        .route(
            "/api/transcriptions",
            post(api::transcriptions::create_transcription),
        )
        .route(
            "/api/transcriptions/search",
            get(api::transcriptions::search_transcriptions),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
