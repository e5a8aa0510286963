//! blossom-web library - public news site and staff CMS

use axum::Router;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod error;
pub mod pages;
pub mod render;
pub mod staff;

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
    use axum::routing::get;

    Router::new()
        .route("/", get(pages::index))
        .route("/engineering", get(pages::engineering))
        .route("/admin", get(staff::admin))
        .route("/posts/new", get(staff::new_post_form).post(staff::create_post_submit))
        .route("/posts/:slug", get(pages::post_detail))
        .route("/posts/:slug/", get(pages::post_detail))
        .route(
            "/posts/:slug/edit",
            get(staff::edit_post_form).post(staff::edit_post_submit),
        )
        .route(
            "/superadmin/newuser",
            get(staff::new_user_form).post(staff::create_user_submit),
        )
        .route("/health", get(health))
        .route("/:legacy", get(pages::legacy_redirect))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identify_viewer,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "module": "blossom-web",
        "version": blossom_common::VERSION,
        "build": env!("BLOSSOM_COMMIT"),
    }))
}
