//! Public pages: news, engineering blog and post detail

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Extension,
};
use blossom_common::db::posts::{find_post_by_slug, list_engineering_posts, list_news_posts};

use crate::auth::Viewer;
use crate::error::{WebError, WebResult};
use crate::render;
use crate::AppState;

/// GET /
pub async fn index(State(state): State<AppState>) -> WebResult<Html<String>> {
    let posts = list_news_posts(&state.db).await?;
    render::page(&state.db, "News", &render::post_list("News", &posts), false).await
}

/// GET /engineering
pub async fn engineering(State(state): State<AppState>) -> WebResult<Html<String>> {
    let posts = list_engineering_posts(&state.db).await?;
    let content = render::post_list("Engineering Blog", &posts);
    render::page(&state.db, "Engineering", &content, false).await
}

/// GET /posts/:slug
///
/// Unpublished posts are only visible to staff.
pub async fn post_detail(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(slug): Path<String>,
) -> WebResult<Html<String>> {
    let post = find_post_by_slug(&state.db, &slug)
        .await?
        .ok_or(WebError::NotFound)?;

    let staff = viewer.is_grafeas_staff();
    if !post.published && !staff {
        return Err(WebError::NotFound);
    }

    let content = render::post_detail(&post, staff);
    render::page(&state.db, &post.title, &content, false).await
}

/// GET /:legacy
///
/// Old links had the form `/<pk>-<slug>`; they move permanently to `/posts/<slug>`.
pub async fn legacy_redirect(Path(legacy): Path<String>) -> Response {
    match parse_legacy_path(&legacy) {
        Some(slug) => (
            StatusCode::MOVED_PERMANENTLY,
            [(header::LOCATION, format!("/posts/{}", slug))],
        )
            .into_response(),
        None => WebError::NotFound.into_response(),
    }
}

/// Slug from a `<pk>-<slug>` path segment
fn parse_legacy_path(segment: &str) -> Option<&str> {
    let (pk, slug) = segment.split_once('-')?;
    let valid_pk = !pk.is_empty() && pk.chars().all(|c| c.is_ascii_digit());
    let valid_slug = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    (valid_pk && valid_slug).then_some(slug)
}
