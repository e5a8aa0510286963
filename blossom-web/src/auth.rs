//! Staff identification
//!
//! The website has no login form. Staff present the same API key the REST API
//! uses, either as an `Authorization: Api-Key <key>` header or an `api_key`
//! cookie. Anonymous visitors are allowed everywhere except the staff pages.

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, COOKIE},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use blossom_common::auth::parse_authorization_header;
use blossom_common::db::api_keys::authenticate_api_key;
use blossom_common::db::User;
use tracing::debug;

use crate::error::{WebError, WebResult};
use crate::AppState;

/// Cookie carrying the staff API key
pub const API_KEY_COOKIE: &str = "api_key";

/// Who is looking at the page
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    /// Grafeas staff who are not blacklisted
    pub fn is_grafeas_staff(&self) -> bool {
        matches!(&self.0, Some(u) if u.is_grafeas_staff && !u.blacklisted)
    }

    /// Require Grafeas staff (post editing and the admin page)
    pub fn require_grafeas_staff(&self) -> WebResult<&User> {
        let user = self.0.as_ref().ok_or(WebError::Unauthorized)?;
        if self.is_grafeas_staff() {
            Ok(user)
        } else {
            Err(WebError::Forbidden)
        }
    }

    /// Require site staff (superadmin pages)
    pub fn require_site_staff(&self) -> WebResult<&User> {
        let user = self.0.as_ref().ok_or(WebError::Unauthorized)?;
        if user.is_staff && !user.blacklisted {
            Ok(user)
        } else {
            Err(WebError::Forbidden)
        }
    }
}

/// Attach a [`Viewer`] to every request
pub async fn identify_viewer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> WebResult<Response> {
    let user = match presented_key(request.headers()) {
        Some(key) => authenticate_api_key(&state.db, &key).await?,
        None => None,
    };
    if let Some(user) = &user {
        debug!("Request from {}", user.username);
    }

    request.extensions_mut().insert(Viewer(user));
    Ok(next.run(request).await)
}

/// API key from the Authorization header, falling back to the cookie
fn presented_key(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_header)
        .map(str::to_string);

    from_header.or_else(|| {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|cookies| cookie_value(cookies, API_KEY_COOKIE))
    })
}

fn cookie_value(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name && !value.is_empty()).then(|| value.to_string())
    })
}
