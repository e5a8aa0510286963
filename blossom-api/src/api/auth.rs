//! API key authentication middleware
//!
//! Every protected route requires `Authorization: Api-Key <key>` belonging to a
//! non-blacklisted Grafeas staff account (staff tooling and the bots). The
//! authenticated user is stored in the request extensions as [`ApiUser`].

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use blossom_common::auth::parse_authorization_header;
use blossom_common::db::api_keys::authenticate_api_key;
use blossom_common::db::User;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::AppState;

/// The account that made the request
#[derive(Debug, Clone)]
pub struct ApiUser(pub User);

/// Authentication middleware for protected routes
///
/// **Note:** `/health` and `/api/ping` do NOT use this middleware.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_header)
        .ok_or_else(invalid_key)?;

    let user = authenticate_api_key(&state.db, key)
        .await?
        .ok_or_else(|| {
            warn!("Rejected unknown API key");
            invalid_key()
        })?;

    if user.blacklisted {
        warn!("Rejected API key of blacklisted user {}", user.username);
        return Err(ApiError::Forbidden("This account is blacklisted.".to_string()));
    }
    if !user.is_grafeas_staff {
        return Err(ApiError::Forbidden(
            "This API key does not have staff access.".to_string(),
        ));
    }

    debug!("Authenticated API request from {}", user.username);
    request.extensions_mut().insert(ApiUser(user));

    Ok(next.run(request).await)
}

fn invalid_key() -> ApiError {
    ApiError::Unauthorized("Invalid or missing API key.".to_string())
}
