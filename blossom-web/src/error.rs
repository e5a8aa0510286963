//! Error pages for blossom-web

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::render;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("Page not found")]
    NotFound,

    /// No API key, or an unknown one
    #[error("Please sign in with your staff API key to view this page")]
    Unauthorized,

    #[error("You do not have permission to view this page")]
    Forbidden,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Common(#[from] blossom_common::Error),
}

impl From<sqlx::Error> for WebError {
    fn from(err: sqlx::Error) -> Self {
        WebError::Common(err.into())
    }
}

impl WebError {
    fn status(&self) -> StatusCode {
        match self {
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::Unauthorized => StatusCode::UNAUTHORIZED,
            WebError::Forbidden => StatusCode::FORBIDDEN,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Common(blossom_common::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            WebError::Common(blossom_common::Error::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            WebError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Something went wrong on our end.".to_string()
        } else {
            self.to_string()
        };

        // No navbar: the database may be what failed
        let content = format!(
            "<h1>{}</h1>\n<p>{}</p>\n",
            status.as_u16(),
            render::escape(&message)
        );
        let html = render::layout(&[], status.canonical_reason().unwrap_or("Error"), &content, false);

        (status, Html(html)).into_response()
    }
}

pub type WebResult<T> = Result<T, WebError>;
