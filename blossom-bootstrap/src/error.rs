//! Error types for blossom-bootstrap

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Common(#[from] blossom_common::Error),

    #[error("Failed to read export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid export file: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<sqlx::Error> for BootstrapError {
    fn from(err: sqlx::Error) -> Self {
        BootstrapError::Common(err.into())
    }
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
