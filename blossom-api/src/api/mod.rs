//! HTTP API handlers for blossom-api

pub mod auth;
pub mod health;
pub mod submissions;
pub mod transcriptions;
pub mod volunteers;

pub use auth::{auth_middleware, ApiUser};
pub use health::health_routes;

use serde_json::Value;

/// Render a JSON body value as a plain string.
///
/// Strings are taken as-is and numbers are formatted; `null` and absent keys
/// yield `None`.
pub(crate) fn value_as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn missing_key(key: &str, description: &str) -> crate::error::ApiError {
    crate::error::ApiError::BadRequest(format!(
        "Missing JSON body key `{}`, {}",
        key, description
    ))
}
