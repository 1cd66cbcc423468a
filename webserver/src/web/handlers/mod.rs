//! Request handlers grouped by resource

pub mod counties;
pub mod health;
pub mod quotes;
pub mod summary;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use crate::error::{WebServerError, WebServerResult};

/// JSON body, or the type's default when the body is empty
pub(crate) fn parse_body<T>(body: &Bytes) -> WebServerResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| WebServerError::invalid(format!("request body: {e}")))
}
