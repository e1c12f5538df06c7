pub mod tweets;
pub mod users;

use serde::Serialize;

use crate::error::ApiError;

pub(crate) fn snapshot<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("cache serialization failed: {}", e)))
}
