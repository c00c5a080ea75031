//! The uniform `{ success, message, data }` envelope every endpoint answers with.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::ApiError;

fn default_success() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiResponse {
    /// A successful envelope carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// A successful envelope with only a message, as acknowledgments look.
    pub fn ack(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Decode the `data` payload as `T`.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let data = self
            .data
            .ok_or_else(|| ApiError::InvalidResponse("Response has no data payload".to_string()))?;
        serde_json::from_value(data)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to decode payload: {}", e)))
    }
}
