use thiserror::Error;

use super::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - credential missing or expired")]
    Unauthorized { message: Option<String> },

    #[error("Request rejected (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    #[error("Rate limited - please wait before retrying")]
    RateLimited { message: Option<String> },

    /// A 2xx answer whose envelope said `success: false`.
    #[error("Request refused: {}", .message.as_deref().unwrap_or("no message"))]
    Refused { message: Option<String> },

    #[error("Server error (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    ServerError { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::NetworkError(err.to_string())
    }
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Pull the human-readable `message` out of an error body, if the server
    /// sent its usual envelope.
    fn envelope_message(body: &str) -> Option<String> {
        serde_json::from_str::<ApiResponse>(body)
            .ok()
            .and_then(|envelope| envelope.message)
            .filter(|m| !m.trim().is_empty())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let code = status.as_u16();
        match code {
            401 => ApiError::Unauthorized {
                message: Self::envelope_message(body),
            },
            429 => ApiError::RateLimited {
                message: Self::envelope_message(body),
            },
            400..=499 => ApiError::Rejected {
                status: code,
                message: Self::envelope_message(body),
            },
            500..=599 => ApiError::ServerError {
                status: code,
                message: Self::envelope_message(body),
            },
            _ => ApiError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }

    /// The credential was rejected; the only condition a refresh can fix.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// True when the request never produced a usable server answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::NetworkError(_) | ApiError::InvalidResponse(_))
    }

    /// Message supplied by the server, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::RateLimited { message }
            | ApiError::Refused { message }
            | ApiError::Rejected { message, .. }
            | ApiError::ServerError { message, .. } => message.as_deref(),
            ApiError::NetworkError(_) | ApiError::InvalidResponse(_) => None,
        }
    }
}
