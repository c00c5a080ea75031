use thiserror::Error;

use crate::api::ApiError;
use crate::notify::messages;
use crate::store::StoreError;

/// Classified failure of an auth operation.
///
/// The first three variants classify what the server (or the lack of one)
/// said. `Storage` is an addition for failures on this device: the server
/// outcome was fine but the local session could not be written or cleared.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The credential is invalid even after one refresh. Sign in again.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The server turned the request down (bad input, duplicate account,
    /// wrong password).
    #[error("Request rejected: {message}")]
    RequestRejected { message: String },

    /// The request never produced a usable answer.
    #[error("Transport failure: {message}")]
    TransportFailure { message: String },

    /// The session could not be written to or cleared from this device.
    #[error("Session store error: {0}")]
    Storage(#[from] StoreError),
}

/// Result of any `AuthManager` operation.
pub type AuthOutcome<T> = Result<T, AuthError>;

impl AuthError {
    pub fn rejected(message: impl Into<String>) -> Self {
        AuthError::RequestRejected {
            message: message.into(),
        }
    }

    /// Text suitable for the notification surface.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::AuthenticationFailed => messages::AUTHENTICATION_FAILED.to_string(),
            AuthError::RequestRejected { message } | AuthError::TransportFailure { message } => {
                message.clone()
            }
            AuthError::Storage(_) => messages::STORAGE_FAILED.to_string(),
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        if err.is_transport() {
            return AuthError::TransportFailure {
                message: messages::TRANSPORT_FAILED.to_string(),
            };
        }
        let message = match err.server_message() {
            Some(message) => message.to_string(),
            None if matches!(err, ApiError::RateLimited { .. }) => err.to_string(),
            None => messages::REQUEST_FAILED.to_string(),
        };
        AuthError::RequestRejected { message }
    }
}
