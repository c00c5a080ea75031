//! HTTP transport module for the AlgoArena identity service.
//!
//! This module provides the `Transport` seam, its production `ApiClient`
//! implementation, the response envelope, and the transport error type.
//!
//! The service authenticates with a cookie credential that the client's
//! cookie jar attaches to every request.

pub mod client;
pub mod error;
pub mod response;

pub use client::{endpoints, ApiClient, Transport, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
pub use response::ApiResponse;
