//! Data models for the identity service.
//!
//! - `UserSession`: the authenticated user's profile snapshot

pub mod user;

pub use user::UserSession;
