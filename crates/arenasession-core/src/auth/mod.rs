//! Authentication module: the session manager and its error taxonomy.
//!
//! This module provides:
//! - `AuthManager`: one operation per auth use case, plus the single
//!   refresh-and-retry step inside `check_session`
//! - `AuthError` / `AuthOutcome`: classified failures
//!
//! The manager is built from an injected `Transport`, `SessionStore` and
//! `Notifier`, so front ends and tests pick the collaborators.

pub mod error;
pub mod manager;
mod requests;

pub use error::{AuthError, AuthOutcome};
pub use manager::{Ack, AuthManager, AuthState, SignOutPolicy};
