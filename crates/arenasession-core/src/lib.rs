//! Core library for arenasession.
//!
//! Client-side session authentication for the AlgoArena web service:
//! credentialed requests to the identity service, classification of their
//! failures, a single bounded refresh-and-retry on expired credentials, and
//! a persisted cache of the signed-in user's profile.
//!
//! Front ends build an [`AuthManager`] from a [`Transport`], a
//! [`SessionStore`] and a [`Notifier`] of their choosing.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod notify;
pub mod store;
pub mod validation;

pub use api::{ApiClient, ApiError, ApiResponse, Transport};
pub use auth::{Ack, AuthError, AuthManager, AuthOutcome, AuthState, SignOutPolicy};
pub use config::{Config, StoreBackend};
pub use models::UserSession;
pub use notify::{Notification, NotificationLevel, Notifier, TracingNotifier};
pub use store::{SessionStore, StoreError, StoredSession};
