//! The auth session manager.
//!
//! One method per authentication use case. Every method returns an
//! `AuthOutcome`: a success payload or a classified `AuthError`.
//!
//! The only recovery in the system lives in `check_session`: when the
//! identity check rejects the credential, the manager asks the server to
//! refresh it and re-checks exactly once. There is no loop; a second
//! rejection ends the operation with `AuthenticationFailed`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::error::{AuthError, AuthOutcome};
use super::requests::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignUpRequest, SocialAuthRequest,
    VerifyRequest,
};
use crate::api::{endpoints, ApiError, ApiResponse, Transport};
use crate::models::UserSession;
use crate::notify::{messages, Notification, Notifier};
use crate::store::{SessionStore, StoredSession};

/// Server acknowledgment for operations that return no user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub message: Option<String>,
}

impl From<ApiResponse> for Ack {
    fn from(response: ApiResponse) -> Self {
        Self {
            message: response.message,
        }
    }
}

/// What to do with the local session when the remote sign-out fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignOutPolicy {
    /// Only clear once the server confirms the sign-out.
    #[default]
    ClearOnConfirm,
    /// Clear regardless of the remote outcome.
    AlwaysClear,
}

/// Externally visible authentication state.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Authenticated(UserSession),
    Unauthenticated,
}

pub struct AuthManager {
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    sign_out_policy: SignOutPolicy,
}

impl AuthManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            transport,
            store,
            notifier,
            sign_out_policy: SignOutPolicy::default(),
        }
    }

    pub fn with_sign_out_policy(mut self, policy: SignOutPolicy) -> Self {
        self.sign_out_policy = policy;
        self
    }

    // ===== Session state =====

    /// The user held in the session store, if any.
    pub fn current_user(&self) -> AuthOutcome<Option<UserSession>> {
        Ok(self.store.current_user()?)
    }

    /// The stored record, including when it was last synced.
    pub fn stored_session(&self) -> AuthOutcome<Option<StoredSession>> {
        Ok(self.store.load()?)
    }

    pub fn state(&self) -> AuthOutcome<AuthState> {
        Ok(match self.current_user()? {
            Some(user) => AuthState::Authenticated(user),
            None => AuthState::Unauthenticated,
        })
    }

    /// Ask the server who the credential belongs to.
    ///
    /// On an expired credential this refreshes once and re-checks once.
    /// Does not touch the session store and never notifies, so callers can
    /// run it silently at start-up.
    pub async fn check_session(&self) -> AuthOutcome<UserSession> {
        match self.fetch_identity().await {
            Ok(user) => Ok(user),
            Err(err) if err.is_unauthorized() => {
                debug!("Identity check rejected the credential, refreshing");
                if let Err(e) = self.refresh_credential().await {
                    warn!(error = %e, "Credential refresh failed");
                    return Err(AuthError::AuthenticationFailed);
                }
                self.fetch_identity().await.map_err(|e| {
                    warn!(error = %e, "Identity check failed after refresh");
                    AuthError::AuthenticationFailed
                })
            }
            Err(err) => {
                debug!(error = %err, "Identity check failed");
                Err(err.into())
            }
        }
    }

    /// Start-up helper: `check_session`, then sync the store with the result.
    ///
    /// A confirmed user is saved; `AuthenticationFailed` clears the store.
    /// Any other failure leaves the store as it was.
    pub async fn restore_session(&self) -> AuthOutcome<UserSession> {
        match self.check_session().await {
            Ok(user) => {
                self.store.save(&user)?;
                debug!(user_id = user.id(), "Session restored");
                Ok(user)
            }
            Err(AuthError::AuthenticationFailed) => {
                self.store.clear()?;
                info!("Stored session is no longer valid, cleared");
                Err(AuthError::AuthenticationFailed)
            }
            Err(e) => Err(e),
        }
    }

    // ===== Account lifecycle =====

    pub async fn sign_up(
        &self,
        name: &str,
        username: &str,
        email: &str,
        password: &str,
    ) -> AuthOutcome<Ack> {
        self.require(&[
            ("name", name),
            ("username", username),
            ("email", email),
            ("password", password),
        ])?;
        let body = Self::body(&SignUpRequest {
            name,
            username,
            email,
            password,
        })?;

        let response = self.submit(endpoints::REGISTER, body).await.map_err(|e| self.report(e))?;
        info!(username, "Account registered");
        Ok(response.into())
    }

    pub async fn verify_one_time_code(&self, code: &str) -> AuthOutcome<Ack> {
        self.require(&[("code", code)])?;
        let body = Self::body(&VerifyRequest { otp: code })?;

        let response = self
            .submit(endpoints::VERIFY_ACCOUNT, body)
            .await
            .map_err(|e| self.report(e))?;
        info!("Account verified");
        Ok(response.into())
    }

    /// Sign in with a username or email. The returned user replaces whatever
    /// the session store held.
    pub async fn sign_in(&self, identifier: &str, password: &str) -> AuthOutcome<UserSession> {
        self.require(&[("username or email", identifier), ("password", password)])?;
        let body = Self::body(&LoginRequest {
            data: identifier,
            password,
        })?;

        let user = self.establish_session(endpoints::LOGIN, body).await?;
        info!(user_id = user.id(), "Signed in");
        Ok(user)
    }

    /// Sign in with a third-party provider token, passed through untouched.
    pub async fn authenticate_with_provider(
        &self,
        provider: &str,
        provider_token: &str,
    ) -> AuthOutcome<UserSession> {
        self.require(&[("provider", provider), ("provider token", provider_token)])?;
        let body = Self::body(&SocialAuthRequest {
            provider,
            token: provider_token,
        })?;

        let user = self.establish_session(endpoints::SOCIAL_AUTH, body).await?;
        info!(user_id = user.id(), provider, "Signed in with provider");
        Ok(user)
    }

    /// Request a password reset email.
    ///
    /// Success and failure each show one fixed text, whatever the server
    /// says, so the UI never reveals whether an email is registered.
    pub async fn request_password_reset(&self, email: &str) -> AuthOutcome<Ack> {
        self.require(&[("email", email)])?;
        let body = Self::body(&ForgotPasswordRequest { email })?;

        match self.submit(endpoints::FORGOT_PASSWORD, body).await {
            Ok(response) => {
                self.notifier.notify(Notification::success(messages::RESET_REQUESTED));
                Ok(response.into())
            }
            Err(e) => {
                debug!(error = %e, "Password reset request failed");
                self.notifier.notify(Notification::error(messages::RESET_REQUEST_FAILED));
                Err(match e {
                    AuthError::RequestRejected { .. } => {
                        AuthError::rejected(messages::RESET_REQUEST_FAILED)
                    }
                    other => other,
                })
            }
        }
    }

    /// Set a new password with the opaque token from the reset email.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AuthOutcome<Ack> {
        self.require(&[("reset token", token), ("password", new_password)])?;
        let body = Self::body(&ResetPasswordRequest {
            token,
            password: new_password,
        })?;

        let response = self
            .submit(endpoints::RESET_PASSWORD, body)
            .await
            .map_err(|e| self.report(e))?;
        info!("Password reset");
        Ok(response.into())
    }

    /// Sign out remotely, then drop the local session.
    ///
    /// When the remote call fails the local session is kept unless the
    /// policy is `AlwaysClear`. The failure is reported either way.
    pub async fn sign_out(&self) -> AuthOutcome<()> {
        match self.submit(endpoints::LOGOUT, json!({})).await {
            Ok(_) => {
                self.store.clear().map_err(|e| self.report(e.into()))?;
                info!("Signed out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Remote sign-out failed");
                if self.sign_out_policy == SignOutPolicy::AlwaysClear {
                    if let Err(clear_err) = self.store.clear() {
                        warn!(error = %clear_err, "Failed to clear local session");
                    }
                }
                self.notifier.notify(Notification::error(messages::SIGN_OUT_FAILED));
                Err(e)
            }
        }
    }

    // ===== Helpers =====

    async fn fetch_identity(&self) -> Result<UserSession, ApiError> {
        let response = self.transport.get(endpoints::IDENTITY_CHECK).await?;
        Self::ensure_success(response)?.into_data()
    }

    async fn refresh_credential(&self) -> Result<(), ApiError> {
        let response = self.transport.get(endpoints::TOKEN_REFRESH).await?;
        Self::ensure_success(response).map(|_| ())
    }

    /// Post to an endpoint that answers with the user, and save that user.
    async fn establish_session(&self, endpoint: &str, body: Value) -> AuthOutcome<UserSession> {
        let user = self
            .submit(endpoint, body)
            .await
            .and_then(|response| response.into_data::<UserSession>().map_err(AuthError::from))
            .map_err(|e| self.report(e))?;

        self.store.save(&user).map_err(|e| self.report(e.into()))?;
        Ok(user)
    }

    async fn submit(&self, endpoint: &str, body: Value) -> AuthOutcome<ApiResponse> {
        let response = self.transport.post(endpoint, body).await?;
        Ok(Self::ensure_success(response)?)
    }

    /// A 2xx envelope can still say `success: false`.
    fn ensure_success(response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.success {
            Ok(response)
        } else {
            Err(ApiError::Refused {
                message: response.message.filter(|m| !m.trim().is_empty()),
            })
        }
    }

    fn body<T: Serialize>(request: &T) -> AuthOutcome<Value> {
        serde_json::to_value(request).map_err(|e| AuthError::TransportFailure {
            message: format!("Failed to encode request: {}", e),
        })
    }

    /// Reject locally, without a request, when a required field is blank.
    fn require(&self, fields: &[(&str, &str)]) -> AuthOutcome<()> {
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(self.report(AuthError::rejected(format!("{} is required", field)))),
            None => Ok(()),
        }
    }

    /// Show a failure on the notification surface and hand it back.
    fn report(&self, err: AuthError) -> AuthError {
        self.notifier.notify(Notification::error(err.user_message()));
        err
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use crate::notify::NotificationLevel;
    use crate::store::MemorySessionStore;

    type Scripted = Result<ApiResponse, ApiError>;

    /// Transport that answers from per-endpoint queues and logs every call.
    #[derive(Default)]
    struct ScriptedTransport {
        scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
        calls: Mutex<Vec<(String, Option<Value>)>>,
    }

    impl ScriptedTransport {
        fn script(&self, endpoint: &str, result: Scripted) -> &Self {
            self.scripts
                .lock()
                .unwrap()
                .entry(endpoint.to_string())
                .or_default()
                .push_back(result);
            self
        }

        fn calls_to(&self, endpoint: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|(e, _)| e == endpoint).count()
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn last_body(&self, endpoint: &str) -> Option<Value> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(e, _)| e == endpoint)
                .and_then(|(_, body)| body.clone())
        }

        fn answer(&self, endpoint: &str, body: Option<Value>) -> Scripted {
            self.calls.lock().unwrap().push((endpoint.to_string(), body));
            self.scripts
                .lock()
                .unwrap()
                .get_mut(endpoint)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Err(ApiError::NetworkError(format!("nothing scripted for {}", endpoint))))
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
            self.answer(path, None)
        }

        async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
            self.answer(path, Some(body))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        fn seen(&self) -> Vec<Notification> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) {
            self.seen.lock().unwrap().push(notification);
        }
    }

    struct Harness {
        transport: Arc<ScriptedTransport>,
        store: Arc<MemorySessionStore>,
        notifier: Arc<RecordingNotifier>,
        manager: AuthManager,
    }

    fn harness_with_store(store: MemorySessionStore) -> Harness {
        let transport = Arc::new(ScriptedTransport::default());
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::default());
        let manager = AuthManager::new(transport.clone(), store.clone(), notifier.clone());
        Harness {
            transport,
            store,
            notifier,
            manager,
        }
    }

    fn harness() -> Harness {
        harness_with_store(MemorySessionStore::new())
    }

    fn ana() -> UserSession {
        UserSession::new("u1", "Ana", "ana99", "a@x.com")
    }

    fn ben() -> UserSession {
        UserSession::new("u2", "Ben", "ben", "b@x.com")
    }

    fn user_response(user: &UserSession) -> Scripted {
        Ok(ApiResponse::ok(serde_json::to_value(user).unwrap()))
    }

    /// Error answer built the way `ApiClient` classifies a real response.
    fn rejected(status: u16, message: &str) -> Scripted {
        let body = serde_json::json!({ "success": false, "message": message }).to_string();
        Err(ApiError::from_status(StatusCode::from_u16(status).unwrap(), &body))
    }

    fn unauthorized() -> ApiError {
        ApiError::from_status(StatusCode::UNAUTHORIZED, "")
    }

    fn stored(h: &Harness) -> Option<StoredSession> {
        h.store.load().unwrap()
    }

    // ===== check_session =====

    #[tokio::test]
    async fn test_check_session_valid_credential_skips_refresh() {
        let h = harness();
        h.transport.script(endpoints::IDENTITY_CHECK, user_response(&ana()));

        let user = h.manager.check_session().await.unwrap();

        assert_eq!(user, ana());
        assert_eq!(h.transport.calls_to(endpoints::TOKEN_REFRESH), 0);
        assert_eq!(h.transport.calls_to(endpoints::IDENTITY_CHECK), 1);
    }

    #[tokio::test]
    async fn test_check_session_refreshes_once_then_retries() {
        let h = harness();
        h.transport
            .script(endpoints::IDENTITY_CHECK, Err(unauthorized()))
            .script(endpoints::TOKEN_REFRESH, Ok(ApiResponse::ack("refreshed")))
            .script(endpoints::IDENTITY_CHECK, user_response(&ana()));

        let user = h.manager.check_session().await.unwrap();

        assert_eq!(user, ana());
        assert_eq!(h.transport.calls_to(endpoints::TOKEN_REFRESH), 1);
        assert_eq!(h.transport.calls_to(endpoints::IDENTITY_CHECK), 2);
        // check_session leaves syncing the store to its caller
        assert!(stored(&h).is_none());
    }

    #[tokio::test]
    async fn test_check_session_refresh_failure_is_authentication_failed() {
        let h = harness();
        h.transport
            .script(endpoints::IDENTITY_CHECK, Err(unauthorized()))
            .script(endpoints::TOKEN_REFRESH, Err(unauthorized()))
            .script(endpoints::IDENTITY_CHECK, user_response(&ana()));

        let err = h.manager.check_session().await.unwrap_err();

        assert!(matches!(err, AuthError::AuthenticationFailed));
        assert_eq!(h.transport.calls_to(endpoints::IDENTITY_CHECK), 1);
        assert_eq!(h.transport.calls_to(endpoints::TOKEN_REFRESH), 1);
    }

    #[tokio::test]
    async fn test_check_session_refresh_envelope_failure_counts_as_failed() {
        let h = harness();
        h.transport
            .script(endpoints::IDENTITY_CHECK, Err(unauthorized()))
            .script(
                endpoints::TOKEN_REFRESH,
                Ok(ApiResponse {
                    success: false,
                    message: Some("refresh token revoked".to_string()),
                    data: None,
                }),
            );

        let err = h.manager.check_session().await.unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailed));
        assert_eq!(h.transport.calls_to(endpoints::IDENTITY_CHECK), 1);
    }

    #[tokio::test]
    async fn test_check_session_never_makes_a_third_attempt() {
        let h = harness();
        h.transport
            .script(endpoints::IDENTITY_CHECK, Err(unauthorized()))
            .script(endpoints::TOKEN_REFRESH, Ok(ApiResponse::ack("refreshed")))
            .script(endpoints::IDENTITY_CHECK, Err(unauthorized()))
            .script(endpoints::TOKEN_REFRESH, Ok(ApiResponse::ack("refreshed")))
            .script(endpoints::IDENTITY_CHECK, user_response(&ana()));

        let err = h.manager.check_session().await.unwrap_err();

        assert!(matches!(err, AuthError::AuthenticationFailed));
        assert_eq!(h.transport.calls_to(endpoints::IDENTITY_CHECK), 2);
        assert_eq!(h.transport.calls_to(endpoints::TOKEN_REFRESH), 1);
        assert_eq!(h.transport.total_calls(), 3);
    }

    #[tokio::test]
    async fn test_check_session_other_failures_propagate_without_refresh() {
        let h = harness();
        h.transport
            .script(
                endpoints::IDENTITY_CHECK,
                Err(ApiError::ServerError {
                    status: 503,
                    message: Some("maintenance".to_string()),
                }),
            )
            .script(endpoints::IDENTITY_CHECK, Err(ApiError::NetworkError("timed out".to_string())));

        let err = h.manager.check_session().await.unwrap_err();
        assert!(matches!(err, AuthError::RequestRejected { ref message } if message == "maintenance"));

        let err = h.manager.check_session().await.unwrap_err();
        assert!(matches!(err, AuthError::TransportFailure { .. }));

        assert_eq!(h.transport.calls_to(endpoints::TOKEN_REFRESH), 0);
    }

    #[tokio::test]
    async fn test_check_session_is_silent_and_does_not_write_store() {
        let h = harness_with_store(MemorySessionStore::with_user(ben()));
        let before = stored(&h);
        h.transport
            .script(endpoints::IDENTITY_CHECK, user_response(&ana()))
            .script(endpoints::IDENTITY_CHECK, user_response(&ana()))
            .script(endpoints::IDENTITY_CHECK, Err(unauthorized()));

        let first = h.manager.check_session().await.unwrap();
        let second = h.manager.check_session().await.unwrap();
        assert_eq!(first, second);

        // Expected "not logged in" at start-up must not produce a toast
        assert!(h.manager.check_session().await.is_err());
        assert!(h.notifier.seen().is_empty());
        assert_eq!(stored(&h), before);
    }

    #[tokio::test]
    async fn test_check_session_malformed_payload_is_transport_failure() {
        let h = harness();
        h.transport
            .script(endpoints::IDENTITY_CHECK, Ok(ApiResponse::ok(json!({"id": "u1"}))));

        let err = h.manager.check_session().await.unwrap_err();
        assert!(matches!(err, AuthError::TransportFailure { .. }));
    }

    // ===== restore_session =====

    #[tokio::test]
    async fn test_restore_session_saves_confirmed_user() {
        let h = harness();
        h.transport
            .script(endpoints::IDENTITY_CHECK, Err(unauthorized()))
            .script(endpoints::TOKEN_REFRESH, Ok(ApiResponse::ack("ok")))
            .script(endpoints::IDENTITY_CHECK, user_response(&ana()));

        let user = h.manager.restore_session().await.unwrap();
        assert_eq!(h.manager.current_user().unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_restore_session_clears_on_authentication_failure() {
        let h = harness_with_store(MemorySessionStore::with_user(ana()));
        h.transport
            .script(endpoints::IDENTITY_CHECK, Err(unauthorized()))
            .script(endpoints::TOKEN_REFRESH, Err(unauthorized()));

        let err = h.manager.restore_session().await.unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationFailed));
        assert_eq!(h.manager.state().unwrap(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_restore_session_keeps_store_when_offline() {
        let h = harness_with_store(MemorySessionStore::with_user(ana()));
        h.transport
            .script(endpoints::IDENTITY_CHECK, Err(ApiError::NetworkError("offline".to_string())));

        assert!(h.manager.restore_session().await.is_err());
        assert_eq!(h.manager.state().unwrap(), AuthState::Authenticated(ana()));
    }

    // ===== sign_in / provider =====

    #[tokio::test]
    async fn test_sign_in_writes_store() {
        let h = harness_with_store(MemorySessionStore::with_user(ben()));
        h.transport.script(endpoints::LOGIN, user_response(&ana()));

        let user = h.manager.sign_in("ana99", "correct horse").await.unwrap();

        assert_eq!(user, ana());
        assert_eq!(h.manager.current_user().unwrap(), Some(ana()));
        assert_eq!(
            h.transport.last_body(endpoints::LOGIN),
            Some(json!({"data": "ana99", "password": "correct horse"}))
        );
        assert!(h.notifier.seen().is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_failure_leaves_store_unchanged() {
        let h = harness_with_store(MemorySessionStore::with_user(ben()));
        let before = stored(&h);
        h.transport.script(endpoints::LOGIN, rejected(401, "Invalid credentials"));

        let err = h.manager.sign_in("ana99", "wrong").await.unwrap_err();

        assert!(matches!(err, AuthError::RequestRejected { ref message } if message == "Invalid credentials"));
        assert_eq!(stored(&h), before);
        assert_eq!(h.notifier.seen(), vec![Notification::error("Invalid credentials")]);
    }

    #[tokio::test]
    async fn test_sign_in_envelope_failure_is_rejection() {
        let h = harness();
        h.transport.script(
            endpoints::LOGIN,
            Ok(ApiResponse {
                success: false,
                message: Some("Please verify your account".to_string()),
                data: None,
            }),
        );

        let err = h.manager.sign_in("ana99", "pw").await.unwrap_err();
        assert_eq!(err.user_message(), "Please verify your account");
        assert!(stored(&h).is_none());
    }

    #[test]
    fn test_envelope_failure_carries_no_status() {
        let refused = AuthManager::ensure_success(ApiResponse {
            success: false,
            message: Some("Please verify your account".to_string()),
            data: None,
        })
        .unwrap_err();
        assert!(matches!(refused, ApiError::Refused { .. }));
        assert!(!refused.is_unauthorized());
        assert_eq!(refused.server_message(), Some("Please verify your account"));
    }

    #[tokio::test]
    async fn test_sign_in_malformed_user_leaves_store_unchanged() {
        let h = harness();
        h.transport.script(endpoints::LOGIN, Ok(ApiResponse::ack("logged in")));

        let err = h.manager.sign_in("ana99", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::TransportFailure { .. }));
        assert!(stored(&h).is_none());
        assert_eq!(h.notifier.seen()[0].message, messages::TRANSPORT_FAILED);
    }

    #[tokio::test]
    async fn test_sign_in_blank_field_sends_nothing() {
        let h = harness();

        let err = h.manager.sign_in("ana99", "   ").await.unwrap_err();

        assert!(matches!(err, AuthError::RequestRejected { ref message } if message == "password is required"));
        assert_eq!(h.transport.total_calls(), 0);
        assert_eq!(h.notifier.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_provider_auth_passes_token_through_and_writes_store() {
        let h = harness();
        h.transport.script(endpoints::SOCIAL_AUTH, user_response(&ana()));

        let user = h
            .manager
            .authenticate_with_provider("google", "eyJhbGciOi.opaque.token")
            .await
            .unwrap();

        assert_eq!(user, ana());
        assert_eq!(h.manager.current_user().unwrap(), Some(ana()));
        assert_eq!(
            h.transport.last_body(endpoints::SOCIAL_AUTH),
            Some(json!({"provider": "google", "token": "eyJhbGciOi.opaque.token"}))
        );
    }

    #[tokio::test]
    async fn test_provider_auth_failure_is_rejection() {
        let h = harness();
        h.transport.script(endpoints::SOCIAL_AUTH, rejected(400, "Invalid Google token"));

        let err = h.manager.authenticate_with_provider("google", "bad").await.unwrap_err();
        assert!(matches!(err, AuthError::RequestRejected { .. }));
        assert!(stored(&h).is_none());
    }

    #[tokio::test]
    async fn test_concurrent_sign_ins_leave_exactly_one_session() {
        let h = harness();
        h.transport
            .script(endpoints::LOGIN, user_response(&ana()))
            .script(endpoints::LOGIN, user_response(&ben()));

        let (a, b) = futures::join!(
            h.manager.sign_in("ana99", "pw-one"),
            h.manager.sign_in("ben", "pw-two")
        );
        assert!(a.is_ok() && b.is_ok());

        let current = h.manager.current_user().unwrap().unwrap();
        assert!(current == ana() || current == ben());
    }

    // ===== sign_up / verify =====

    #[tokio::test]
    async fn test_sign_up_sends_all_fields() {
        let h = harness();
        h.transport
            .script(endpoints::REGISTER, Ok(ApiResponse::ack("Verification code sent")));

        let ack = h.manager.sign_up("Ana", "ana99", "a@x.com", "s3cretpass").await.unwrap();

        assert_eq!(ack.message.as_deref(), Some("Verification code sent"));
        assert_eq!(
            h.transport.last_body(endpoints::REGISTER),
            Some(json!({"name": "Ana", "username": "ana99", "email": "a@x.com", "password": "s3cretpass"}))
        );
        assert!(stored(&h).is_none());
    }

    #[tokio::test]
    async fn test_sign_up_rejection_surfaces_server_message() {
        let h = harness();
        h.transport.script(endpoints::REGISTER, rejected(409, "Username already taken"));

        let err = h.manager.sign_up("Ana", "ana99", "a@x.com", "s3cretpass").await.unwrap_err();

        assert!(matches!(err, AuthError::RequestRejected { .. }));
        assert_eq!(
            h.notifier.seen(),
            vec![Notification::error("Username already taken")]
        );
    }

    #[tokio::test]
    async fn test_sign_up_requires_every_field() {
        let h = harness();
        let err = h.manager.sign_up("Ana", "", "a@x.com", "s3cretpass").await.unwrap_err();
        assert_eq!(err.user_message(), "username is required");
        assert_eq!(h.transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_code() {
        let h = harness();
        h.transport
            .script(endpoints::VERIFY_ACCOUNT, Ok(ApiResponse::ack("Account verified")))
            .script(endpoints::VERIFY_ACCOUNT, rejected(400, "Invalid or expired OTP"));

        assert!(h.manager.verify_one_time_code("123456").await.is_ok());
        assert_eq!(h.transport.last_body(endpoints::VERIFY_ACCOUNT), Some(json!({"otp": "123456"})));

        let err = h.manager.verify_one_time_code("000000").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid or expired OTP");
        assert_eq!(h.notifier.seen().len(), 1);
    }

    // ===== password reset =====

    #[tokio::test]
    async fn test_reset_request_same_text_for_any_email() {
        let h = harness();
        h.transport
            .script(
                endpoints::FORGOT_PASSWORD,
                Ok(ApiResponse::ack("Reset link sent to a@x.com")),
            )
            .script(endpoints::FORGOT_PASSWORD, Ok(ApiResponse::ack("If registered, email sent")));

        h.manager.request_password_reset("a@x.com").await.unwrap();
        h.manager.request_password_reset("nobody@x.com").await.unwrap();

        let seen = h.notifier.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0], Notification::success(messages::RESET_REQUESTED));
    }

    #[tokio::test]
    async fn test_reset_request_failure_hides_server_message() {
        let h = harness();
        h.transport
            .script(endpoints::FORGOT_PASSWORD, rejected(404, "No account with that email"));

        let err = h.manager.request_password_reset("nobody@x.com").await.unwrap_err();

        assert_eq!(err.user_message(), messages::RESET_REQUEST_FAILED);
        let seen = h.notifier.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, NotificationLevel::Error);
        assert_eq!(seen[0].message, messages::RESET_REQUEST_FAILED);
    }

    #[tokio::test]
    async fn test_reset_password() {
        let h = harness();
        h.transport
            .script(endpoints::RESET_PASSWORD, Ok(ApiResponse::ack("Password updated")))
            .script(endpoints::RESET_PASSWORD, rejected(400, "Token expired"));

        h.manager.reset_password("opaque-token", "n3wpassword").await.unwrap();
        assert_eq!(
            h.transport.last_body(endpoints::RESET_PASSWORD),
            Some(json!({"token": "opaque-token", "password": "n3wpassword"}))
        );

        let err = h.manager.reset_password("opaque-token", "n3wpassword").await.unwrap_err();
        assert_eq!(err.user_message(), "Token expired");
    }

    #[tokio::test]
    async fn test_reset_password_requires_token() {
        let h = harness();
        assert!(h.manager.reset_password("", "n3wpassword").await.is_err());
        assert_eq!(h.transport.total_calls(), 0);
    }

    // ===== sign_out =====

    #[tokio::test]
    async fn test_sign_out_clears_store() {
        let h = harness_with_store(MemorySessionStore::with_user(ana()));
        h.transport.script(endpoints::LOGOUT, Ok(ApiResponse::ack("Logged out")));

        h.manager.sign_out().await.unwrap();

        assert_eq!(h.manager.current_user().unwrap(), None);
        assert_eq!(h.manager.state().unwrap(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_sign_out_failure_keeps_store_by_default() {
        let h = harness_with_store(MemorySessionStore::with_user(ana()));
        h.transport
            .script(endpoints::LOGOUT, Err(ApiError::NetworkError("offline".to_string())));

        let err = h.manager.sign_out().await.unwrap_err();

        assert!(matches!(err, AuthError::TransportFailure { .. }));
        assert_eq!(h.manager.current_user().unwrap(), Some(ana()));
        assert_eq!(h.notifier.seen(), vec![Notification::error(messages::SIGN_OUT_FAILED)]);
    }

    #[tokio::test]
    async fn test_sign_out_failure_clears_under_always_clear() {
        let transport = Arc::new(ScriptedTransport::default());
        let store = Arc::new(MemorySessionStore::with_user(ana()));
        let notifier = Arc::new(RecordingNotifier::default());
        let manager = AuthManager::new(transport.clone(), store.clone(), notifier.clone())
            .with_sign_out_policy(SignOutPolicy::AlwaysClear);
        transport.script(endpoints::LOGOUT, rejected(500, "boom"));

        assert!(manager.sign_out().await.is_err());
        assert!(store.load().unwrap().is_none());
        assert_eq!(notifier.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_when_already_signed_out() {
        let h = harness();
        h.transport.script(endpoints::LOGOUT, Ok(ApiResponse::ack("Logged out")));
        h.manager.sign_out().await.unwrap();
        assert!(stored(&h).is_none());
    }
}
