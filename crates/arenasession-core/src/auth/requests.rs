//! Request bodies, using the identity service's field names.

use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct SignUpRequest<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct VerifyRequest<'a> {
    pub otp: &'a str,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    /// Username or email
    pub data: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct SocialAuthRequest<'a> {
    pub provider: &'a str,
    pub token: &'a str,
}
