//! Form validation for sign-up and sign-in input.
//!
//! Front ends run these before calling the auth manager. The manager itself
//! only checks that required fields are present.

use thiserror::Error;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 20;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Username must be {}-{} characters", MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH)]
    UsernameLength,

    #[error("Username may only contain letters, numbers, '_' and '-'")]
    UsernameCharacters,

    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    PasswordTooShort,

    #[error("Password must be at most {} characters", MAX_PASSWORD_LENGTH)]
    PasswordTooLong,
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required("Email"));
    }
    let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;
    let domain_ok = domain
        .split_once('.')
        .map(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
        .unwrap_or(false);
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ValidationError::Required("Username"));
    }
    let len = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&len) {
        return Err(ValidationError::UsernameLength);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::UsernameCharacters);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::Required("Password"));
    }
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// Sign-in accepts either an email or a username. When it is neither, the
/// username error is the one reported.
pub fn validate_identifier(identifier: &str) -> Result<(), ValidationError> {
    match (validate_email(identifier), validate_username(identifier)) {
        (Ok(()), _) | (_, Ok(())) => Ok(()),
        (Err(_), Err(username_err)) => Err(username_err),
    }
}

pub fn validate_sign_up(
    name: &str,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required("Name"));
    }
    validate_username(username)?;
    validate_email(email)?;
    validate_password(password)
}
