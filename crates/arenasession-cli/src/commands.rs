use anyhow::{anyhow, bail, Result};
use arenasession_core::validation::{
    validate_email, validate_identifier, validate_password, validate_sign_up,
};
use arenasession_core::{AuthError, AuthManager, Config};
use tracing::warn;

use crate::terminal::{prompt, prompt_password};

const USAGE: &str = "\
Commands:
  status                          Check the session and sync the local copy
  whoami                          Ask the server who is signed in (prints JSON)
  login [username|email]          Sign in with a password
  social <provider> <token>       Sign in with a provider token
  logout                          Sign out
  signup [name username email]    Create an account
  verify <code>                   Verify an account with its one-time code
  forgot <email>                  Request a password reset email
  reset <token>                   Set a new password with a reset token
  help                            Show this message";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Status,
    WhoAmI,
    Login { identifier: Option<String> },
    Social { provider: String, token: String },
    Logout,
    SignUp { fields: Option<(String, String, String)> },
    Verify { code: String },
    Forgot { email: String },
    Reset { token: String },
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let arg = |i: usize, what: &str| {
            args.get(i)
                .cloned()
                .ok_or_else(|| anyhow!("missing {}\n\n{}", what, USAGE))
        };

        let command = match args.first().map(String::as_str) {
            None | Some("status") => Command::Status,
            Some("whoami") => Command::WhoAmI,
            Some("login") => Command::Login {
                identifier: args.get(1).cloned(),
            },
            Some("social") => Command::Social {
                provider: arg(1, "provider")?,
                token: arg(2, "provider token")?,
            },
            Some("logout") => Command::Logout,
            Some("signup") => Command::SignUp {
                fields: match args.len() {
                    1 => None,
                    4 => Some((args[1].clone(), args[2].clone(), args[3].clone())),
                    _ => bail!("signup takes either no arguments or name, username and email\n\n{}", USAGE),
                },
            },
            Some("verify") => Command::Verify { code: arg(1, "code")? },
            Some("forgot") => Command::Forgot { email: arg(1, "email")? },
            Some("reset") => Command::Reset { token: arg(1, "reset token")? },
            Some("help") | Some("--help") | Some("-h") => Command::Help,
            Some(other) => bail!("unknown command `{}`\n\n{}", other, USAGE),
        };
        Ok(command)
    }
}

/// Run one command. Auth failures have already been shown by the notifier,
/// so they come back as `AuthError` for the caller to decide on.
pub async fn run(manager: &AuthManager, config: &mut Config, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            print_status(manager, false).await;
        }
        Command::WhoAmI => {
            let user = manager.check_session().await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::Login { identifier } => {
            let identifier = match identifier {
                Some(id) => id,
                None => prompt("Username or email", config.last_identifier.as_deref())?,
            };
            validate_identifier(&identifier)?;
            let password = prompt_password("Password")?;
            validate_password(&password)?;

            let user = manager.sign_in(&identifier, &password).await?;
            println!("Signed in as {}", user.display_name());

            config.last_identifier = Some(identifier);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }
        Command::Social { provider, token } => {
            let user = manager.authenticate_with_provider(&provider, &token).await?;
            println!("Signed in as {}", user.display_name());
        }
        Command::Logout => {
            manager.sign_out().await?;
            println!("Signed out");
        }
        Command::SignUp { fields } => {
            let (name, username, email) = match fields {
                Some(fields) => fields,
                None => (
                    prompt("Name", None)?,
                    prompt("Username", None)?,
                    prompt("Email", None)?,
                ),
            };
            let password = prompt_password("Password")?;
            validate_sign_up(&name, &username, &email, &password)?;

            let ack = manager.sign_up(&name, &username, &email, &password).await?;
            println!(
                "{}",
                ack.message
                    .unwrap_or_else(|| "Account created. Check your email for a verification code.".to_string())
            );
        }
        Command::Verify { code } => {
            let ack = manager.verify_one_time_code(&code).await?;
            println!("{}", ack.message.unwrap_or_else(|| "Account verified".to_string()));
        }
        Command::Forgot { email } => {
            validate_email(&email)?;
            // The manager shows the outcome itself
            manager.request_password_reset(&email).await?;
        }
        Command::Reset { token } => {
            let password = prompt_password("New password")?;
            validate_password(&password)?;
            let confirm = prompt_password("Confirm new password")?;
            if password != confirm {
                bail!("Passwords do not match");
            }
            manager.reset_password(&token, &password).await?;
            println!("Password updated. You can sign in now.");
        }
        Command::Help => println!("{}", USAGE),
    }
    Ok(())
}

/// Check the session with the server and report what the user is signed in as.
///
/// `quiet` suppresses the "not signed in" line, for start-up checks where
/// that is the expected answer.
pub async fn print_status(manager: &AuthManager, quiet: bool) {
    let cached = manager.stored_session().ok().flatten();

    match manager.restore_session().await {
        Ok(user) => println!("Signed in as {}", user.display_name()),
        Err(AuthError::AuthenticationFailed) => {
            if !quiet {
                println!("Not signed in");
            }
        }
        Err(AuthError::TransportFailure { message }) => match cached {
            Some(stored) => println!(
                "Offline - last known session: {} (synced {})",
                stored.user.display_name(),
                stored.age_display()
            ),
            None => eprintln!("{}", message),
        },
        Err(e) => eprintln!("Could not check session: {}", e),
    }
}

/// True when the error was already shown to the user by the notifier.
pub fn already_reported(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<AuthError>(),
        Some(AuthError::RequestRejected { .. } | AuthError::TransportFailure { .. } | AuthError::Storage(_))
    )
}
