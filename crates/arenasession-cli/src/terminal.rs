use arenasession_core::{Notification, NotificationLevel, Notifier};

/// Prints notifications as terminal lines: successes to stdout, errors to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => println!("✓ {}", notification.message),
            NotificationLevel::Error => eprintln!("✗ {}", notification.message),
        }
    }
}

/// Prompt for a line of input, offering `default` when one is known.
pub fn prompt(label: &str, default: Option<&str>) -> std::io::Result<String> {
    use std::io::Write;

    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let input = input.trim();
    Ok(match (input.is_empty(), default) {
        (true, Some(d)) => d.to_string(),
        _ => input.to_string(),
    })
}

pub fn prompt_password(label: &str) -> std::io::Result<String> {
    rpassword::prompt_password(format!("{}: ", label))
}
