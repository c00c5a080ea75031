//! arenasession - terminal front end for the AlgoArena session client.
//!
//! Run with a command for a one-shot operation, or with no arguments for an
//! interactive shell. The shell keeps one process (and so one cookie jar)
//! alive across commands, which is what lets a sign-in carry over to later
//! identity checks.

mod commands;
mod terminal;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use arenasession_core::{AuthManager, Config};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;
use terminal::TerminalNotifier;

/// When set, logs also go to a daily rolling file in this directory
const ENV_LOG_DIR: &str = "ARENASESSION_LOG_DIR";

/// Initialize the tracing subscriber for logging.
/// The returned guard must stay alive for file logs to be flushed.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "arenasession.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let mut config = Config::load().context("Failed to load configuration")?;
    info!(base_url = %config.base_url, store = ?config.store_backend, "arenasession starting");

    let client = config.build_client()?;
    let store = config.open_store()?;
    let manager = AuthManager::new(Arc::new(client), store, Arc::new(TerminalNotifier))
        .with_sign_out_policy(config.sign_out_policy());

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let command = Command::parse(&args)?;
        return match commands::run(&manager, &mut config, command).await {
            Err(e) if commands::already_reported(&e) => std::process::exit(1),
            other => other,
        };
    }

    run_shell(&manager, &mut config).await
}

/// Read commands from stdin until `quit` or end of input.
async fn run_shell(manager: &AuthManager, config: &mut Config) -> Result<()> {
    println!("arenasession shell - type `help` for commands, `quit` to exit");

    // Quietly pick up a still-valid session, as a page load would
    commands::print_status(manager, true).await;

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("arena> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let args: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if args.is_empty() {
            continue;
        }
        if matches!(args[0].as_str(), "quit" | "exit") {
            break;
        }

        let result = match Command::parse(&args) {
            Ok(command) => commands::run(manager, config, command).await,
            Err(e) => Err(e),
        };
        match result {
            Err(e) if !commands::already_reported(&e) => eprintln!("Error: {:#}", e),
            _ => {}
        }
    }

    info!("arenasession shutting down");
    Ok(())
}
