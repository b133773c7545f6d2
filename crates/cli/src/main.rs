//! Folio CLI - mail relay and admin session tools.
//!
//! # Usage
//!
//! ```bash
//! # Check that the configured SMTP relay accepts our credentials
//! folio mail check
//!
//! # Send a sample contact submission through the full dispatch path
//! folio mail test -e visitor@example.com
//!
//! # Mint a signed admin session cookie value
//! folio session mint --hours 2
//!
//! # Decode a cookie value and report how the guard would treat it
//! folio session inspect <token>
//! ```
//!
//! All commands read the same environment variables as the site server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "folio")]
#[command(author, version, about = "Folio CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Outbound mail relay tools
    Mail {
        #[command(subcommand)]
        action: MailAction,
    },
    /// Admin session tools
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum MailAction {
    /// Connect to the relay and authenticate without sending anything
    Check,
    /// Dispatch a sample contact submission (notification and auto-reply)
    Test {
        /// Address that receives the auto-reply
        #[arg(short, long)]
        email: String,

        /// Submitter name placed in both messages
        #[arg(short, long, default_value = "Folio CLI")]
        name: String,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// Print a signed `admin_session` cookie value
    Mint {
        /// Display name for the session (defaults to `ADMIN_NAME`)
        #[arg(short, long)]
        name: Option<String>,

        /// Role (`admin` or `viewer`)
        #[arg(short, long, default_value = "admin")]
        role: String,

        /// Lifetime in hours; negative values mint an already-expired session
        #[arg(long, default_value_t = 24, allow_negative_numbers = true)]
        hours: i64,
    },
    /// Verify a cookie value and print its record and classification
    Inspect {
        /// Cookie value as sent by the browser
        token: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Mail { action } => match action {
            MailAction::Check => commands::mail::check().await?,
            MailAction::Test { email, name } => commands::mail::send_test(&email, &name).await?,
        },
        Commands::Session { action } => match action {
            SessionAction::Mint { name, role, hours } => {
                let token = commands::session::mint(name.as_deref(), &role, hours)?;
                println!("{token}");
            }
            SessionAction::Inspect { token } => commands::session::inspect(&token)?,
        },
    }
    Ok(())
}
