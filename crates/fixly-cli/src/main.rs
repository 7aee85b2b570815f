use std::sync::Arc;

use clap::{Parser, Subcommand};

use fixly_api::{ApiClient, NotificationSink, TokenStore};
use fixly_core::BookingStatus;
use fixly_session::SessionManager;

mod auth;
mod book;
mod bookings;
mod community;
mod emergency;
mod location;
mod notify;
mod watch;


use book::BookArgs;
use community::CommunityCommands;

#[derive(Debug, Parser)]
#[command(name = "fixly")]
#[command(about = "Book and track home services from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and cache the session for later runs
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Account password
        #[arg(long)]
        password: String,
    },
    /// Log out and forget the cached session
    Logout,
    /// Show who is logged in
    Profile,
    /// Book a service by walking the wizard steps from flags
    Book(BookArgs),
    /// List your bookings
    Bookings {
        /// Filter by status (pending, accepted, in_progress, ...)
        #[arg(long)]
        status: Option<BookingStatus>,
        /// Page to fetch
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Show one booking, including recent chat
    Booking {
        /// Booking id
        id: String,
    },
    /// Cancel a booking
    Cancel {
        /// Booking id
        id: String,
        /// Reason shown to the expert
        #[arg(long)]
        reason: Option<String>,
    },
    /// Send a chat message on a booking
    Message {
        /// Booking id
        id: String,
        /// Message text
        text: String,
    },
    /// Follow live tracking for a booking until it ends
    Watch {
        /// Booking id
        id: String,
    },
    /// Raise an emergency alert from your configured location
    Emergency {
        /// Mark the alert as an SOS
        #[arg(long)]
        sos: bool,
        /// What is happening
        #[arg(long, default_value = "Emergency assistance needed")]
        description: String,
    },
    /// Community board
    Community {
        #[command(subcommand)]
        command: CommunityCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = fixly_core::load_app_config_from_env()?;
    init_tracing(&config.log_level);

    let tokens = TokenStore::new();
    let notifier: Arc<dyn NotificationSink> = Arc::new(notify::TerminalSink);
    let api = ApiClient::new(&config, tokens.clone(), notifier.clone())?;
    let mut session = SessionManager::new(&config, api, tokens);

    match cli.command {
        Some(Commands::Login { email, password }) => {
            auth::run_login(&mut session, &email, &password).await
        }
        Some(Commands::Logout) => auth::run_logout(&mut session).await,
        Some(Commands::Profile) => auth::run_profile(&mut session).await,
        Some(Commands::Book(args)) => book::run_book(&mut session, args).await,
        Some(Commands::Bookings { status, page }) => {
            bookings::run_bookings(&mut session, status, page).await
        }
        Some(Commands::Booking { id }) => bookings::run_booking(&mut session, &id).await,
        Some(Commands::Cancel { id, reason }) => {
            bookings::run_cancel(&mut session, &id, reason.as_deref()).await
        }
        Some(Commands::Message { id, text }) => {
            bookings::run_message(&mut session, &id, &text).await
        }
        Some(Commands::Watch { id }) => {
            watch::run_watch(&mut session, &config, notifier, &id).await
        }
        Some(Commands::Emergency { sos, description }) => {
            let source = location::FallbackLocation::from_config(&config);
            emergency::run_emergency(&mut session, &config, &source, sos, &description).await
        }
        Some(Commands::Community { command }) => {
            community::run_community(&mut session, command).await
        }
        None => {
            println!("nothing to do; try `fixly --help`");
            Ok(())
        }
    }
}

/// `RUST_LOG` wins; the configured level is the fallback.
fn init_tracing(default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
