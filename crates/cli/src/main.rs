//! FieldVoice CLI — the main entry point.
//!
//! Commands:
//! - `ask`     — Send one message and print the answer
//! - `chat`    — Interactive conversation
//! - `config`  — Show, locate, initialize or validate configuration
//! - `doctor`  — Diagnose configuration and collaborators

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "fieldvoice",
    about = "FieldVoice — conversational agronomy assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question
    Ask {
        /// The message to send
        message: String,

        #[command(flatten)]
        session: commands::SessionArgs,

        /// Continue an existing conversation
        #[arg(short, long)]
        conversation: Option<String>,

        /// Print the full turn outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive conversation
    Chat {
        #[command(flatten)]
        session: commands::SessionArgs,

        /// Continue an existing conversation
        #[arg(short, long)]
        conversation: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration and collaborators
    Doctor,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
    /// Validate the config file
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Ask {
            message,
            session,
            conversation,
            json,
        } => commands::ask::run(message, session, conversation, json).await?,
        Commands::Chat {
            session,
            conversation,
        } => commands::chat::run(session, conversation).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Init => commands::config_cmd::init().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
