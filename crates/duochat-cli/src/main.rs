//! Duochat CLI — entry point.
//!
//! # Commands
//!
//! - `duochat chat [-m MESSAGE] [--image PATH] [--file PATH]` — single-shot or REPL
//! - `duochat setup [--provider P] [--api-key KEY]` — choose provider and key
//! - `duochat status` — show configuration and device capabilities

mod helpers;
mod repl;
mod setup;
mod status;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use duochat_chat::collectors::{load_document, load_image};
use duochat_chat::{Capabilities, Conversation};
use duochat_core::config::{load_config, Config};
use duochat_core::types::{ProviderKind, UserInput};
use duochat_providers::HttpProviderFactory;

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Duochat — chat with OpenAI or Gemini from the terminal
#[derive(Parser)]
#[command(name = "duochat", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the configured provider (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// Attach an image to the single message
        #[arg(long)]
        image: Option<String>,

        /// Attach a PDF or text document to the single message
        #[arg(long)]
        file: Option<String>,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Choose the provider and store its API key
    Setup {
        /// Provider to use (openai or gemini)
        #[arg(long)]
        provider: Option<ProviderKind>,

        /// API key for the provider
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Show configuration and device status
    Status,
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            message,
            image,
            file,
            logs,
        } => {
            init_logging(logs);
            run_chat(message, image, file).await
        }
        Commands::Setup { provider, api_key } => setup::run(provider, api_key),
        Commands::Status => status::run(),
    }
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(message: Option<String>, image: Option<String>, file: Option<String>) -> Result<()> {
    let config = load_config(None);
    let conversation = build_conversation(&config);

    if message.is_none() && image.is_none() && file.is_none() {
        let capabilities = Capabilities::probe(&config);
        return repl::run(conversation, config, capabilities).await;
    }

    // Single-shot mode
    let mut input = UserInput::text(message_text(message.as_deref()));
    if let Some(path) = image {
        let path = helpers::expand_tilde(&path);
        input = input.with_image(load_image(&path).await.context("failed to attach image")?);
    }
    if let Some(path) = file {
        let path = helpers::expand_tilde(&path);
        input = input.with_file(load_document(&path).await.context("failed to attach file")?);
    }

    info!(provider = config.provider.name(), "sending single message");
    let reply = conversation
        .send(input, &config.api_config())
        .await
        .map_err(helpers::send_error)?;
    helpers::print_reply(&reply, config.provider);

    Ok(())
}

/// Typed text for a single-shot send, trimmed like REPL input.
fn message_text(message: Option<&str>) -> String {
    message.map(str::trim).unwrap_or_default().to_string()
}

/// Build a `Conversation` wired to the real HTTP adapters.
pub fn build_conversation(config: &Config) -> Conversation {
    Conversation::new(Arc::new(HttpProviderFactory::new(config.providers.clone())))
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("duochat=debug,duochat_core=debug,duochat_providers=debug,duochat_chat=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
