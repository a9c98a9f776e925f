//! adk-chat - chat front ends for deployed Vertex AI Reasoning Engines

mod chat;
mod logging;
mod server;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use adk_chat_core::auth;
use adk_chat_core::engine::ReasoningEngineClient;
use adk_chat_core::Config;

#[derive(Parser)]
#[command(
    name = "adk-chat",
    about = "Chat with a deployed Vertex AI Reasoning Engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the web chat page and relay endpoint (default)
    Serve {
        /// Listen port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Chat interactively from the terminal
    Chat {
        /// Engine resource name (overrides REASONING_ENGINE)
        #[arg(long)]
        engine: Option<String>,
        /// Stable user identifier for the conversation
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let mut config = Config::from_env();

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            // Inline credentials must be on disk before the first token request
            auth::materialize_inline_credentials()?;
            let client = Arc::new(ReasoningEngineClient::new(auth::default_source())?);
            let handle = tokio::runtime::Handle::current();
            tokio::task::spawn_blocking(move || server::run(&config, client, handle)).await??;
        }
        Command::Chat { engine, user } => {
            let engine = engine.unwrap_or_else(|| config.default_engine.clone());
            let user = user.unwrap_or_else(|| format!("anon-{}", uuid::Uuid::new_v4()));
            let client = ReasoningEngineClient::new(auth::default_source())?;
            chat::run(&client, &engine, &user).await?;
        }
    }

    Ok(())
}
