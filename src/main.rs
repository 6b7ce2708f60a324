// This is the entry point of answerbot.
//
// **Architecture Overview:**
// - `core/` = Matching and knowledge logic (no files, no HTTP, no terminal)
// - `infra/` = Implementations of core traits (JSON file store, embedding API)
// - `interface/` = Front ends (terminal chat loop, HTTP API)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Hand the service to the chosen front end

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "interface/interface_layer.rs"]
mod interface;

mod config;

use crate::config::AppConfig;
use crate::core::knowledge::{KnowledgeService, Matcher};
use crate::infra::knowledge::{JsonKnowledgeStore, OpenAiEmbeddingClient};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Answers questions it has been taught, and asks to be taught the rest.
#[derive(Debug, Parser)]
#[command(name = "answerbot", version)]
struct Cli {
    /// Knowledge base file (overrides KNOWLEDGE_BASE_PATH)
    #[arg(long, global = true)]
    knowledge_base: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chat in the terminal (default)
    Chat,
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first so RUST_LOG from it is honoured
    dotenv::dotenv().ok();

    // Logs go to stderr; stdout belongs to the chat loop
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(path) = cli.knowledge_base {
        config.knowledge_base_path = path;
    }

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // A broken embedder or a corrupt knowledge base stops us here, before
    // any front end starts.

    let embedder = OpenAiEmbeddingClient::new(config.embedding.clone())
        .context("Failed to create embedding client")?;
    let store = JsonKnowledgeStore::new(&config.knowledge_base_path);
    let matcher = Matcher::with_threshold(embedder, config.match_threshold);

    tracing::info!(
        model = %config.embedding.model,
        url = %config.embedding.base_url,
        "Connecting to embedding provider"
    );
    let service = Arc::new(
        KnowledgeService::start(matcher, store)
            .await
            .context("Failed to start knowledge service")?,
    );

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            interface::cli::run_chat(service.as_ref(), stdin, tokio::io::stdout()).await?;
        }
        Command::Serve { bind } => {
            interface::http::serve(service, bind).await?;
        }
    }

    Ok(())
}
