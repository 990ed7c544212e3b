use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use headlines::client::{ApiClient, PageRequest};
use headlines::config::Config;
use headlines::controller::{FeedController, FeedEvent};
use headlines::ui;

/// Get the default config file path (~/.config/headlines/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("headlines")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "headlines", about = "Browse top news headlines from the terminal")]
struct Args {
    /// Path to the config file (default: ~/.config/headlines/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Category for the initial load (overrides the config default)
    #[arg(long)]
    category: Option<String>,

    /// Search query for the initial load
    #[arg(long)]
    query: Option<String>,

    /// Fetch a single page, print it, and exit (for scripting)
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let client = Arc::new(ApiClient::new(&config)?);
    let category = args
        .category
        .unwrap_or_else(|| config.default_category.clone());

    if args.once {
        let request = PageRequest {
            category,
            query: args.query.unwrap_or_default(),
            page: 1,
        };
        let articles = client
            .top_headlines(&request)
            .await
            .context("Failed to fetch headlines")?;
        if articles.is_empty() {
            println!("No articles found.");
        } else {
            ui::print_articles(&articles);
        }
        return Ok(());
    }

    let (event_tx, event_rx) = mpsc::channel::<FeedEvent>(32);
    let mut controller = FeedController::new(client, category, event_tx);
    if let Some(query) = args.query {
        controller.set_query(query);
    }

    ui::run(&mut controller, event_rx).await
}
