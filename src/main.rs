// src/main.rs
// OakTree - AI study companion backend

use anyhow::Result;
use clap::{Parser, Subcommand};
use oaktree::{api, config::CONFIG, db, state::AppState};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "oaktree")]
#[command(about = "AI study companion backend: lesson quizzes, materials and teacher dashboards")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Interface to bind
        #[arg(long, env = "OAKTREE_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "OAKTREE_PORT")]
        port: Option<u16>,
    },

    /// Create or update the database schema and exit
    Migrate,
}

fn log_level(name: &str) -> Level {
    name.parse().unwrap_or(Level::INFO)
}

async fn run_server(host: Option<String>, port: Option<u16>) -> Result<()> {
    let pool = db::connect(&CONFIG.database_url, CONFIG.sqlite_max_connections).await?;
    let app_state = Arc::new(AppState::from_config(pool, &CONFIG));
    let app = api::build_app(app_state, &CONFIG.cors_origin);

    let bind_address = match (host, port) {
        (None, None) => CONFIG.bind_address(),
        (host, port) => format!(
            "{}:{}",
            host.unwrap_or_else(|| CONFIG.host.clone()),
            port.unwrap_or(CONFIG.port)
        ),
    };
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    info!("Model: {} via {}", CONFIG.model, CONFIG.chat_completions_url());
    info!("Storage: {}", CONFIG.storage_dir);
    info!("OakTree API listening on http://{}/api", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&CONFIG.log_level))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    if CONFIG.is_debug() {
        info!("Debug logging enabled");
    }

    match cli.command {
        Some(Commands::Migrate) => {
            db::connect(&CONFIG.database_url, 1).await?;
            info!("Migrations applied to {}", CONFIG.database_url);
            Ok(())
        }
        Some(Commands::Serve { host, port }) => run_server(host, port).await,
        None => run_server(None, None).await,
    }
}
