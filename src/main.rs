use std::fs;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use repowatch::config::ServerConfig;
use repowatch::server::{AppState, create_router};
use repowatch::store::SqliteStore;

#[derive(Parser)]
#[command(name = "repowatch")]
#[command(about = "A webhook ingestion server for mirroring GitHub repository state", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Shared webhook secret. When set, deliveries must carry the
        /// x-webhook-signature and x-webhook-timestamp headers. Falls back
        /// to the REPOWATCH_WEBHOOK_SECRET environment variable.
        #[arg(long)]
        webhook_secret: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("repowatch=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            data_dir,
            webhook_secret,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                webhook_secret: webhook_secret
                    .or_else(|| std::env::var("REPOWATCH_WEBHOOK_SECRET").ok()),
            };

            fs::create_dir_all(&config.data_dir)?;

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;

            if config.webhook_secret.is_none() {
                tracing::warn!(
                    "No webhook secret configured; accepting unsigned deliveries"
                );
            }

            let state = Arc::new(AppState {
                store: Arc::new(store),
                webhook_secret: config.webhook_secret.clone(),
            });

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
