use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planboard::api::{self, middleware::SecurityConfig};
use planboard::{cli, db};

#[derive(Parser)]
#[command(name = "planboard")]
#[command(about = "Project planning server with user-ordered items")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Planboard server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,

        /// SQLite database file (defaults to the platform data directory)
        #[arg(long, env = "PLANBOARD_DATABASE")]
        database: Option<PathBuf>,
    },
    /// Inspect or change item order on a running server
    Order(cli::OrderArgs),
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "planboard=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(port: u16, bind: String, database: Option<PathBuf>) -> anyhow::Result<()> {
    let db = match database {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    let app = api::create_router_with_security(db.clone(), SecurityConfig::from_env());

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind, port)).await?;
    tracing::info!("Planboard server listening on http://{}:{}", bind, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    db.close()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve {
            port,
            bind,
            database,
        }) => serve(port, bind, database).await,
        Some(Commands::Order(args)) => cli::run(args).await,
        None => serve(3000, "127.0.0.1".to_string(), None).await,
    }
}
