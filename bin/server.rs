// Team Scoreboard - Web Server

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use team_scoreboard::server::{router, AppState};
use team_scoreboard::{default_log_filter, default_roster, initialize_if_empty, open_database, setup_database, Config};

#[derive(Parser)]
#[command(name = "team-scoreboard-server")]
#[command(about = "Team scoreboard HTTP API", version)]
struct Args {
    /// Path to config file (defaults to ./scoreboard.toml if present)
    #[arg(short, long, env = "SCOREBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(short, long, env = "SCOREBOARD_BIND")]
    bind: Option<String>,

    /// Path to the ledger database (overrides the config file)
    #[arg(short, long, env = "SCOREBOARD_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter("team-scoreboard-server"))),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::resolve(args.config.as_deref()).context("Failed to load config")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(path) = args.database {
        config.database.path = path;
    }

    // Open database, create schema, seed on first start
    let mut conn = open_database(&config.database.path).context("Failed to open database")?;
    setup_database(&conn).context("Failed to create schema")?;
    initialize_if_empty(&mut conn, &default_roster(), &config.seed_teacher())
        .context("Failed to seed roster")?;
    info!(database = %config.database.path.display(), "database ready");

    let addr = config.server.bind.clone();
    if config.auth.require_session {
        info!("score entries require a session token");
    }

    let app = router(AppState::new(conn, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(%addr, "server listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
