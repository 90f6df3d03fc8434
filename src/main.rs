use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use team_scoreboard::{
    default_log_filter, default_roster, initialize_if_empty, open_database, recent_activity_feed,
    setup_database, teams_with_weekly_change, Config, ACTION_PRESETS,
};

#[derive(Parser)]
#[command(name = "team-scoreboard")]
#[command(about = "Team scoreboard admin tool", version)]
struct Args {
    /// Path to config file (defaults to ./scoreboard.toml if present)
    #[arg(short, long, env = "SCOREBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the ledger database (overrides the config file)
    #[arg(short, long, env = "SCOREBOARD_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the schema and seed the roster if the database is empty
    Init,
    /// Print every team with its total and its change over the last 7 days
    Standings,
    /// Print the most recent score entries
    Activity {
        /// Number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print the suggested actions and their points
    Actions,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter("team-scoreboard"))),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = Config::resolve(args.config.as_deref()).context("Failed to load config")?;
    if let Some(path) = args.database {
        config.database.path = path;
    }
    debug!(database = %config.database.path.display(), "configuration loaded");

    match args.command {
        Command::Init => run_init(&config),
        Command::Standings => run_standings(&config),
        Command::Activity { limit } => {
            run_activity(&config, limit.unwrap_or(config.feed_limit()))
        }
        Command::Actions => {
            run_actions();
            Ok(())
        }
    }
}

fn run_init(config: &Config) -> Result<()> {
    println!("🗄️  Initializing ledger database");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut conn = open_database(&config.database.path).context("Failed to open database")?;
    setup_database(&conn).context("Failed to create schema")?;
    println!("✓ Schema ready at {:?}", config.database.path);

    let seeded = initialize_if_empty(&mut conn, &default_roster(), &config.seed_teacher())
        .context("Failed to seed roster")?;

    if seeded {
        println!("✓ Seeded {} teams and teacher {}", default_roster().len(), config.seed.teacher_login);
    } else {
        println!("✓ Roster already present, nothing to do");
    }

    Ok(())
}

fn run_standings(config: &Config) -> Result<()> {
    let conn = open_database(&config.database.path).context("Failed to open database")?;
    let mut rows = teams_with_weekly_change(&conn, Utc::now()).context("Failed to compute standings")?;
    rows.sort_by(|a, b| b.team.total_score.cmp(&a.team.total_score));

    println!("🏆 Standings");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (rank, row) in rows.iter().enumerate() {
        println!(
            "{:>2}. {:<16} {:>7} pts  ({:+} this week)",
            rank + 1,
            row.team.name,
            row.team.total_score,
            row.recent_change
        );
    }

    Ok(())
}

fn run_activity(config: &Config, limit: usize) -> Result<()> {
    let conn = open_database(&config.database.path).context("Failed to open database")?;
    let feed = recent_activity_feed(&conn, limit).context("Failed to load activity")?;

    println!("📒 Recent activity");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if feed.is_empty() {
        println!("(no entries yet)");
    }
    for row in &feed {
        println!(
            "{}  {:<16} {:>+5}  {}",
            row.entry.timestamp.format("%Y-%m-%d %H:%M"),
            row.team.name,
            row.entry.points,
            row.entry.action
        );
    }

    Ok(())
}

fn run_actions() {
    for preset in ACTION_PRESETS {
        println!("{:>+5}  {}", preset.points, preset.action);
    }
}
