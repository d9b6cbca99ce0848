use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};

use lounge_level::{ActivityStats, LevelTable, LevelUpBus, LevelUpEvent, LevelingConfig};

mod cli;

#[derive(Parser)]
#[command(name = "lounge-level")]
#[command(about = "Experience and level administration for the Lounge community")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.lounge-level/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the level database (defaults to ~/.lounge-level/levels.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Print the experience threshold of every level
    Table,

    /// Show a user's level, progress and stats
    Show {
        user_id: u64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recompute a user's level from authoritative activity counts
    Recompute {
        user_id: u64,

        #[command(flatten)]
        stats: StatsArgs,
    },

    /// Set a user's exp directly (stats are left untouched)
    SetExp { user_id: u64, exp: u64 },

    /// Grant achievements the user newly qualifies for
    Achievements { user_id: u64 },

    /// Show the top users by exp
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Reset every user to level 1 (irreversible)
    ResetAll {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct StatsArgs {
    #[arg(long, default_value_t = 0)]
    posts: u64,
    #[arg(long, default_value_t = 0)]
    comments: u64,
    #[arg(long, default_value_t = 0)]
    likes: u64,
    #[arg(long, default_value_t = 0)]
    promotions: u64,
    #[arg(long, default_value_t = 0)]
    bookmarks: u64,
    #[arg(long, default_value_t = 0)]
    excellent: u64,
}

impl From<StatsArgs> for ActivityStats {
    fn from(args: StatsArgs) -> Self {
        Self {
            total_likes: args.likes,
            story_promotions: args.promotions,
            total_bookmarks: args.bookmarks,
            total_posts: args.posts,
            total_comments: args.comments,
            excellent_posts: args.excellent,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config_path = cli.config.unwrap_or_else(LevelingConfig::global_config_path);
    let db_path = cli.db.unwrap_or_else(LevelingConfig::global_db_path);

    if let Commands::Init { force } = cli.command {
        return cli::init::init_command(&config_path, force);
    }

    let config = LevelingConfig::load_or_default(&config_path)?;

    if let Commands::Table = cli.command {
        cli::table::table_command(&LevelTable::new(&config.tiers));
        return Ok(());
    }

    let bus = LevelUpBus::default();
    let celebrations = tokio::spawn(celebrate(bus.subscribe()));
    let ledger = cli::open_ledger(&config, &db_path, Arc::new(bus))?;

    let result = match cli.command {
        Commands::Show { user_id, json } => cli::user::show_command(&ledger, user_id, json),
        Commands::Recompute { user_id, stats } => {
            cli::user::recompute_command(&ledger, user_id, stats.into())
        }
        Commands::SetExp { user_id, exp } => cli::admin::set_exp_command(&ledger, user_id, exp),
        Commands::Achievements { user_id } => cli::user::achievements_command(&ledger, user_id),
        Commands::Leaderboard { limit } => cli::user::leaderboard_command(&ledger, limit),
        Commands::ResetAll { yes } => cli::admin::reset_all_command(&ledger, yes),
        Commands::Init { .. } | Commands::Table => Ok(()),
    };

    // Dropping the ledger closes the bus so the celebration task drains and exits
    drop(ledger);
    if let Err(e) = celebrations.await {
        tracing::warn!(error = %e, "Level-up listener stopped abnormally");
    }

    result
}

/// Print a line for every level-up until the bus closes
async fn celebrate(mut rx: broadcast::Receiver<LevelUpEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => println!(
                "🎉 User {} reached level {} (was {})",
                event.user_id, event.new_level, event.old_level
            ),
            Err(RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Level-up listener fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
