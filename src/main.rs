//! Main entry point for the court-ratings tool
//!
//! Builds surface-aware Elo ratings, head-to-head counts and player profiles
//! from a match feed, and answers prediction, head-to-head and statistics
//! queries from the exported tables.

use anyhow::Result;
use clap::{Parser, Subcommand};
use court_ratings::config::{validate_config, AppConfig};
use court_ratings::service::{AppState, FeedOrder};
use court_ratings::types::{PlayerId, Surface};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

/// Court Ratings - surface-aware Elo ratings for head-to-head sports
#[derive(Parser)]
#[command(
    name = "court-ratings",
    version,
    about = "Surface-aware Elo ratings, head-to-head counts and player statistics",
    long_about = "Court Ratings replays a chronologically ordered match history into one Elo \
                 rating per player per surface plus an Overall rating, counts head-to-head wins \
                 between every pair of players, and answers win-probability queries from the \
                 exported tables."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        global = true,
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, global = true, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        global = true,
        help = "Validate configuration and exit without touching any data"
    )]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay the match feed and write every derived table
    Build {
        /// Match feed override
        #[arg(long, value_name = "FILE")]
        matches: Option<PathBuf>,

        /// Output directory override
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Reject a feed that is not already in date order instead of sorting it
        #[arg(long)]
        strict_order: bool,
    },

    /// Probability that player A beats player B
    Predict {
        #[arg(long, value_name = "ID")]
        player_a: PlayerId,

        #[arg(long, value_name = "ID")]
        player_b: PlayerId,

        /// Hard, Clay, Grass, Carpet or Overall
        #[arg(long, default_value = "Overall")]
        surface: Surface,

        /// Use Overall ratings when a player has no rating on the surface
        #[arg(long)]
        fallback_overall: bool,
    },

    /// Wins of each player over the other
    HeadToHead {
        #[arg(long, value_name = "ID")]
        player_a: PlayerId,

        #[arg(long, value_name = "ID")]
        player_b: PlayerId,
    },

    /// Career statistics of one player
    Stats {
        #[arg(long, value_name = "ID")]
        player: PlayerId,

        /// Number of most recent matches counted as recent form
        #[arg(long, value_name = "N")]
        recent_window: Option<usize>,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🎾 Court Ratings");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Matches: {}", config.data.matches_path.display());
    info!("   Output: {}", config.data.output_dir.display());
    info!(
        "   Elo: initial {} / K {}",
        config.rating.initial_rating, config.rating.k_factor
    );
    info!("   Recent form window: {}", config.stats.recent_form_window);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Command::Build {
        matches,
        output_dir,
        ..
    } = &args.command
    {
        if let Some(matches) = matches {
            config.data.matches_path = matches.clone();
        }
        if let Some(output_dir) = output_dir {
            config.data.output_dir = output_dir.clone();
        }
    }

    validate_config(&config)?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(app_state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Build { strict_order, .. } => {
            let order = if strict_order {
                FeedOrder::Strict
            } else {
                FeedOrder::Sort
            };
            let output = app_state.run_build(order).await?;
            info!(
                "✅ Ratings as of {:?}",
                AppState::ratings_as_of(&output.ratings)
            );
            print_json(&output.report)
        }
        Command::Predict {
            player_a,
            player_b,
            surface,
            fallback_overall,
        } => {
            let ratings = app_state.load_ratings()?;
            let prediction =
                AppState::predict(&ratings, player_a, player_b, surface, fallback_overall)?;
            print_json(&prediction)
        }
        Command::HeadToHead { player_a, player_b } => {
            let matrix = app_state.load_head_to_head()?;
            print_json(&AppState::head_to_head(&matrix, player_a, player_b)?)
        }
        Command::Stats {
            player,
            recent_window,
        } => print_json(&app_state.player_stats(player, recent_window)?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without touching any data");
        return Ok(());
    }

    display_startup_banner(&config);

    let app_state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&app_state, args.command).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
