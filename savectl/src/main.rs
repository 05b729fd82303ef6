//! savectl - inspect and edit the game's persistence from the command line.
//!
//! Drives the same stores the game uses:
//! - **save slots** in the SQLite save database (`save`, `load`, `slots`,
//!   `delete-slot`, `weapons`)
//! - **best times** in the JSON leaderboard (`score ...`)
//!
//! Paths come from [`game_persistence::config`]; `--data-dir` and
//! `--retention` override the environment.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use game_persistence::leaderboard::{DeleteOutcome, InsertOutcome, ScoreEntry, ScoreValue};
use game_persistence::saves::{PlayerSnapshot, SlotSnapshot};
use game_persistence::{config, RetentionPolicy, SaveRepository};

/// Top-level CLI arguments.
#[derive(Parser)]
#[command(name = "savectl", about = "Manage beat 'em up save slots and best times")]
struct Cli {
    /// Data directory (defaults to BEATEMUP_DATA_DIR, then ~/.local/share/beatemup).
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Leaderboard retention: `keep-all` or `best-only`.
    #[arg(long, global = true)]
    retention: Option<RetentionPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Slot(SlotCommand),
    /// Work with the best-times leaderboard.
    Score {
        #[command(subcommand)]
        action: ScoreAction,
    },
}

#[derive(Subcommand)]
enum SlotCommand {
    /// Replace a save slot.
    Save {
        #[arg(short, long)]
        slot: u32,
        #[arg(short, long)]
        location: String,
        /// Playtime in seconds.
        #[arg(long, default_value_t = 0)]
        playtime: u32,
        /// A player as `NAME:HEALTH[:WEAPON]`. Repeat for each player.
        #[arg(short, long = "player", value_parser = parse_player)]
        players: Vec<PlayerSnapshot>,
    },
    /// Print a save slot.
    Load {
        #[arg(short, long)]
        slot: u32,
    },
    /// List occupied save slots.
    Slots,
    /// Remove a save slot and its players.
    DeleteSlot {
        #[arg(short, long)]
        slot: u32,
    },
    /// List the weapon catalog.
    Weapons,
}

#[derive(Subcommand)]
enum ScoreAction {
    /// Record a completion time in seconds.
    Insert { seconds: f64 },
    /// Show the fastest times.
    Top {
        #[arg(short, default_value_t = 10, allow_negative_numbers = true)]
        n: i64,
    },
    /// Show the single fastest time.
    Best,
    /// Show every stored entry in stored order.
    List,
    /// Show the times recorded for one player (older files only).
    Player { name: String },
    /// Show where the leaderboard lives and how it is kept.
    Info,
    /// Delete the first entry with this time.
    Delete { seconds: f64 },
    /// Remove every entry.
    Clear,
}

/// Parse `NAME:HEALTH[:WEAPON]`.
fn parse_player(s: &str) -> Result<PlayerSnapshot, String> {
    let mut parts = s.splitn(3, ':');
    let name = parts.next().unwrap_or_default();
    let health = parts
        .next()
        .ok_or_else(|| format!("expected NAME:HEALTH[:WEAPON], got '{}'", s))?;
    let health: u32 = health
        .parse()
        .map_err(|e| format!("invalid health '{}': {}", health, e))?;
    let weapon = parts.next().filter(|w| !w.is_empty());
    Ok(PlayerSnapshot::new(name, health, weapon))
}

/// Format seconds as `MM:SS.cc`, the way the in-game timer shows them.
fn format_time(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let hundredths = (seconds * 100.0 % 100.0).floor() as u64;
    format!("{:02}:{:02}.{:02}", minutes, secs, hundredths)
}

fn format_value(value: Option<&ScoreValue>) -> String {
    match value {
        Some(v) => match v.as_seconds() {
            Some(secs) => format_time(secs),
            None => v.to_string(),
        },
        None => "-".to_string(),
    }
}

fn print_entries(entries: &[ScoreEntry]) {
    if entries.is_empty() {
        println!("No scores");
        return;
    }
    for (rank, entry) in entries.iter().enumerate() {
        println!(
            "{:>3}. {:>10}  {}",
            rank + 1,
            format_value(entry.value.as_ref()),
            entry.timestamp
        );
    }
}

async fn run_saves(data_dir: &std::path::Path, command: SlotCommand) -> anyhow::Result<()> {
    let (db, repo) = game_persistence::open_save_repository(data_dir)
        .await
        .context("failed to open save database")?;

    match command {
        SlotCommand::Save {
            slot,
            location,
            playtime,
            players,
        } => {
            let snapshot = SlotSnapshot::new(location, players).with_playtime(playtime);
            repo.save_slot(slot, &snapshot).await?;
            println!("Saved slot {}", slot);
        }
        SlotCommand::Load { slot } => match repo.load_slot(slot).await? {
            Some(saved) => {
                println!(
                    "Slot {} at {} ({}s played, saved {})",
                    saved.slot,
                    saved.snapshot.location,
                    saved.snapshot.playtime_secs,
                    saved.last_saved
                );
                for player in &saved.snapshot.players {
                    println!(
                        "  {:<12} hp {:>3}  {}",
                        player.name,
                        player.health,
                        player.weapon_label()
                    );
                }
            }
            None => println!("Slot {} is empty", slot),
        },
        SlotCommand::Slots => {
            for s in repo.list_slots().await? {
                println!(
                    "{:>3}  {:<20} {:>6}s  {} player(s)  {}",
                    s.slot, s.location, s.playtime_secs, s.player_count, s.last_saved
                );
            }
        }
        SlotCommand::DeleteSlot { slot } => {
            if repo.delete_slot(slot).await? {
                println!("Deleted slot {}", slot);
            } else {
                println!("Slot {} is empty", slot);
            }
        }
        SlotCommand::Weapons => {
            for w in repo.list_weapons().await? {
                println!("{:>3}  {}", w.id, w.name);
            }
        }
    }

    db.close().await;
    Ok(())
}

async fn run_scores(
    data_dir: &std::path::Path,
    retention: RetentionPolicy,
    action: ScoreAction,
) -> anyhow::Result<()> {
    let mut store = game_persistence::open_leaderboard(data_dir, retention);
    tracing::debug!("Leaderboard file: {}", store.path().display());

    match action {
        ScoreAction::Insert { seconds } => match store.insert_score(Some(seconds)).await? {
            InsertOutcome::Appended => println!("Recorded {}", format_time(seconds)),
            InsertOutcome::NewBest { .. } => println!("New best time: {}", format_time(seconds)),
            InsertOutcome::NotBetter { best } => {
                println!("Best time is still {}", format_value(Some(&best)))
            }
        },
        ScoreAction::Top { n } => print_entries(&store.top_n(n).await),
        ScoreAction::Best => println!("{}", format_value(store.high_score().await.as_ref())),
        ScoreAction::List => print_entries(&store.all_scores().await),
        ScoreAction::Player { name } => print_entries(&store.scores_for_player(&name).await),
        ScoreAction::Info => {
            store.load().await;
            println!("File:      {}", store.path().display());
            println!("Retention: {}", store.retention());
            println!("Entries:   {}", store.all_scores().await.len());
        }
        ScoreAction::Delete { seconds } => match store.delete_score(seconds).await? {
            DeleteOutcome::Deleted => println!("Deleted {}", format_time(seconds)),
            DeleteOutcome::NotFound => println!("No score of {} found", format_time(seconds)),
        },
        ScoreAction::Clear => {
            store.clear().await?;
            println!("Leaderboard cleared");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(config::get_data_dir);
    let retention = cli.retention.unwrap_or_else(config::get_retention_policy);
    tracing::info!("Using data directory: {}", data_dir.display());

    match cli.command {
        Commands::Score { action } => run_scores(&data_dir, retention, action).await,
        Commands::Slot(command) => run_saves(&data_dir, command).await,
    }
}
