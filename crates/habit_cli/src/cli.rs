use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_DATABASE_PATH: &str = "./tracker.db";

#[derive(Parser)]
#[command(name = "habit", author, version, about = "Track daily habit completion")]
pub struct Cli {
    /// SQLite database file (created and migrated on first use)
    #[arg(long, env = "DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH, global = true)]
    pub database: PathBuf,
    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "HABIT_LOG_DIR", global = true)]
    pub log_dir: Option<String>,
    /// trace|debug|info|warn|error (defaults by build mode)
    #[arg(long, env = "HABIT_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List all habits with their entries
    List,
    /// Show one habit with its entries
    Get { id: String },
    /// Create a habit
    Create(HabitArgs),
    /// Replace a habit's name and description; color only when given
    Update {
        id: String,
        #[command(flatten)]
        fields: HabitArgs,
    },
    /// Soft-delete a habit
    Delete { id: String },
    /// List a habit's entries
    Entries { id: String },
    /// Flip completion for a day (default today)
    Toggle {
        id: String,
        /// Day as YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
    },
    /// Create or overwrite the entry for a day
    SetEntry {
        id: String,
        /// Day as YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        completed: bool,
        #[arg(long, default_value = "")]
        notes: String,
    },
}

#[derive(Args, Clone)]
pub struct HabitArgs {
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub description: String,
    /// Hex color, e.g. #10b981
    #[arg(long, default_value = "")]
    pub color: String,
}
