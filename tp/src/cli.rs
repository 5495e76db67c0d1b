//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TripPlanner - AI trip itinerary planner
#[derive(Parser)]
#[command(
    name = "tp",
    about = "Generate, save and revisit day-by-day trip itineraries",
    version,
    after_help = "Logs are written to: ~/.local/share/tripplanner/logs/tripplanner.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Generate an itinerary
    Plan {
        /// Where to go
        #[arg(short, long)]
        destination: String,

        /// First day of the trip (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,

        /// Last day of the trip (YYYY-MM-DD)
        #[arg(short, long)]
        end: String,

        /// Interest to plan around (repeatable)
        #[arg(short, long = "interest", value_name = "INTEREST")]
        interests: Vec<String>,

        /// Budget level, e.g. low, medium, high
        #[arg(short, long, default_value = "medium")]
        budget: String,

        /// Save the plan after generating it
        #[arg(long)]
        save: bool,

        /// Require every day and activity field
        #[arg(long)]
        strict: bool,

        /// Show only this day (1-based)
        #[arg(long)]
        day: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Work with saved plans
    Saved {
        #[command(subcommand)]
        command: SavedCommand,
    },

    /// List the predefined interests
    Interests,

    /// Show the identity plans are saved under
    Whoami,
}

/// Saved plan subcommands
#[derive(Subcommand)]
pub enum SavedCommand {
    /// List saved plans, newest first
    List {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a saved plan
    Show {
        /// Plan identifier
        id: String,

        /// Show only this day (1-based)
        #[arg(long)]
        day: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the saved plan list whenever it changes, until Ctrl-C
    Watch,
}

/// Output format for itineraries and plan lists
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Convert a 1-based day option into a display position
pub fn day_position(day: Option<usize>) -> Result<Option<usize>, String> {
    match day {
        Some(0) => Err("Day numbers start at 1".to_string()),
        Some(n) => Ok(Some(n - 1)),
        None => Ok(None),
    }
}
