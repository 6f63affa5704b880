pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blogger-tracker")]
#[command(about = "Track interaction counts on bloggers' Xiaohongshu posts", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/blogger-tracker/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a blogger
    Add {
        /// Display name of the blogger
        nickname: String,
        /// Link to the post whose interactions are tracked
        #[arg(short, long)]
        link: Option<String>,
    },
    /// Remove a blogger and its history
    Remove {
        /// Id of the blogger to remove
        id: i64,
    },
    /// List bloggers with their latest interaction counts
    List,
    /// Refresh interaction counts in the browser
    Refresh {
        /// Only refresh these blogger ids (repeatable)
        #[arg(long = "id")]
        ids: Vec<i64>,

        /// Show the browser window, needed for the first manual login
        #[arg(long, conflicts_with = "headless")]
        headful: bool,

        /// Run the browser without a window
        #[arg(long)]
        headless: bool,

        /// Leave the browser open after the batch
        #[arg(long)]
        keep_open: bool,

        /// Print progress events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Show recorded interaction history of a blogger
    History {
        /// Id of the blogger
        id: i64,
        /// How many days back to show
        #[arg(short, long, default_value_t = commands::DEFAULT_HISTORY_DAYS)]
        days: i64,
    },
}
