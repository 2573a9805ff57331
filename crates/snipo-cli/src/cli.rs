use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use snipo_core::models::{ConflictResolution, ConflictStrategy};

#[derive(Parser)]
#[command(name = "snipo")]
#[command(about = "Sync your snippet library with GitHub Gists")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or change sync settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Check a GitHub token and print the account it belongs to
    TestToken {
        /// Personal access token with the `gist` scope
        token: String,
    },
    /// Sync one snippet, or every linked snippet when no ID is given
    Sync {
        /// Snippet ID
        id: Option<String>,
    },
    /// Link a snippet (or all snippets) to a new gist
    Enable {
        /// Snippet ID
        id: Option<String>,
        /// Link every snippet that is not linked yet
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    /// Stop syncing a snippet
    Disable {
        /// Snippet ID
        id: String,
        /// Also delete the gist and forget the link
        #[arg(long)]
        delete_remote: bool,
    },
    /// List snippet/gist links
    Mappings {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a link without deleting the snippet or the gist
    Unlink {
        /// Snippet ID
        id: String,
    },
    /// List sync conflicts
    Conflicts {
        /// Include resolved conflicts
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a conflict by keeping one side
    Resolve {
        /// Conflict ID
        conflict_id: i64,
        /// Side to keep
        #[arg(long, value_enum)]
        keep: KeepSide,
    },
    /// Show the sync audit log
    Log {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the background auto-sync scheduler until interrupted
    Daemon,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update settings
    Set(ConfigSetArgs),
    /// Forget the stored token and reset settings
    Clear,
}

#[derive(Args, Debug, Default)]
pub struct ConfigSetArgs {
    /// Turn sync on or off
    #[arg(long, value_name = "BOOL")]
    pub enabled: Option<bool>,
    /// GitHub personal access token (verified, then stored encrypted)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,
    /// Turn background auto-sync on or off
    #[arg(long, value_name = "BOOL")]
    pub auto_sync: Option<bool>,
    /// Minutes between automatic passes (minimum 5)
    #[arg(long, value_name = "MINUTES")]
    pub interval: Option<u32>,
    /// How conflicts are settled during sync passes
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StrategyArg {
    Manual,
    LocalWins,
    RemoteWins,
    NewestWins,
}

impl From<StrategyArg> for ConflictStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Manual => Self::Manual,
            StrategyArg::LocalWins => Self::LocalWins,
            StrategyArg::RemoteWins => Self::RemoteWins,
            StrategyArg::NewestWins => Self::NewestWins,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KeepSide {
    Local,
    Remote,
}

impl From<KeepSide> for ConflictResolution {
    fn from(value: KeepSide) -> Self {
        match value {
            KeepSide::Local => Self::LocalWins,
            KeepSide::Remote => Self::RemoteWins,
        }
    }
}
