//! CLI definitions for parley.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// parley CLI.
#[derive(Parser)]
#[command(name = "parley")]
#[command(about = "Message and compose-box translation pipeline for web chat clients")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Translate text, cache first
    Translate {
        /// Text to translate
        text: String,

        /// Use the compose-box direction and cache
        #[arg(long)]
        input: bool,
    },

    /// Translation cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Translation history lookups
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Saved contact records
    Contacts {
        #[command(subcommand)]
        action: ContactsAction,
    },

    /// Run a full session against a recorded page fixture
    Replay {
        /// Fixture file (JSON)
        fixture: PathBuf,

        /// Answer from the fixture's translations instead of the remote endpoint
        #[arg(long)]
        offline: bool,

        /// Print the final document outline
        #[arg(long)]
        render: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Show entry counts
    Stats,

    /// Remove expired entries
    Purge,

    /// Remove every entry
    Clear {
        /// Clear the compose-box cache instead of the message cache
        #[arg(long)]
        input: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum HistoryAction {
    /// Show the recorded translation of a message text
    Get {
        /// Message text as displayed
        text: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum ContactsAction {
    /// List saved contacts
    List {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Show one contact's saved messages
    Show {
        /// Contact identifier
        contact_id: String,
    },

    /// Import records from a JSON array
    Import {
        /// File holding `[{"contact_id": ..., "messages": [...], "updated_at": ...}]`
        file: PathBuf,
    },

    /// Remove every saved contact
    Clear,
}
