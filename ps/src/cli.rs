//! CLI argument parsing for promptstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "promptstore")]
#[command(author, version, about = "Inspect a user's prompt library", long_about = None)]
pub struct Cli {
    /// Library directory (default: platform data dir)
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// User whose library to open
    #[arg(short, long)]
    pub user: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List saved prompts and templates
    List {
        /// Only list templates
        #[arg(short, long)]
        templates: bool,
    },

    /// Show one entry with all of its sections
    Show {
        /// Prompt or template id
        #[arg(required = true)]
        id: String,
    },

    /// Dump the whole library as JSON
    Export,

    /// Delete a prompt or template
    Delete {
        /// Prompt or template id
        #[arg(required = true)]
        id: String,
    },
}

/// Default library location shared with the `pl` binary
pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptly")
        .join("library")
}
