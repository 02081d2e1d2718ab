//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::library::SortOption;

/// Promptly - guided prompt engineering with Chad
#[derive(Parser)]
#[command(
    name = "pl",
    version,
    about = "Guided prompt engineering: chat with Chad, build technique-based prompts, keep a library",
    after_help = "Logs are written to: ~/.local/share/promptly/logs/promptly.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Chat with Chad to build a prompt
    Chat {
        /// Library user to save prompts for (overrides library.user)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Detect a prompt section in an assistant message (reads stdin without FILE)
    Detect {
        /// File containing the message
        file: Option<PathBuf>,
    },

    /// Check whether a user reply confirms a pending refinement
    Confirm {
        /// The reply text
        #[arg(required = true)]
        text: String,
    },

    /// List the prompting techniques
    Techniques {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Infer the technique label for a set of section keys
    Infer {
        /// Section keys, in document order
        #[arg(required = true)]
        keys: Vec<String>,

        /// Explicitly selected technique
        #[arg(short, long)]
        technique: Option<String>,
    },

    /// Inspect and manage the prompt library
    Library {
        /// Library user (overrides library.user)
        #[arg(short, long)]
        user: Option<String>,

        #[command(subcommand)]
        command: LibraryCommand,
    },
}

/// Library subcommands
#[derive(Subcommand)]
pub enum LibraryCommand {
    /// List saved prompts (or templates)
    List {
        /// List templates instead of saved prompts
        #[arg(short, long)]
        templates: bool,

        /// Filter by name, content, or technique
        #[arg(short, long)]
        search: Option<String>,

        /// Sort order
        #[arg(long, default_value = "updated-desc")]
        sort: SortOption,
    },

    /// Show one entry with all of its sections
    Show {
        #[arg(required = true)]
        id: String,
    },

    /// Print an entry as plain text
    Copy {
        #[arg(required = true)]
        id: String,
    },

    /// Delete a saved prompt or template
    Delete {
        #[arg(required = true)]
        id: String,
    },

    /// Combine sections from several entries, given as ID:KEY
    Mix {
        #[arg(required = true, value_parser = parse_pick)]
        picks: Vec<(String, String)>,

        /// Save the mix as a new prompt with this name
        #[arg(long)]
        save_as: Option<String>,
    },
}

/// Parse an `ID:KEY` mixer pick
pub fn parse_pick(s: &str) -> Result<(String, String), String> {
    match s.rsplit_once(':') {
        Some((id, key)) if !id.is_empty() && !key.is_empty() => Ok((id.to_string(), key.to_string())),
        _ => Err(format!("Expected ID:KEY, got '{}'", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["pl"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_chat() {
        let cli = Cli::parse_from(["pl", "chat", "--user", "alice"]);
        assert!(matches!(cli.command, Some(Command::Chat { user: Some(ref u) }) if u == "alice"));
    }

    #[test]
    fn test_cli_parse_infer() {
        let cli = Cli::parse_from(["pl", "infer", "task", "actor", "-t", "taco"]);
        if let Some(Command::Infer { keys, technique }) = cli.command {
            assert_eq!(keys, vec!["task", "actor"]);
            assert_eq!(technique.as_deref(), Some("taco"));
        } else {
            panic!("Expected Infer command");
        }
    }

    #[test]
    fn test_cli_parse_library_list() {
        let cli = Cli::parse_from(["pl", "library", "-u", "bob", "list", "--sort", "name-asc"]);
        if let Some(Command::Library {
            user,
            command: LibraryCommand::List { templates, sort, search },
        }) = cli.command
        {
            assert_eq!(user.as_deref(), Some("bob"));
            assert!(!templates);
            assert_eq!(sort, SortOption::NameAsc);
            assert!(search.is_none());
        } else {
            panic!("Expected Library List command");
        }
    }

    #[test]
    fn test_cli_parse_mix() {
        let cli = Cli::parse_from(["pl", "library", "mix", "abc:task", "temp-1:output"]);
        if let Some(Command::Library {
            command: LibraryCommand::Mix { picks, save_as },
            ..
        }) = cli.command
        {
            assert_eq!(picks[1], ("temp-1".to_string(), "output".to_string()));
            assert!(save_as.is_none());
        } else {
            panic!("Expected Library Mix command");
        }
    }

    #[test]
    fn test_parse_pick() {
        assert!(parse_pick("abc").is_err());
        assert!(parse_pick(":task").is_err());
        assert_eq!(parse_pick("a:b:c").unwrap(), ("a:b".to_string(), "c".to_string()));
    }

    #[test]
    fn test_cli_with_config_and_log_level() {
        let cli = Cli::parse_from(["pl", "-c", "/path/to/promptly.yml", "--log-level", "debug", "techniques"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/promptly.yml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
