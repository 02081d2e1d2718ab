//! Promptly - guided prompt-engineering assistant
//!
//! CLI entry point for chatting with Chad and managing the prompt library.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use promptstore::{EntryKind, LibraryStore, NewPrompt};
use tracing::{info, warn};

use promptly::chat::{ChatRepl, ChatSession};
use promptly::cli::{Cli, Command, LibraryCommand};
use promptly::config::Config;
use promptly::library::{self, Mixer, SortOption};
use promptly::llm::{self, LlmClient};
use promptly::prompts::PromptLoader;
use promptly::reconcile::Reconciler;
use promptly::sections::{PatternDetector, SectionDetector, is_confirming};
use promptly::state::WorkspaceManager;
use promptly::technique::{all_techniques, infer};

fn setup_logging(level: tracing::Level) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptly")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Log to a file so the REPL output stays clean
    let log_file = fs::File::create(log_dir.join("promptly.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

/// `--log-level` wins over the config file; INFO otherwise
fn resolve_log_level(cli_level: Option<&str>, config_level: Option<&str>) -> tracing::Level {
    cli_level
        .or(config_level)
        .and_then(|l| l.parse().ok())
        .unwrap_or(tracing::Level::INFO)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(resolve_log_level(cli.log_level.as_deref(), config.log_level.as_deref()))
        .context("Failed to setup logging")?;

    info!(active = ?config.llm.active, "Promptly loaded config");

    match cli.command {
        Some(Command::Chat { user }) => cmd_chat(&config, user).await,
        Some(Command::Detect { file }) => cmd_detect(file),
        Some(Command::Confirm { text }) => cmd_confirm(&text),
        Some(Command::Techniques { json }) => cmd_techniques(json),
        Some(Command::Infer { keys, technique }) => cmd_infer(&keys, technique.as_deref()),
        Some(Command::Library { user, command }) => cmd_library(&config, user, command),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Open the library for the CLI user or the configured default user
fn open_library(config: &Config, user: Option<String>) -> Result<Option<LibraryStore>> {
    let Some(user) = user.or_else(|| config.library.user.clone()) else {
        return Ok(None);
    };
    let mut store = LibraryStore::open(&config.library.store_path)
        .with_context(|| format!("Failed to open library at {}", config.library.store_path.display()))?;
    store.init_user(&user).context("Failed to load library")?;
    Ok(Some(store))
}

async fn cmd_chat(config: &Config, user: Option<String>) -> Result<()> {
    let llm: Option<Arc<dyn LlmClient>> = match config.llm.resolve() {
        Ok(resolved) => Some(llm::create_client(&resolved).map_err(|e| eyre!("Failed to create LLM client: {}", e))?),
        Err(e) => {
            warn!(error = %e, "Chat starting without an LLM provider");
            None
        }
    };

    let library = open_library(config, user)?;
    let workspace = WorkspaceManager::spawn(Reconciler::with_detector(
        Box::new(PatternDetector::new()),
        config.chat.reset_marker.clone(),
    ));
    let prompts = PromptLoader::new(std::env::current_dir()?);

    let session = ChatSession::new(workspace, llm, prompts, &config.chat, config.llm.max_tokens)?;
    ChatRepl::new(session, library).run().await
}

fn cmd_detect(file: Option<PathBuf>) -> Result<()> {
    let message = match file {
        Some(path) => fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
            buf
        }
    };

    let detection = PatternDetector::new().detect(&message);
    println!("{}", serde_json::to_string_pretty(&detection)?);
    Ok(())
}

fn cmd_confirm(text: &str) -> Result<()> {
    println!("{}", is_confirming(text));
    Ok(())
}

fn cmd_techniques(json: bool) -> Result<()> {
    let techniques = all_techniques();
    if json {
        let value: Vec<serde_json::Value> = techniques
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "name": t.name,
                    "description": t.description,
                    "recommendation": t.recommendation,
                    "sections": t.sections.iter().map(|s| serde_json::json!({
                        "key": s.key,
                        "label": s.label,
                        "description": s.description,
                        "required": s.required,
                        "placeholder": s.placeholder,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for t in techniques {
        println!("{} {}", t.name.bright_cyan().bold(), format!("({})", t.id).dimmed());
        println!("  {}", t.description);
        for s in t.sections {
            let marker = if s.required { "*" } else { " " };
            println!("  {} {:16} {}", marker, s.key.yellow(), s.description);
        }
        println!();
    }
    Ok(())
}

fn cmd_infer(keys: &[String], technique: Option<&str>) -> Result<()> {
    let inference = infer(keys.iter().map(String::as_str), technique);
    println!("{}", inference.label());
    Ok(())
}

fn cmd_library(config: &Config, user: Option<String>, command: LibraryCommand) -> Result<()> {
    let mut store = open_library(config, user)?
        .ok_or_else(|| eyre!("No library user: pass --user or set library.user in promptly.yml"))?;

    match command {
        LibraryCommand::List { templates, search, sort } => {
            let entries = if templates { store.templates() } else { store.saved_prompts() };
            list_entries(entries, search.as_deref().unwrap_or(""), sort);
        }
        LibraryCommand::Show { id } => {
            let (kind, entry) = store.find(&id).ok_or_else(|| eyre!("Not found: {}", id))?;
            println!("{} {}", entry.name.bright_cyan().bold(), format!("[{}]", kind).dimmed());
            println!("{} {}", "Technique:".dimmed(), library::entry_technique(entry));
            if let Some(description) = &entry.description {
                println!("{} {}", "Description:".dimmed(), description);
            }
            println!();
            println!("{}", library::format_entry(entry));
        }
        LibraryCommand::Copy { id } => {
            let (_, entry) = store.find(&id).ok_or_else(|| eyre!("Not found: {}", id))?;
            println!("{}", library::format_entry(entry));
        }
        LibraryCommand::Delete { id } => {
            let deleted = match store.find(&id).map(|(kind, _)| kind) {
                Some(EntryKind::Prompt) => store.delete_prompt(&id)?,
                Some(EntryKind::Template) => store.delete_template(&id)?,
                None => false,
            };
            if !deleted {
                return Err(eyre!("Not found: {}", id));
            }
            println!("Deleted {}", id);
        }
        LibraryCommand::Mix { picks, save_as } => {
            let mut mixer = Mixer::new();
            for (id, key) in &picks {
                mixer.toggle(id, key);
            }
            let mut doc = mixer.mix(&store);
            if doc.is_empty() {
                return Err(eyre!("Nothing to mix: no selected section has content"));
            }
            match save_as {
                Some(name) => {
                    doc.set_name(name);
                    let record: NewPrompt = library::to_new_prompt(&doc);
                    let id = store.add_prompt(record)?.ok_or_else(|| eyre!("No active library user"))?;
                    println!("Saved mix as {}", id);
                }
                None => println!("{}", library::format_view(&doc.view())),
            }
        }
    }
    Ok(())
}

fn list_entries(entries: &[promptstore::SavedPrompt], query: &str, sort: SortOption) {
    let found = library::search(entries, query, sort);
    if found.is_empty() {
        println!("{}", "No entries.".dimmed());
        return;
    }
    let now = promptstore::now_ms();
    for entry in found {
        println!(
            "{}  {}  {}  {}",
            entry.id.dimmed(),
            entry.name.bold(),
            library::entry_technique(entry).yellow(),
            library::relative_time(entry.updated_at, now).dimmed()
        );
    }
}
