use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use promptstore::cli::{Cli, Command, default_store_path};
use promptstore::{EntryKind, LibraryStore, SavedPrompt};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn print_entry_line(kind: EntryKind, entry: &SavedPrompt) {
    println!(
        "{} {} {} ({} sections)",
        entry.id.yellow(),
        entry.name.bold(),
        entry.technique.as_deref().unwrap_or("-").cyan(),
        entry.sections.len().to_string().dimmed()
    );
    if kind == EntryKind::Template {
        println!("    {}", "template".dimmed());
    }
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let store_path = cli.store.unwrap_or_else(default_store_path);

    let mut store = LibraryStore::open(&store_path).context("Failed to open library store")?;
    store
        .init_user(&cli.user)
        .context(format!("Failed to load library for {}", cli.user))?;
    info!("promptstore opened {} for {}", store_path.display(), cli.user);

    match cli.command {
        Command::List { templates } => {
            if !templates {
                for entry in store.saved_prompts() {
                    print_entry_line(EntryKind::Prompt, entry);
                }
            }
            for entry in store.templates() {
                print_entry_line(EntryKind::Template, entry);
            }
            if store.saved_prompts().is_empty() && store.templates().is_empty() {
                println!("Library is empty");
            }
        }
        Command::Show { id } => match store.find(&id) {
            Some((_, entry)) => {
                println!("{}", entry.name.bold());
                if let Some(description) = &entry.description {
                    println!("{}", description.dimmed());
                }
                for section in &entry.sections {
                    println!();
                    println!("{}", format!("[{}]", section.key).cyan());
                    println!("{}", section.content);
                }
            }
            None => {
                eprintln!("{} No entry with id {}", "✗".red(), id);
                std::process::exit(1);
            }
        },
        Command::Export => {
            let json = serde_json::to_string_pretty(store.data())?;
            println!("{}", json);
        }
        Command::Delete { id } => {
            let deleted = match store.find(&id).map(|(kind, _)| kind) {
                Some(EntryKind::Prompt) => store.delete_prompt(&id)?,
                Some(EntryKind::Template) => store.delete_template(&id)?,
                None => false,
            };
            if deleted {
                println!("{} Deleted {}", "✓".green(), id);
            } else {
                eprintln!("{} No entry with id {}", "✗".red(), id);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
