//! Interactive chat REPL with slash commands

use colored::Colorize;
use eyre::Result;
use promptstore::{EntryKind, LibraryStore};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use super::session::{ChatSession, SubmitOutcome};
use crate::domain::DocumentView;
use crate::library::{SaveMode, SaveOutcome, format_view, load_request, save_document};
use crate::reconcile::ReconcileOutcome;

/// Parsed slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Quit,
    Show,
    Pending,
    Clear,
    Name(String),
    Technique(Option<String>),
    Edit { key: String, content: String },
    Drop { entry_id: String, key: String },
    Remove(String),
    /// Zero-based positions
    Move { from: usize, to: usize },
    Save,
    SaveCopy,
    Load(String),
    Copy,
    History,
}

impl SlashCommand {
    /// Parse a line starting with '/'; the error is a usage hint
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        let (cmd, rest) = input.split_once(char::is_whitespace).unwrap_or((input, ""));
        let rest = rest.trim();

        let cmd = match cmd {
            "/help" | "/h" | "/?" => Self::Help,
            "/quit" | "/q" | "/exit" => Self::Quit,
            "/show" => Self::Show,
            "/pending" => Self::Pending,
            "/clear" => Self::Clear,
            "/name" => {
                if rest.is_empty() {
                    return Err("Usage: /name <prompt name>".to_string());
                }
                Self::Name(rest.to_string())
            }
            "/technique" => match rest {
                "" => return Err("Usage: /technique <id|name|none>".to_string()),
                "none" => Self::Technique(None),
                t => Self::Technique(Some(t.to_string())),
            },
            "/edit" => {
                let (key, content) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "Usage: /edit <key> <content>".to_string())?;
                Self::Edit {
                    key: key.to_string(),
                    content: content.trim().to_string(),
                }
            }
            "/drop" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(entry_id), Some(key), None) => Self::Drop {
                        entry_id: entry_id.to_string(),
                        key: key.to_string(),
                    },
                    _ => return Err("Usage: /drop <library-id> <key>".to_string()),
                }
            }
            "/remove" => {
                if rest.is_empty() {
                    return Err("Usage: /remove <key>".to_string());
                }
                Self::Remove(rest.to_string())
            }
            "/move" => {
                let positions: Vec<usize> = rest.split_whitespace().filter_map(|p| p.parse().ok()).collect();
                match positions.as_slice() {
                    [from, to] if *from >= 1 && *to >= 1 => Self::Move {
                        from: from - 1,
                        to: to - 1,
                    },
                    _ => return Err("Usage: /move <from> <to> (1-based positions)".to_string()),
                }
            }
            "/save" => Self::Save,
            "/save-copy" => Self::SaveCopy,
            "/load" => {
                if rest.is_empty() {
                    return Err("Usage: /load <library-id>".to_string());
                }
                Self::Load(rest.to_string())
            }
            "/copy" => Self::Copy,
            "/history" => Self::History,
            other => return Err(format!("Unknown command: {}", other)),
        };
        Ok(cmd)
    }
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}

/// REPL around a chat session and the user's library
pub struct ChatRepl {
    session: ChatSession,
    library: Option<LibraryStore>,
}

impl ChatRepl {
    pub fn new(session: ChatSession, library: Option<LibraryStore>) -> Self {
        Self { session, library }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            Ok(SlashResult::Continue) => continue,
                            Ok(SlashResult::Quit) => break,
                            Err(e) => println!("{} {}", "Error:".red(), e),
                        }
                    } else {
                        self.process_user_input(input).await?;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        self.session.workspace().shutdown().await?;
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Promptly".bright_cyan().bold());
        if let Some(user) = self.library.as_ref().and_then(|l| l.current_user()) {
            println!("Library: {}", user);
        }
        if !self.session.is_configured() {
            println!("{}", "No LLM provider configured; see llm.active in promptly.yml".yellow());
        }
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
        if let Some(greeting) = self.session.log().last() {
            println!("{} {}", "Chad:".bright_blue(), greeting.content);
            println!();
        }
    }

    async fn process_user_input(&mut self, input: &str) -> Result<()> {
        debug!(len = input.len(), "process_user_input: called");
        let outcome = self.session.submit(input).await?;
        if let Some(key) = outcome.applied() {
            println!("{} {}", "Applied refinement:".green(), key);
        }

        match outcome {
            SubmitOutcome::Ignored => {}
            SubmitOutcome::NotConfigured { .. } => {
                if let Some(msg) = self.session.log().last() {
                    println!("{} {}", "Chad:".bright_blue(), msg.content.yellow());
                }
            }
            SubmitOutcome::Replied { reply, outcome, .. } => {
                println!();
                println!("{} {}", "Chad:".bright_blue(), reply);
                println!();
                self.print_outcome(&outcome);
            }
            SubmitOutcome::Failed { message, .. } => {
                println!("{} {}", "Chad:".bright_blue(), message.red());
            }
        }
        Ok(())
    }

    fn print_outcome(&self, outcome: &ReconcileOutcome) {
        match outcome {
            ReconcileOutcome::Cleared => println!("{}", "Prompt cleared.".dimmed()),
            ReconcileOutcome::SectionAdded { key } => println!("{} {}", "Added section:".green(), key),
            ReconcileOutcome::RefinementStaged { key } => {
                println!("{} {} {}", "Refinement for".dimmed(), key, "pending; reply yes to apply".dimmed())
            }
            ReconcileOutcome::SectionFocused { key } => println!("{} {}", "Working on:".dimmed(), key),
            ReconcileOutcome::NoChange => {}
        }
    }

    async fn handle_slash_command(&mut self, input: &str) -> Result<SlashResult> {
        let command = match SlashCommand::parse(input) {
            Ok(c) => c,
            Err(hint) => {
                println!("{} {}", "?".yellow(), hint);
                println!("Type {} for available commands", "/help".yellow());
                return Ok(SlashResult::Continue);
            }
        };
        debug!(?command, "handle_slash_command: called");
        let workspace = self.session.workspace().clone();

        match command {
            SlashCommand::Help => self.print_help(),
            SlashCommand::Quit => return Ok(SlashResult::Quit),
            SlashCommand::Show => print_document(&workspace.get_document().await?),
            SlashCommand::Pending => match workspace.pending().await? {
                Some(p) => println!("{} {}\n{}", "Pending refinement:".bright_cyan(), p.key, p.content),
                None => println!("{}", "No pending refinement.".dimmed()),
            },
            SlashCommand::Clear => {
                workspace.clear_document().await?;
                println!("{}", "Prompt cleared.".dimmed());
            }
            SlashCommand::Name(name) => workspace.set_name(&name).await?,
            SlashCommand::Technique(t) => workspace.set_technique(t).await?,
            SlashCommand::Edit { key, content } => {
                workspace.edit_section(&key, &content).await?;
            }
            SlashCommand::Drop { entry_id, key } => {
                let content = self
                    .library
                    .as_ref()
                    .and_then(|l| l.find(&entry_id))
                    .and_then(|(_, entry)| entry.section(&key).map(str::to_string));
                match content {
                    Some(content) => {
                        workspace.append_to_section(&key, &content).await?;
                        println!("{} {}", "Appended to".green(), key);
                    }
                    None => println!("{} no section {} in {}", "?".yellow(), key, entry_id),
                }
            }
            SlashCommand::Remove(key) => {
                workspace.remove_section(&key).await?;
            }
            SlashCommand::Move { from, to } => workspace.move_section(from, to).await?,
            SlashCommand::Save => self.save(SaveMode::Auto).await?,
            SlashCommand::SaveCopy => self.save(SaveMode::Copy).await?,
            SlashCommand::Load(id) => {
                let request = self.library.as_ref().and_then(|l| l.find(&id)).map(|(kind, entry)| {
                    // templates load unlinked so saving never overwrites them
                    load_request(entry, kind == EntryKind::Prompt)
                });
                match request {
                    Some(request) => {
                        let name = request.name.clone();
                        workspace.load(request).await?;
                        println!("{} {}", "Loaded".green(), name);
                    }
                    None => println!("{} not found in library: {}", "?".yellow(), id),
                }
            }
            SlashCommand::Copy => println!("{}", format_view(&workspace.get_document().await?)),
            SlashCommand::History => self.print_history(),
        }
        Ok(SlashResult::Continue)
    }

    async fn save(&mut self, mode: SaveMode) -> Result<()> {
        let Some(library) = self.library.as_mut() else {
            println!("{}", "No library user; start with --user <id>".yellow());
            return Ok(());
        };
        let workspace = self.session.workspace().clone();
        let doc = workspace.snapshot().await?;
        match save_document(library, &doc, mode)? {
            SaveOutcome::Created(id) => {
                workspace.link_library(Some(id.clone())).await?;
                println!("{} {}", "Saved as new prompt".green(), id);
            }
            SaveOutcome::Updated(id) => println!("{} {}", "Updated prompt".green(), id),
            SaveOutcome::NoActiveUser => println!("{}", "No library user; nothing saved".yellow()),
        }
        Ok(())
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:20} Show this help", "/help".yellow());
        println!("  {:20} Exit", "/quit".yellow());
        println!("  {:20} Show the prompt being built", "/show".yellow());
        println!("  {:20} Show the refinement awaiting confirmation", "/pending".yellow());
        println!("  {:20} Clear the prompt", "/clear".yellow());
        println!("  {:20} Rename the prompt", "/name <name>".yellow());
        println!("  {:20} Set the technique", "/technique <id>".yellow());
        println!("  {:20} Replace a section", "/edit <key> <text>".yellow());
        println!("  {:20} Append a library section", "/drop <id> <key>".yellow());
        println!("  {:20} Remove a section", "/remove <key>".yellow());
        println!("  {:20} Move a section", "/move <from> <to>".yellow());
        println!("  {:20} Save to the library", "/save".yellow());
        println!("  {:20} Save as a new library entry", "/save-copy".yellow());
        println!("  {:20} Load a library entry", "/load <id>".yellow());
        println!("  {:20} Print the prompt as plain text", "/copy".yellow());
        println!("  {:20} Show conversation history", "/history".yellow());
        println!();
    }

    fn print_history(&self) {
        let log = self.session.log();
        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for msg in log.messages() {
            let role = if msg.is_assistant() {
                "Chad".bright_blue()
            } else {
                "You".bright_green()
            };
            let preview: String = msg.content.chars().take(60).collect();
            let ellipsis = if msg.content.chars().count() > 60 { "..." } else { "" };
            println!("  {}. {}: {}{}", msg.seq + 1, role, preview.replace('\n', " "), ellipsis);
        }
        println!();
    }
}

fn print_document(view: &DocumentView) {
    println!();
    let name = if view.name.is_empty() { "(untitled)" } else { view.name.as_str() };
    println!("{} {}", name.bright_cyan().bold(), format!("[{}]", view.technique).dimmed());
    if let Some(id) = &view.library_id {
        println!("{} {}", "Library:".dimmed(), id);
    }
    if view.sections.is_empty() {
        println!("{}", "No sections yet.".dimmed());
    }
    for (i, section) in view.sections.iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, section.label.yellow());
        println!("{}", section.content);
    }
    println!();
}
