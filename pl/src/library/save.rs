//! Saving the workspace document to the library

use promptstore::{LibraryStore, NewPrompt, PromptUpdate, SavedPrompt, StoreError, StoredSection};
use tracing::{debug, info};

use crate::domain::PromptDocument;
use crate::state::LoadRequest;

/// Name used when the document was never named
pub const UNTITLED_PROMPT: &str = "Untitled Prompt";

/// Characters of joined content used as a fallback description
const DESCRIPTION_FALLBACK_CHARS: usize = 150;

/// How a save treats the document's library link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Update the linked entry, or create one when unlinked
    Auto,
    /// Always create a new entry
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// New entry; the document should be linked to this id
    Created(String),
    Updated(String),
    /// No library user is active, nothing was written
    NoActiveUser,
}

impl SaveOutcome {
    /// Id the document should be linked to after the save
    pub fn linked_id(&self) -> Option<&str> {
        match self {
            SaveOutcome::Created(id) | SaveOutcome::Updated(id) => Some(id),
            SaveOutcome::NoActiveUser => None,
        }
    }
}

/// Summary shown in library listings
///
/// "Role: ..." and "Task: ..." lines when those sections exist, otherwise
/// the start of all content followed by "...".
pub fn describe(doc: &PromptDocument) -> String {
    let summary: Vec<String> = [("role", "Role"), ("task", "Task")]
        .iter()
        .filter_map(|(key, label)| doc.get(key).map(|content| format!("{}: {}", label, content)))
        .collect();
    if !summary.is_empty() {
        return summary.join("\n");
    }

    let joined = doc
        .sections()
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let head: String = joined.chars().take(DESCRIPTION_FALLBACK_CHARS).collect();
    format!("{}...", head)
}

/// Library record for the document, with the inferred technique label
pub fn to_new_prompt(doc: &PromptDocument) -> NewPrompt {
    let name = match doc.name().trim() {
        "" => UNTITLED_PROMPT.to_string(),
        name => name.to_string(),
    };
    NewPrompt {
        name,
        technique: Some(doc.technique_label()),
        description: Some(describe(doc)),
        sections: doc
            .sections()
            .iter()
            .map(|s| StoredSection::new(s.key.clone(), s.content.clone()))
            .collect(),
    }
}

/// Write the document to the active user's saved prompts
///
/// A linked document whose entry no longer exists (deleted, or linked to a
/// template) is saved as a new entry.
pub fn save_document(store: &mut LibraryStore, doc: &PromptDocument, mode: SaveMode) -> Result<SaveOutcome, StoreError> {
    debug!(name = %doc.name(), ?mode, library_id = ?doc.library_id(), "save_document: called");
    if store.current_user().is_none() {
        debug!("save_document: no active user");
        return Ok(SaveOutcome::NoActiveUser);
    }

    let record = to_new_prompt(doc);

    if mode == SaveMode::Auto
        && let Some(id) = doc.library_id()
    {
        if store.update_prompt(id, PromptUpdate::from(record.clone()))? {
            info!(%id, "Prompt updated in library");
            return Ok(SaveOutcome::Updated(id.to_string()));
        }
        debug!(%id, "save_document: linked entry missing, creating new");
    }

    match store.add_prompt(record)? {
        Some(id) => {
            info!(%id, "Prompt added to library");
            Ok(SaveOutcome::Created(id))
        }
        None => Ok(SaveOutcome::NoActiveUser),
    }
}

/// Workspace load request for a library entry
///
/// `link` ties later saves to the entry; templates and mixes load unlinked.
pub fn load_request(entry: &SavedPrompt, link: bool) -> LoadRequest {
    LoadRequest {
        name: entry.name.clone(),
        technique: entry.technique.clone(),
        library_id: link.then(|| entry.id.clone()),
        sections: entry
            .sections
            .iter()
            .map(|s| (s.key.clone(), s.content.clone()))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(sections: &[(&str, &str)]) -> PromptDocument {
        let mut doc = PromptDocument::new();
        for (key, content) in sections {
            doc.upsert(key, content).unwrap();
        }
        doc
    }

    fn store(temp: &TempDir) -> LibraryStore {
        let mut store = LibraryStore::open(temp.path()).unwrap();
        store.init_user("alice").unwrap();
        store
    }

    #[test]
    fn test_describe_prefers_role_and_task() {
        let d = doc(&[("task", "Summarize"), ("context", "Quarterly"), ("role", "Analyst")]);
        assert_eq!(describe(&d), "Role: Analyst\nTask: Summarize");

        let d = doc(&[("task", "Summarize")]);
        assert_eq!(describe(&d), "Task: Summarize");
    }

    #[test]
    fn test_describe_fallback_truncates() {
        let d = doc(&[("context", "alpha"), ("output", "beta")]);
        assert_eq!(describe(&d), "alpha\nbeta...");

        let long = "z".repeat(200);
        let d = doc(&[("context", &long)]);
        assert_eq!(describe(&d), format!("{}...", "z".repeat(150)));
    }

    #[test]
    fn test_to_new_prompt_defaults_name_and_infers_technique() {
        let d = doc(&[("role", "r"), ("instructions", "i"), ("steps", "s"), ("endGoal", "e"), ("narrowing", "n")]);
        let record = to_new_prompt(&d);
        assert_eq!(record.name, UNTITLED_PROMPT);
        assert_eq!(record.technique.as_deref(), Some("RISEN"));
        assert_eq!(record.sections.len(), 5);
        assert_eq!(record.sections[3].key, "endGoal");
    }

    #[test]
    fn test_save_creates_then_updates() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        let mut d = doc(&[("task", "Plan a trip")]);
        d.set_name("Trip");

        let outcome = save_document(&mut store, &d, SaveMode::Auto).unwrap();
        let SaveOutcome::Created(id) = outcome else {
            panic!("expected Created, got {:?}", outcome);
        };

        d.link_library(Some(id.clone()));
        d.upsert("task", "Plan a long trip").unwrap();
        assert_eq!(
            save_document(&mut store, &d, SaveMode::Auto).unwrap(),
            SaveOutcome::Updated(id.clone())
        );
        assert_eq!(store.saved_prompts().len(), 1);
        assert_eq!(store.get_prompt(&id).unwrap().section("task"), Some("Plan a long trip"));
    }

    #[test]
    fn test_save_copy_creates_new_entry() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        let mut d = doc(&[("task", "Plan")]);
        let first = save_document(&mut store, &d, SaveMode::Auto).unwrap();
        d.link_library(first.linked_id().map(str::to_string));

        let copy = save_document(&mut store, &d, SaveMode::Copy).unwrap();
        assert!(matches!(copy, SaveOutcome::Created(_)));
        assert_ne!(copy, first);
        assert_eq!(store.saved_prompts().len(), 2);
    }

    #[test]
    fn test_save_with_stale_link_creates() {
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        let mut d = doc(&[("task", "Plan")]);
        d.link_library(Some("temp-gone".to_string()));

        assert!(matches!(
            save_document(&mut store, &d, SaveMode::Auto).unwrap(),
            SaveOutcome::Created(_)
        ));
    }

    #[test]
    fn test_save_without_user() {
        let temp = TempDir::new().unwrap();
        let mut store = LibraryStore::open(temp.path()).unwrap();
        let d = doc(&[("task", "Plan")]);
        assert_eq!(
            save_document(&mut store, &d, SaveMode::Auto).unwrap(),
            SaveOutcome::NoActiveUser
        );
    }

    #[test]
    fn test_load_request_links_only_when_asked() {
        let entry = NewPrompt::named("Persona")
            .with_section("task", "Synthesize")
            .with_section("actor", "Researcher");
        let temp = TempDir::new().unwrap();
        let mut store = store(&temp);
        let id = store.add_prompt(entry).unwrap().unwrap();
        let saved = store.get_prompt(&id).unwrap();

        let linked = load_request(saved, true);
        assert_eq!(linked.library_id.as_deref(), Some(id.as_str()));
        assert_eq!(linked.sections[1], ("actor".to_string(), "Researcher".to_string()));
        assert!(load_request(saved, false).library_id.is_none());
    }
}
