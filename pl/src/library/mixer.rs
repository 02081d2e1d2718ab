//! Section mixer: build a new document from pieces of library entries

use promptstore::LibraryStore;
use tracing::debug;

use crate::domain::PromptDocument;

/// Ordered section picks per library entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mixer {
    selections: Vec<(String, Vec<String>)>,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select or deselect a section of an entry; returns whether it is now selected
    pub fn toggle(&mut self, entry_id: &str, key: &str) -> bool {
        debug!(%entry_id, %key, "Mixer::toggle: called");
        let idx = match self.selections.iter().position(|(id, _)| id == entry_id) {
            Some(idx) => idx,
            None => {
                self.selections.push((entry_id.to_string(), Vec::new()));
                self.selections.len() - 1
            }
        };
        let keys = &mut self.selections[idx].1;
        match keys.iter().position(|k| k == key) {
            Some(pos) => {
                keys.remove(pos);
                false
            }
            None => {
                keys.push(key.to_string());
                true
            }
        }
    }

    pub fn is_selected(&self, entry_id: &str, key: &str) -> bool {
        self.selections
            .iter()
            .any(|(id, keys)| id == entry_id && keys.iter().any(|k| k == key))
    }

    pub fn selection_count(&self) -> usize {
        self.selections.iter().map(|(_, keys)| keys.len()).sum()
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    /// Concatenate the selected sections into a fresh, unlinked document
    ///
    /// Same-key content from several entries is joined with a blank line.
    /// Unknown entries and missing or empty sections are skipped.
    pub fn mix(&self, store: &LibraryStore) -> PromptDocument {
        debug!(selections = self.selection_count(), "Mixer::mix: called");
        let mut doc = PromptDocument::new();
        for (entry_id, keys) in &self.selections {
            let Some((_, entry)) = store.find(entry_id) else {
                debug!(%entry_id, "Mixer::mix: entry not found, skipping");
                continue;
            };
            for key in keys {
                if let Some(content) = entry.section(key).filter(|c| !c.trim().is_empty()) {
                    // content is non-empty, so appending cannot fail
                    let _ = doc.append_to_section(key, content);
                }
            }
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptstore::NewPrompt;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> (LibraryStore, String, String) {
        let mut store = LibraryStore::open(temp.path()).unwrap();
        store.init_user("bob").unwrap();
        let a = store
            .add_prompt(
                NewPrompt::named("A")
                    .with_section("task", "Task A")
                    .with_section("context", "Context A"),
            )
            .unwrap()
            .unwrap();
        let b = store
            .add_template(
                NewPrompt::named("B")
                    .with_section("task", "Task B")
                    .with_section("output", "Output B"),
            )
            .unwrap()
            .unwrap();
        (store, a, b)
    }

    #[test]
    fn test_toggle() {
        let mut mixer = Mixer::new();
        assert!(mixer.toggle("p1", "task"));
        assert!(mixer.is_selected("p1", "task"));
        assert!(!mixer.toggle("p1", "task"));
        assert!(!mixer.is_selected("p1", "task"));
        assert_eq!(mixer.selection_count(), 0);
    }

    #[test]
    fn test_mix_groups_picks_by_entry_in_first_touch_order() {
        let temp = TempDir::new().unwrap();
        let (store, a, b) = store(&temp);

        let mut mixer = Mixer::new();
        mixer.toggle(&b, "output");
        mixer.toggle(&a, "task");
        mixer.toggle(&b, "task");

        let doc = mixer.mix(&store);
        // entry B was touched first, so its picks come before A's
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["output", "task"]);
        assert_eq!(doc.get("task"), Some("Task B\n\nTask A"));
        assert!(doc.library_id().is_none());
        assert!(doc.technique().is_none());
    }

    #[test]
    fn test_mix_skips_unknown_entries_and_sections() {
        let temp = TempDir::new().unwrap();
        let (store, a, _) = store(&temp);

        let mut mixer = Mixer::new();
        mixer.toggle("missing", "task");
        mixer.toggle(&a, "output");
        mixer.toggle(&a, "context");

        let doc = mixer.mix(&store);
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["context"]);
    }
}
