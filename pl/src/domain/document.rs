//! The in-progress prompt document
//!
//! Sections are an explicit ordered list: insertion order unless the user
//! reorders, and a key appears at most once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::sections::key_to_label;
use crate::technique::infer_technique;

/// Errors from document edits
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Reorder rejected: expected keys {expected:?}, got {got:?}")]
    OrderMismatch { expected: Vec<String>, got: Vec<String> },

    #[error("Section key must not be empty")]
    EmptyKey,

    #[error("Section '{0}' content must not be empty")]
    EmptyContent(String),

    #[error("No section named '{0}'")]
    UnknownSection(String),

    #[error("Section index {index} out of range (document has {len} sections)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// One named slot of prompt text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub key: String,
    pub content: String,
}

/// Whether an upsert created or overwrote a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionChange {
    Inserted,
    Updated,
}

/// A section ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub key: String,
    pub label: String,
    pub content: String,
}

/// Read-only snapshot of a document for consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    pub name: String,
    pub technique: String,
    pub technique_id: Option<String>,
    pub library_id: Option<String>,
    pub sections: Vec<SectionView>,
}

impl DocumentView {
    pub fn section(&self, key: &str) -> Option<&SectionView> {
        self.sections.iter().find(|s| s.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.key.as_str()).collect()
    }
}

/// The prompt being assembled in a workspace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptDocument {
    name: String,
    technique: Option<String>,
    library_id: Option<String>,
    sections: Vec<Section>,
}

impl PromptDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        debug!(name = %self.name, "set_name: called");
    }

    /// Technique the user (or a loaded prompt) picked explicitly
    pub fn technique(&self) -> Option<&str> {
        self.technique.as_deref()
    }

    pub fn set_technique(&mut self, technique: Option<String>) {
        debug!(?technique, "set_technique: called");
        self.technique = technique.filter(|t| !t.trim().is_empty());
    }

    /// Library entry this document was loaded from or last saved to
    pub fn library_id(&self) -> Option<&str> {
        self.library_id.as_deref()
    }

    pub fn link_library(&mut self, id: Option<String>) {
        debug!(?id, "link_library: called");
        self.library_id = id;
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + Clone {
        self.sections.iter().map(|s| s.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.sections.iter().find(|s| s.key == key).map(|s| s.content.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Any section with non-blank content
    pub fn has_content(&self) -> bool {
        self.sections.iter().any(|s| !s.content.trim().is_empty())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.key == key)
    }

    /// Insert a section at the end, or overwrite it in place if the key exists
    pub fn upsert(&mut self, key: &str, content: &str) -> Result<SectionChange, DocumentError> {
        debug!(%key, len = content.len(), "upsert: called");
        if key.trim().is_empty() {
            return Err(DocumentError::EmptyKey);
        }
        if content.trim().is_empty() {
            return Err(DocumentError::EmptyContent(key.to_string()));
        }

        match self.position(key) {
            Some(idx) => {
                debug!(%key, idx, "upsert: overwriting existing section");
                self.sections[idx].content = content.to_string();
                Ok(SectionChange::Updated)
            }
            None => {
                debug!(%key, "upsert: appending new section");
                self.sections.push(Section {
                    key: key.to_string(),
                    content: content.to_string(),
                });
                Ok(SectionChange::Inserted)
            }
        }
    }

    /// Append text after existing content with a blank line, or create the section
    pub fn append_to_section(&mut self, key: &str, content: &str) -> Result<SectionChange, DocumentError> {
        debug!(%key, "append_to_section: called");
        let merged = match self.get(key) {
            Some(existing) if !existing.is_empty() => format!("{}\n\n{}", existing, content),
            _ => content.to_string(),
        };
        self.upsert(key, &merged)
    }

    /// Remove a section from content and order together
    pub fn remove(&mut self, key: &str) -> Result<Section, DocumentError> {
        debug!(%key, "remove: called");
        let idx = self
            .position(key)
            .ok_or_else(|| DocumentError::UnknownSection(key.to_string()))?;
        Ok(self.sections.remove(idx))
    }

    /// Replace the section order with a permutation of the current keys
    pub fn reorder<S: AsRef<str>>(&mut self, order: &[S]) -> Result<(), DocumentError> {
        let got: Vec<String> = order.iter().map(|k| k.as_ref().to_string()).collect();
        debug!(?got, "reorder: called");

        let mut counts: HashMap<&str, isize> = HashMap::new();
        for s in &self.sections {
            *counts.entry(s.key.as_str()).or_default() += 1;
        }
        for key in &got {
            *counts.entry(key.as_str()).or_default() -= 1;
        }
        if got.len() != self.sections.len() || counts.values().any(|c| *c != 0) {
            debug!("reorder: key multiset mismatch");
            return Err(DocumentError::OrderMismatch {
                expected: self.keys().map(str::to_string).collect(),
                got,
            });
        }

        let mut remaining = std::mem::take(&mut self.sections);
        for key in &got {
            // Counts matched, so every key is still present exactly once
            if let Some(idx) = remaining.iter().position(|s| &s.key == key) {
                self.sections.push(remaining.remove(idx));
            }
        }
        Ok(())
    }

    /// Move the section at `from` so it ends up at index `to`
    pub fn move_section(&mut self, from: usize, to: usize) -> Result<(), DocumentError> {
        debug!(from, to, "move_section: called");
        let len = self.sections.len();
        for index in [from, to] {
            if index >= len {
                return Err(DocumentError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(());
        }
        let mut order: Vec<String> = self.keys().map(str::to_string).collect();
        let moved = order.remove(from);
        order.insert(to, moved);
        self.reorder(order.as_slice())
    }

    /// Empty sections, order, name, technique and library link
    pub fn clear(&mut self) {
        debug!(sections = self.sections.len(), "clear: called");
        *self = Self::default();
    }

    /// Replace the whole document with a saved prompt's contents
    ///
    /// Blank sections and repeated keys are dropped; the first occurrence wins.
    pub fn load<I>(&mut self, name: &str, technique: Option<String>, library_id: Option<String>, sections: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        debug!(%name, ?library_id, "load: called");
        self.clear();
        self.name = name.to_string();
        self.set_technique(technique);
        self.library_id = library_id;
        for (key, content) in sections {
            if key.trim().is_empty() || content.trim().is_empty() || self.contains(&key) {
                debug!(%key, "load: skipping blank or duplicate section");
                continue;
            }
            self.sections.push(Section { key, content });
        }
    }

    /// Inferred technique label for the current sections
    pub fn technique_label(&self) -> String {
        infer_technique(self.keys(), self.technique())
    }

    /// Snapshot with display labels and the inferred technique
    pub fn view(&self) -> DocumentView {
        DocumentView {
            name: self.name.clone(),
            technique: self.technique_label(),
            technique_id: self.technique.clone(),
            library_id: self.library_id.clone(),
            sections: self
                .sections
                .iter()
                .map(|s| SectionView {
                    key: s.key.clone(),
                    label: key_to_label(&s.key),
                    content: s.content.clone(),
                })
                .collect(),
        }
    }
}
