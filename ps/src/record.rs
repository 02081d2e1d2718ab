//! Library record types

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One section of a stored prompt, kept in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSection {
    pub key: String,
    pub content: String,
}

impl StoredSection {
    pub fn new(key: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            content: content.into(),
        }
    }
}

/// A prompt saved to the library (or a template)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SavedPrompt {
    pub id: String,
    pub name: String,

    /// Technique label snapshot taken at save time (e.g. "Custom RISEN")
    #[serde(default)]
    pub technique: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub sections: Vec<StoredSection>,

    /// Unix milliseconds
    pub created_at: i64,

    /// Unix milliseconds
    pub updated_at: i64,
}

impl SavedPrompt {
    /// Content of a section by key
    pub fn section(&self, key: &str) -> Option<&str> {
        debug!(%self.id, %key, "SavedPrompt::section: called");
        self.sections
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.content.as_str())
    }

    /// Section keys in stored order
    pub fn section_keys(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.key.as_str())
    }

    pub(crate) fn apply(&mut self, update: PromptUpdate, now: i64) {
        debug!(%self.id, "SavedPrompt::apply: called");
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(technique) = update.technique {
            self.technique = Some(technique);
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(sections) = update.sections {
            self.sections = sections;
        }
        self.updated_at = now;
    }
}

/// Fields for a new library entry; the store assigns id and timestamps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPrompt {
    pub name: String,
    pub technique: Option<String>,
    pub description: Option<String>,
    pub sections: Vec<StoredSection>,
}

impl NewPrompt {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_section(mut self, key: impl Into<String>, content: impl Into<String>) -> Self {
        self.sections.push(StoredSection::new(key, content));
        self
    }

    pub(crate) fn into_saved(self, id: String, now: i64) -> SavedPrompt {
        SavedPrompt {
            id,
            name: self.name,
            technique: self.technique,
            description: self.description,
            sections: self.sections,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptUpdate {
    pub name: Option<String>,
    pub technique: Option<String>,
    pub description: Option<String>,
    pub sections: Option<Vec<StoredSection>>,
}

impl From<NewPrompt> for PromptUpdate {
    fn from(prompt: NewPrompt) -> Self {
        Self {
            name: Some(prompt.name),
            technique: prompt.technique,
            description: prompt.description,
            sections: Some(prompt.sections),
        }
    }
}

/// Which collection an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Prompt,
    Template,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prompt => write!(f, "prompt"),
            Self::Template => write!(f, "template"),
        }
    }
}
