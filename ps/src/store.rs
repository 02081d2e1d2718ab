//! Core LibraryStore implementation

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::record::{EntryKind, NewPrompt, PromptUpdate, SavedPrompt};
use crate::{TEMPLATE_ID_PREFIX, now_ms};

/// Everything stored for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LibraryData {
    #[serde(default)]
    pub saved_prompts: Vec<SavedPrompt>,
    #[serde(default)]
    pub templates: Vec<SavedPrompt>,
}

/// File-backed library scoped to the active user
pub struct LibraryStore {
    /// Base path for storage
    base_path: PathBuf,
    /// Active user; `None` means every mutation is a no-op
    user: Option<String>,
    data: LibraryData,
}

impl LibraryStore {
    /// Open or create a library store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| StoreError::io(&base_path, e))?;
        debug!(?base_path, "Opened library store");
        Ok(Self {
            base_path,
            user: None,
            data: LibraryData::default(),
        })
    }

    /// Make `user_id` the active user and load their library
    pub fn init_user(&mut self, user_id: &str) -> Result<(), StoreError> {
        debug!(%user_id, "init_user: called");
        validate_user_id(user_id)?;

        let path = self.data_path(user_id);
        let data = if path.exists() {
            debug!(?path, "init_user: loading existing library");
            let _lock = self.lock(user_id, false)?;
            let content = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
            serde_json::from_str(&content)?
        } else {
            debug!(?path, "init_user: no library yet, starting empty");
            LibraryData::default()
        };

        info!(
            user = %user_id,
            saved = data.saved_prompts.len(),
            templates = data.templates.len(),
            "Library loaded"
        );
        self.user = Some(user_id.to_string());
        self.data = data;
        Ok(())
    }

    /// Drop the active user and their in-memory data
    pub fn clear_user(&mut self) {
        debug!("clear_user: called");
        self.user = None;
        self.data = LibraryData::default();
    }

    pub fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Saved prompts, newest first
    pub fn saved_prompts(&self) -> &[SavedPrompt] {
        &self.data.saved_prompts
    }

    /// Templates, newest first
    pub fn templates(&self) -> &[SavedPrompt] {
        &self.data.templates
    }

    pub fn data(&self) -> &LibraryData {
        &self.data
    }

    /// Add a saved prompt; returns its id, or `None` when no user is active
    pub fn add_prompt(&mut self, prompt: NewPrompt) -> Result<Option<String>, StoreError> {
        debug!(name = %prompt.name, "add_prompt: called");
        if self.user.is_none() {
            debug!("add_prompt: no active user, ignoring");
            return Ok(None);
        }

        let id = Uuid::now_v7().to_string();
        self.data.saved_prompts.insert(0, prompt.into_saved(id.clone(), now_ms()));
        self.persist()?;
        info!(%id, "Saved prompt added");
        Ok(Some(id))
    }

    /// Add a template; returns its id, or `None` when no user is active
    pub fn add_template(&mut self, template: NewPrompt) -> Result<Option<String>, StoreError> {
        debug!(name = %template.name, "add_template: called");
        if self.user.is_none() {
            debug!("add_template: no active user, ignoring");
            return Ok(None);
        }

        let id = format!("{}{}", TEMPLATE_ID_PREFIX, Uuid::now_v7());
        self.data.templates.insert(0, template.into_saved(id.clone(), now_ms()));
        self.persist()?;
        info!(%id, "Template added");
        Ok(Some(id))
    }

    /// Update a saved prompt; returns false when nothing was updated
    pub fn update_prompt(&mut self, id: &str, update: PromptUpdate) -> Result<bool, StoreError> {
        debug!(%id, "update_prompt: called");
        self.update_entry(EntryKind::Prompt, id, update)
    }

    /// Update a template; returns false when nothing was updated
    pub fn update_template(&mut self, id: &str, update: PromptUpdate) -> Result<bool, StoreError> {
        debug!(%id, "update_template: called");
        self.update_entry(EntryKind::Template, id, update)
    }

    /// Delete a saved prompt; returns false when nothing was deleted
    pub fn delete_prompt(&mut self, id: &str) -> Result<bool, StoreError> {
        debug!(%id, "delete_prompt: called");
        self.delete_entry(EntryKind::Prompt, id)
    }

    /// Delete a template; returns false when nothing was deleted
    pub fn delete_template(&mut self, id: &str) -> Result<bool, StoreError> {
        debug!(%id, "delete_template: called");
        self.delete_entry(EntryKind::Template, id)
    }

    pub fn get_prompt(&self, id: &str) -> Option<&SavedPrompt> {
        self.data.saved_prompts.iter().find(|p| p.id == id)
    }

    pub fn get_template(&self, id: &str) -> Option<&SavedPrompt> {
        self.data.templates.iter().find(|p| p.id == id)
    }

    /// Look an id up in saved prompts first, then templates
    pub fn find(&self, id: &str) -> Option<(EntryKind, &SavedPrompt)> {
        debug!(%id, "find: called");
        self.get_prompt(id)
            .map(|p| (EntryKind::Prompt, p))
            .or_else(|| self.get_template(id).map(|t| (EntryKind::Template, t)))
    }

    fn collection_mut(&mut self, kind: EntryKind) -> &mut Vec<SavedPrompt> {
        match kind {
            EntryKind::Prompt => &mut self.data.saved_prompts,
            EntryKind::Template => &mut self.data.templates,
        }
    }

    fn update_entry(&mut self, kind: EntryKind, id: &str, update: PromptUpdate) -> Result<bool, StoreError> {
        if self.user.is_none() {
            debug!(%kind, "update_entry: no active user, ignoring");
            return Ok(false);
        }

        let now = now_ms();
        let Some(entry) = self.collection_mut(kind).iter_mut().find(|p| p.id == id) else {
            debug!(%kind, %id, "update_entry: not found");
            return Ok(false);
        };
        entry.apply(update, now);
        self.persist()?;
        Ok(true)
    }

    fn delete_entry(&mut self, kind: EntryKind, id: &str) -> Result<bool, StoreError> {
        if self.user.is_none() {
            debug!(%kind, "delete_entry: no active user, ignoring");
            return Ok(false);
        }

        let entries = self.collection_mut(kind);
        let before = entries.len();
        entries.retain(|p| p.id != id);
        if entries.len() == before {
            debug!(%kind, %id, "delete_entry: not found");
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn data_path(&self, user_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", user_id))
    }

    fn lock(&self, user_id: &str, exclusive: bool) -> Result<fs::File, StoreError> {
        let path = self.base_path.join(format!("{}.lock", user_id));
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        let locked = if exclusive {
            file.lock_exclusive()
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|source| StoreError::Lock { path, source })?;
        Ok(file)
    }

    /// Write the active user's data: temp file then rename, under an exclusive lock
    fn persist(&self) -> Result<(), StoreError> {
        let Some(user_id) = self.user.as_deref() else {
            return Ok(());
        };
        debug!(%user_id, "persist: called");

        let _lock = self.lock(user_id, true)?;
        let path = self.data_path(user_id);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&self.data)?;
        fs::write(&tmp, content).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;
        Ok(())
    }
}

fn validate_user_id(user_id: &str) -> Result<(), StoreError> {
    let valid = !user_id.is_empty()
        && user_id != "."
        && user_id != ".."
        && user_id
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidUser(user_id.to_string()))
    }
}
