//! PromptStore - per-user library of saved prompts and templates
//!
//! Each user owns one JSON document holding their saved prompts and their
//! templates. Mutations are persisted immediately; every mutation is a no-op
//! while no user is active.
//!
//! # Layout
//!
//! ```text
//! {store_path}/
//! ├── alice.json      # { "saved-prompts": [...], "templates": [...] }
//! ├── alice.lock      # advisory lock taken while reading/writing
//! └── bob.json
//! ```
//!
//! # Example
//!
//! ```ignore
//! use promptstore::{LibraryStore, NewPrompt};
//!
//! let mut store = LibraryStore::open("/tmp/library")?;
//! store.init_user("alice")?;
//! let id = store.add_prompt(NewPrompt::named("Persona synthesis"))?;
//! ```

pub mod cli;
mod error;
mod record;
mod store;

pub use error::StoreError;
pub use record::{EntryKind, NewPrompt, PromptUpdate, SavedPrompt, StoredSection};
pub use store::{LibraryData, LibraryStore};

/// Prefix for template ids, keeps them distinguishable from saved prompt ids
pub const TEMPLATE_ID_PREFIX: &str = "temp-";

/// Current time in unix milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
