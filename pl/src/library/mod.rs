//! Prompt library helpers on top of `promptstore`
//!
//! Saving the workspace document, copy formatting, the section mixer and
//! listing search/sort.

mod format;
mod mixer;
mod save;
mod search;

pub use format::{format_entry, format_sections, format_view};
pub use mixer::Mixer;
pub use save::{SaveMode, SaveOutcome, UNTITLED_PROMPT, describe, load_request, save_document, to_new_prompt};
pub use search::{SortOption, entry_technique, format_date, matches, relative_time, search};
