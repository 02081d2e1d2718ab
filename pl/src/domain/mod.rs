//! Workspace domain types: the prompt document and the chat log

mod conversation;
mod document;

pub use conversation::{ConversationLog, ConversationMessage};
pub use document::{DocumentError, DocumentView, PromptDocument, Section, SectionChange, SectionView};
