//! Workspace state with actor pattern
//!
//! WorkspaceManager owns the prompt document and pending refinement and
//! processes messages via channels, one at a time.

mod manager;
mod messages;

pub use manager::WorkspaceManager;
pub use messages::{LoadRequest, WorkspaceCommand, WorkspaceError, WorkspaceResponse};
