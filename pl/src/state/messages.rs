//! Workspace manager messages
//!
//! Commands and responses for the actor pattern.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{DocumentError, DocumentView, PromptDocument, SectionChange};
use crate::reconcile::{PendingRefinement, ReconcileOutcome, UserTurn};

/// Errors from workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Channel error")]
    ChannelError,
}

/// Response from workspace operations
pub type WorkspaceResponse<T> = Result<T, WorkspaceError>;

/// A saved prompt's contents, ready to load into the workspace
#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
    pub name: String,
    pub technique: Option<String>,
    pub library_id: Option<String>,
    pub sections: Vec<(String, String)>,
}

/// Commands sent to the WorkspaceManager actor
#[derive(Debug)]
pub enum WorkspaceCommand {
    // Reconciliation
    AssistantMessage {
        text: String,
        reply: oneshot::Sender<ReconcileOutcome>,
    },
    UserMessage {
        text: String,
        reply: oneshot::Sender<UserTurn>,
    },

    // Reads
    GetDocument {
        reply: oneshot::Sender<DocumentView>,
    },
    Snapshot {
        reply: oneshot::Sender<PromptDocument>,
    },
    GetPending {
        reply: oneshot::Sender<Option<PendingRefinement>>,
    },
    GetCurrentSection {
        reply: oneshot::Sender<Option<String>>,
    },

    // Document edits
    ClearDocument {
        reply: oneshot::Sender<()>,
    },
    ReorderSections {
        order: Vec<String>,
        reply: oneshot::Sender<WorkspaceResponse<()>>,
    },
    MoveSection {
        from: usize,
        to: usize,
        reply: oneshot::Sender<WorkspaceResponse<()>>,
    },
    SetName {
        name: String,
        reply: oneshot::Sender<()>,
    },
    SetTechnique {
        technique: Option<String>,
        reply: oneshot::Sender<()>,
    },
    EditSection {
        key: String,
        content: String,
        reply: oneshot::Sender<WorkspaceResponse<SectionChange>>,
    },
    AppendToSection {
        key: String,
        content: String,
        reply: oneshot::Sender<WorkspaceResponse<SectionChange>>,
    },
    RemoveSection {
        key: String,
        reply: oneshot::Sender<WorkspaceResponse<()>>,
    },
    LinkLibrary {
        id: Option<String>,
        reply: oneshot::Sender<()>,
    },
    Load {
        request: LoadRequest,
        reply: oneshot::Sender<()>,
    },

    // Shutdown
    Shutdown,
}
