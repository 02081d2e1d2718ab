//! WorkspaceManager - actor that owns the Reconciler
//!
//! Commands are processed one at a time, so an assistant message is fully
//! reconciled before the next user message is looked at.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::domain::{DocumentView, PromptDocument, SectionChange};
use crate::reconcile::{PendingRefinement, ReconcileOutcome, Reconciler, UserTurn};

use super::messages::{LoadRequest, WorkspaceCommand, WorkspaceError, WorkspaceResponse};

/// Handle to send commands to the WorkspaceManager
#[derive(Clone)]
pub struct WorkspaceManager {
    tx: mpsc::Sender<WorkspaceCommand>,
}

impl WorkspaceManager {
    /// Spawn a new WorkspaceManager actor around a reconciler
    pub fn spawn(reconciler: Reconciler) -> Self {
        debug!("spawn: called");
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(actor_loop(reconciler, rx));
        info!("WorkspaceManager spawned");
        Self { tx }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> WorkspaceCommand) -> WorkspaceResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| WorkspaceError::ChannelError)?;
        reply_rx.await.map_err(|_| WorkspaceError::ChannelError)
    }

    // === Reconciliation ===

    /// Reconcile a newly arrived assistant message
    pub async fn on_assistant_message(&self, text: &str) -> WorkspaceResponse<ReconcileOutcome> {
        debug!(len = text.len(), "on_assistant_message: called");
        let text = text.to_string();
        self.request(|reply| WorkspaceCommand::AssistantMessage { text, reply })
            .await
    }

    /// Run the confirmation check for a user message about to be sent
    pub async fn on_user_message(&self, text: &str) -> WorkspaceResponse<UserTurn> {
        debug!(len = text.len(), "on_user_message: called");
        let text = text.to_string();
        self.request(|reply| WorkspaceCommand::UserMessage { text, reply }).await
    }

    // === Reads ===

    pub async fn get_document(&self) -> WorkspaceResponse<DocumentView> {
        debug!("get_document: called");
        self.request(|reply| WorkspaceCommand::GetDocument { reply }).await
    }

    /// Owned copy of the document, for saving
    pub async fn snapshot(&self) -> WorkspaceResponse<PromptDocument> {
        debug!("snapshot: called");
        self.request(|reply| WorkspaceCommand::Snapshot { reply }).await
    }

    pub async fn pending(&self) -> WorkspaceResponse<Option<PendingRefinement>> {
        debug!("pending: called");
        self.request(|reply| WorkspaceCommand::GetPending { reply }).await
    }

    pub async fn current_section(&self) -> WorkspaceResponse<Option<String>> {
        debug!("current_section: called");
        self.request(|reply| WorkspaceCommand::GetCurrentSection { reply }).await
    }

    // === Document edits ===

    pub async fn clear_document(&self) -> WorkspaceResponse<()> {
        debug!("clear_document: called");
        self.request(|reply| WorkspaceCommand::ClearDocument { reply }).await
    }

    pub async fn reorder_sections(&self, order: Vec<String>) -> WorkspaceResponse<()> {
        debug!(?order, "reorder_sections: called");
        self.request(|reply| WorkspaceCommand::ReorderSections { order, reply })
            .await?
    }

    pub async fn move_section(&self, from: usize, to: usize) -> WorkspaceResponse<()> {
        debug!(from, to, "move_section: called");
        self.request(|reply| WorkspaceCommand::MoveSection { from, to, reply })
            .await?
    }

    pub async fn set_name(&self, name: &str) -> WorkspaceResponse<()> {
        debug!(%name, "set_name: called");
        let name = name.to_string();
        self.request(|reply| WorkspaceCommand::SetName { name, reply }).await
    }

    pub async fn set_technique(&self, technique: Option<String>) -> WorkspaceResponse<()> {
        debug!(?technique, "set_technique: called");
        self.request(|reply| WorkspaceCommand::SetTechnique { technique, reply })
            .await
    }

    /// Manual edit: write a section directly
    pub async fn edit_section(&self, key: &str, content: &str) -> WorkspaceResponse<SectionChange> {
        debug!(%key, "edit_section: called");
        let (key, content) = (key.to_string(), content.to_string());
        self.request(|reply| WorkspaceCommand::EditSection { key, content, reply })
            .await?
    }

    /// Append library content to a section after a blank line
    pub async fn append_to_section(&self, key: &str, content: &str) -> WorkspaceResponse<SectionChange> {
        debug!(%key, "append_to_section: called");
        let (key, content) = (key.to_string(), content.to_string());
        self.request(|reply| WorkspaceCommand::AppendToSection { key, content, reply })
            .await?
    }

    pub async fn remove_section(&self, key: &str) -> WorkspaceResponse<()> {
        debug!(%key, "remove_section: called");
        let key = key.to_string();
        self.request(|reply| WorkspaceCommand::RemoveSection { key, reply })
            .await?
    }

    pub async fn link_library(&self, id: Option<String>) -> WorkspaceResponse<()> {
        debug!(?id, "link_library: called");
        self.request(|reply| WorkspaceCommand::LinkLibrary { id, reply }).await
    }

    /// Replace the workspace document with a saved prompt
    pub async fn load(&self, request: LoadRequest) -> WorkspaceResponse<()> {
        debug!(name = %request.name, "load: called");
        self.request(|reply| WorkspaceCommand::Load { request, reply }).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> WorkspaceResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(WorkspaceCommand::Shutdown)
            .await
            .map_err(|_| WorkspaceError::ChannelError)
    }
}

/// The actor loop that processes commands
async fn actor_loop(mut reconciler: Reconciler, mut rx: mpsc::Receiver<WorkspaceCommand>) {
    debug!("actor_loop: called");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            WorkspaceCommand::AssistantMessage { text, reply } => {
                debug!("actor_loop: AssistantMessage command");
                let _ = reply.send(reconciler.on_assistant_message(&text));
            }

            WorkspaceCommand::UserMessage { text, reply } => {
                debug!("actor_loop: UserMessage command");
                let _ = reply.send(reconciler.on_user_message(&text));
            }

            WorkspaceCommand::GetDocument { reply } => {
                let _ = reply.send(reconciler.view());
            }

            WorkspaceCommand::Snapshot { reply } => {
                let _ = reply.send(reconciler.document().clone());
            }

            WorkspaceCommand::GetPending { reply } => {
                let _ = reply.send(reconciler.pending().cloned());
            }

            WorkspaceCommand::GetCurrentSection { reply } => {
                let _ = reply.send(reconciler.current_section().map(str::to_string));
            }

            WorkspaceCommand::ClearDocument { reply } => {
                debug!("actor_loop: ClearDocument command");
                reconciler.clear_document();
                let _ = reply.send(());
            }

            WorkspaceCommand::ReorderSections { order, reply } => {
                debug!("actor_loop: ReorderSections command");
                let result = reconciler.reorder_sections(order.as_slice()).map_err(WorkspaceError::from);
                let _ = reply.send(result);
            }

            WorkspaceCommand::MoveSection { from, to, reply } => {
                debug!(from, to, "actor_loop: MoveSection command");
                let result = reconciler
                    .document_mut()
                    .move_section(from, to)
                    .map_err(WorkspaceError::from);
                let _ = reply.send(result);
            }

            WorkspaceCommand::SetName { name, reply } => {
                reconciler.document_mut().set_name(name);
                let _ = reply.send(());
            }

            WorkspaceCommand::SetTechnique { technique, reply } => {
                reconciler.document_mut().set_technique(technique);
                let _ = reply.send(());
            }

            WorkspaceCommand::EditSection { key, content, reply } => {
                debug!(%key, "actor_loop: EditSection command");
                let result = reconciler
                    .document_mut()
                    .upsert(&key, &content)
                    .map_err(WorkspaceError::from);
                let _ = reply.send(result);
            }

            WorkspaceCommand::AppendToSection { key, content, reply } => {
                debug!(%key, "actor_loop: AppendToSection command");
                let result = reconciler
                    .document_mut()
                    .append_to_section(&key, &content)
                    .map_err(WorkspaceError::from);
                let _ = reply.send(result);
            }

            WorkspaceCommand::RemoveSection { key, reply } => {
                debug!(%key, "actor_loop: RemoveSection command");
                let result = reconciler
                    .document_mut()
                    .remove(&key)
                    .map(|_| ())
                    .map_err(WorkspaceError::from);
                let _ = reply.send(result);
            }

            WorkspaceCommand::LinkLibrary { id, reply } => {
                reconciler.document_mut().link_library(id);
                let _ = reply.send(());
            }

            WorkspaceCommand::Load { request, reply } => {
                debug!(name = %request.name, "actor_loop: Load command");
                reconciler.discard_pending();
                reconciler.document_mut().load(
                    &request.name,
                    request.technique,
                    request.library_id,
                    request.sections,
                );
                let _ = reply.send(());
            }

            WorkspaceCommand::Shutdown => {
                info!("WorkspaceManager shutting down");
                break;
            }
        }
    }

    debug!("WorkspaceManager actor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentError;

    const ROLE_MSG: &str = "## Section 1: Role\n\n```\nYou are a helpful tutor.\n```\n\nUse this?";

    #[tokio::test]
    async fn test_reconcile_through_actor() {
        let manager = WorkspaceManager::spawn(Reconciler::new());

        let outcome = manager.on_assistant_message(ROLE_MSG).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::SectionAdded { key: "role".to_string() });

        let doc = manager.get_document().await.unwrap();
        assert_eq!(doc.keys(), vec!["role"]);
        assert_eq!(doc.sections[0].label, "Role");

        manager
            .on_assistant_message("I've refined the Role section:\n```\nv2\n```")
            .await
            .unwrap();
        assert_eq!(manager.pending().await.unwrap().map(|p| p.content), Some("v2".to_string()));

        let turn = manager.on_user_message("sure thing").await.unwrap();
        assert_eq!(turn.applied.as_deref(), Some("role"));
        let doc = manager.get_document().await.unwrap();
        assert_eq!(doc.section("role").unwrap().content, "v2");

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_edits_and_reorder() {
        let manager = WorkspaceManager::spawn(Reconciler::new());
        manager.edit_section("task", "Summarize").await.unwrap();
        manager.edit_section("output", "Bullets").await.unwrap();
        manager.append_to_section("task", "the report").await.unwrap();
        manager.set_name("Summary").await.unwrap();

        let err = manager.reorder_sections(vec!["task".to_string()]).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Document(DocumentError::OrderMismatch { .. })));

        manager.move_section(1, 0).await.unwrap();
        let doc = manager.get_document().await.unwrap();
        assert_eq!(doc.name, "Summary");
        assert_eq!(doc.keys(), vec!["output", "task"]);
        assert_eq!(doc.section("task").unwrap().content, "Summarize\n\nthe report");

        manager.remove_section("output").await.unwrap();
        assert!(manager.remove_section("output").await.is_err());
        assert!(manager.edit_section("tone", "   ").await.is_err());

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_load_and_clear() {
        let manager = WorkspaceManager::spawn(Reconciler::new());
        manager
            .load(LoadRequest {
                name: "Saved".to_string(),
                technique: Some("taco".to_string()),
                library_id: Some("lib-1".to_string()),
                sections: vec![("task".to_string(), "t".to_string())],
            })
            .await
            .unwrap();

        let snapshot = manager.snapshot().await.unwrap();
        assert_eq!(snapshot.library_id(), Some("lib-1"));
        assert_eq!(manager.get_document().await.unwrap().technique, "TACO");

        manager.clear_document().await.unwrap();
        let doc = manager.get_document().await.unwrap();
        assert!(doc.sections.is_empty());
        assert_eq!(doc.library_id, None);
        assert_eq!(doc.technique, "");

        manager.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_errors_after_shutdown() {
        let manager = WorkspaceManager::spawn(Reconciler::new());
        manager.shutdown().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(matches!(manager.get_document().await, Err(WorkspaceError::ChannelError)));
    }
}
