//! Chat session: one conversation with Chad against a workspace

use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::ChatConfig;
use crate::domain::ConversationLog;
use crate::llm::{CompletionRequest, LlmClient, LlmError, Message};
use crate::prompts::PromptLoader;
use crate::reconcile::ReconcileOutcome;
use crate::state::WorkspaceManager;

/// Shown instead of calling the model when no provider is usable
pub const CREDENTIALS_GUIDANCE: &str = "Please configure your API key in Settings to start chatting with Chad.";

/// Chat message for a failed completion
pub fn error_message(error: &LlmError) -> String {
    format!("Error: {}. Please check your API key in Settings.", error)
}

/// What happened to one submitted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input, nothing recorded
    Ignored,
    /// No client configured; the guidance message was appended
    NotConfigured { applied: Option<String> },
    /// Chad replied and the reply was reconciled into the document
    Replied {
        reply: String,
        outcome: ReconcileOutcome,
        applied: Option<String>,
    },
    /// The completion failed; the error message was appended
    Failed { message: String, applied: Option<String> },
}

impl SubmitOutcome {
    /// Key of the pending refinement the user's message confirmed
    pub fn applied(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Ignored => None,
            SubmitOutcome::NotConfigured { applied }
            | SubmitOutcome::Replied { applied, .. }
            | SubmitOutcome::Failed { applied, .. } => applied.as_deref(),
        }
    }
}

/// Conversation log plus everything needed to talk to Chad
pub struct ChatSession {
    workspace: WorkspaceManager,
    llm: Option<Arc<dyn LlmClient>>,
    prompts: PromptLoader,
    system_prompt: String,
    log: ConversationLog,
    max_tokens: u32,
    preview_chars: usize,
}

impl ChatSession {
    /// Start a session; the log opens with Chad's greeting
    pub fn new(
        workspace: WorkspaceManager,
        llm: Option<Arc<dyn LlmClient>>,
        prompts: PromptLoader,
        chat: &ChatConfig,
        max_tokens: u32,
    ) -> Result<Self> {
        debug!(configured = llm.is_some(), "ChatSession::new: called");
        let system_prompt = prompts
            .system_prompt(&chat.reset_marker)
            .context("Failed to render system prompt")?;
        let greeting = prompts.greeting().context("Failed to load greeting")?;

        let mut log = ConversationLog::new();
        log.push_assistant(greeting);

        Ok(Self {
            workspace,
            llm,
            prompts,
            system_prompt,
            log,
            max_tokens,
            preview_chars: chat.context_preview_chars,
        })
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn workspace(&self) -> &WorkspaceManager {
        &self.workspace
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Handle one user message end to end
    pub async fn submit(&mut self, text: &str) -> Result<SubmitOutcome> {
        debug!(len = text.len(), "submit: called");
        if text.trim().is_empty() {
            debug!("submit: blank input, ignoring");
            return Ok(SubmitOutcome::Ignored);
        }

        // a confirmation lands before anything else, even without a provider
        let turn = self.workspace.on_user_message(text).await?;
        if let Some(key) = &turn.applied {
            info!(%key, "Pending refinement confirmed");
        }

        let Some(llm) = self.llm.clone() else {
            debug!("submit: no LLM client configured");
            self.log.push_assistant(CREDENTIALS_GUIDANCE);
            return Ok(SubmitOutcome::NotConfigured { applied: turn.applied });
        };

        let history = self.log.to_messages();
        self.log.push_user(text);

        let view = self.workspace.get_document().await?;
        let context = self
            .prompts
            .prompt_state(&view, self.preview_chars)
            .context("Failed to render prompt state")?;

        let mut messages = history;
        messages.push(Message::user(format!("{}{}", context, turn.forwarded)));

        let request = CompletionRequest {
            system_prompt: self.system_prompt.clone(),
            messages,
            max_tokens: self.max_tokens,
        };

        let result = llm.complete(request).await.and_then(|response| {
            response
                .content
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| LlmError::InvalidResponse("Empty response from model".to_string()))
        });

        match result {
            Ok(reply) => {
                self.log.push_assistant(reply.clone());
                let outcome = self.workspace.on_assistant_message(&reply).await?;
                debug!(?outcome, "submit: reply reconciled");
                Ok(SubmitOutcome::Replied {
                    reply,
                    outcome,
                    applied: turn.applied,
                })
            }
            Err(e) => {
                warn!(error = %e, "Completion failed");
                let message = error_message(&e);
                self.log.push_assistant(message.clone());
                Ok(SubmitOutcome::Failed {
                    message,
                    applied: turn.applied,
                })
            }
        }
    }
}
