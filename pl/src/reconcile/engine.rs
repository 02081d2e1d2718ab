//! Reconciler - merges assistant proposals into the prompt document
//!
//! State is the document plus at most one pending refinement:
//!
//! ```text
//! no-pending --new section--------> no-pending   (applied immediately)
//! no-pending --refinement---------> pending
//! pending    --refinement---------> pending      (replaced)
//! pending    --user confirms------> no-pending   (applied)
//! pending    --reset marker-------> no-pending   (discarded)
//! pending    --new section--------> no-pending   (applied, stale pending dropped)
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::{DocumentError, DocumentView, PromptDocument};
use crate::sections::{PatternDetector, SectionDetector, is_confirming};

/// Literal the model emits when the user asks to start over
pub const DEFAULT_RESET_MARKER: &str = "[CLEAR]";

/// A proposed replacement for an existing section, awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRefinement {
    pub key: String,
    pub content: String,
}

/// What an assistant message did to the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Reset marker seen: document and pending refinement wiped
    Cleared,
    /// New section appended to the document
    SectionAdded { key: String },
    /// Refinement for an existing section staged until the user confirms
    RefinementStaged { key: String },
    /// Section named without content: only the focus pointer moved
    SectionFocused { key: String },
    /// Nothing recognizable in the message
    NoChange,
}

/// Result of running a user message through the confirmation check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTurn {
    /// Text to send on to the model, unchanged
    pub forwarded: String,
    /// Section key written by a confirmed refinement
    pub applied: Option<String>,
}

/// Owns the document and pending refinement for one workspace session
pub struct Reconciler {
    document: PromptDocument,
    pending: Option<PendingRefinement>,
    current_section: Option<String>,
    detector: Box<dyn SectionDetector>,
    reset_marker: String,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    /// Reconciler with the regex detector and the `[CLEAR]` marker
    pub fn new() -> Self {
        Self::with_detector(Box::new(PatternDetector::new()), DEFAULT_RESET_MARKER)
    }

    pub fn with_detector(detector: Box<dyn SectionDetector>, reset_marker: impl Into<String>) -> Self {
        let reset_marker = reset_marker.into();
        debug!(%reset_marker, "Reconciler::with_detector: called");
        Self {
            document: PromptDocument::new(),
            pending: None,
            current_section: None,
            detector,
            reset_marker,
        }
    }

    pub fn document(&self) -> &PromptDocument {
        &self.document
    }

    /// Direct access for manual edits (rename, edit, remove, load)
    pub fn document_mut(&mut self) -> &mut PromptDocument {
        &mut self.document
    }

    pub fn view(&self) -> DocumentView {
        self.document.view()
    }

    pub fn pending(&self) -> Option<&PendingRefinement> {
        self.pending.as_ref()
    }

    /// Section most recently named by the assistant
    pub fn current_section(&self) -> Option<&str> {
        self.current_section.as_deref()
    }

    pub fn reset_marker(&self) -> &str {
        &self.reset_marker
    }

    /// Clear the document and drop any staged refinement
    pub fn clear_document(&mut self) {
        info!("Reconciler: clearing document");
        self.document.clear();
        self.pending = None;
        self.current_section = None;
    }

    pub fn reorder_sections<S: AsRef<str>>(&mut self, order: &[S]) -> Result<(), DocumentError> {
        self.document.reorder(order)
    }

    /// Drop the staged refinement without applying it
    pub fn discard_pending(&mut self) -> Option<PendingRefinement> {
        debug!("discard_pending: called");
        self.pending.take()
    }

    /// Reconcile the newest assistant message into the document
    pub fn on_assistant_message(&mut self, text: &str) -> ReconcileOutcome {
        debug!(len = text.len(), "on_assistant_message: called");

        if !self.reset_marker.is_empty() && text.contains(&self.reset_marker) {
            info!("on_assistant_message: reset marker found");
            self.clear_document();
            return ReconcileOutcome::Cleared;
        }

        let Some(detection) = self.detector.detect(text) else {
            debug!("on_assistant_message: nothing detected");
            return ReconcileOutcome::NoChange;
        };

        let key = detection.key;
        self.current_section = Some(key.clone());

        let Some(content) = detection.proposed_content else {
            debug!(%key, "on_assistant_message: section named without content");
            return ReconcileOutcome::SectionFocused { key };
        };

        if self.document.contains(&key) {
            debug!(%key, replaced = self.pending.is_some(), "on_assistant_message: staging refinement");
            self.pending = Some(PendingRefinement {
                key: key.clone(),
                content,
            });
            return ReconcileOutcome::RefinementStaged { key };
        }

        match self.document.upsert(&key, &content) {
            Ok(_) => {
                debug!(%key, "on_assistant_message: new section applied");
                self.pending = None;
                ReconcileOutcome::SectionAdded { key }
            }
            Err(e) => {
                warn!(%key, error = %e, "on_assistant_message: detection rejected by document");
                ReconcileOutcome::NoChange
            }
        }
    }

    /// Apply a pending refinement if this user message confirms it
    ///
    /// Must run before the message is forwarded to the model.
    pub fn on_user_message(&mut self, text: &str) -> UserTurn {
        debug!(len = text.len(), has_pending = self.pending.is_some(), "on_user_message: called");

        let applied = match self.pending.take() {
            Some(pending) if is_confirming(text) => match self.document.upsert(&pending.key, &pending.content) {
                Ok(change) => {
                    info!(key = %pending.key, ?change, "on_user_message: refinement confirmed");
                    Some(pending.key)
                }
                Err(e) => {
                    warn!(key = %pending.key, error = %e, "on_user_message: confirmed refinement rejected");
                    None
                }
            },
            Some(pending) => {
                debug!(key = %pending.key, "on_user_message: not a confirmation, keeping pending");
                self.pending = Some(pending);
                None
            }
            None => None,
        };

        UserTurn {
            forwarded: text.to_string(),
            applied,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::{DetectionPattern, SectionDetection};

    const ROLE_MSG: &str = "## Section 1: Role\n\n```\nYou are a helpful tutor.\n```\n\nUse this?";

    fn refine_role(content: &str) -> String {
        format!("I've refined the Role section:\n```\n{}\n```\nDoes that work?", content)
    }

    #[test]
    fn test_new_section_applied_immediately() {
        let mut r = Reconciler::new();
        let outcome = r.on_assistant_message(ROLE_MSG);
        assert_eq!(outcome, ReconcileOutcome::SectionAdded { key: "role".to_string() });
        assert_eq!(r.document().get("role"), Some("You are a helpful tutor."));
        assert_eq!(r.document().keys().collect::<Vec<_>>(), vec!["role"]);
        assert!(r.pending().is_none());
        assert_eq!(r.current_section(), Some("role"));
    }

    #[test]
    fn test_existing_key_stages_refinement() {
        let mut r = Reconciler::new();
        r.on_assistant_message(ROLE_MSG);

        let outcome = r.on_assistant_message(&refine_role("You are a patient math tutor."));
        assert_eq!(outcome, ReconcileOutcome::RefinementStaged { key: "role".to_string() });
        assert_eq!(r.document().get("role"), Some("You are a helpful tutor."));
        assert_eq!(
            r.pending(),
            Some(&PendingRefinement {
                key: "role".to_string(),
                content: "You are a patient math tutor.".to_string(),
            })
        );

        let turn = r.on_user_message("yes");
        assert_eq!(turn.forwarded, "yes");
        assert_eq!(turn.applied.as_deref(), Some("role"));
        assert_eq!(r.document().get("role"), Some("You are a patient math tutor."));
        assert!(r.pending().is_none());
    }

    #[test]
    fn test_repeated_detection_is_not_a_silent_overwrite() {
        let mut r = Reconciler::new();
        r.on_assistant_message(ROLE_MSG);
        let outcome = r.on_assistant_message("## Section 1: Role\n```\nSomething else\n```");
        assert!(matches!(outcome, ReconcileOutcome::RefinementStaged { .. }));
        assert_eq!(r.document().get("role"), Some("You are a helpful tutor."));
    }

    #[test]
    fn test_non_confirming_reply_keeps_pending() {
        let mut r = Reconciler::new();
        r.on_assistant_message(ROLE_MSG);
        r.on_assistant_message(&refine_role("v2"));

        let turn = r.on_user_message("hmm, can you make it shorter?");
        assert_eq!(turn.applied, None);
        assert_eq!(turn.forwarded, "hmm, can you make it shorter?");
        assert_eq!(r.pending().map(|p| p.content.as_str()), Some("v2"));
        assert_eq!(r.document().get("role"), Some("You are a helpful tutor."));
    }

    #[test]
    fn test_new_refinement_replaces_pending() {
        let mut r = Reconciler::new();
        r.on_assistant_message(ROLE_MSG);
        r.on_assistant_message("## Section 2: Task\n```\nExplain fractions\n```");
        r.on_assistant_message(&refine_role("v2"));
        r.on_assistant_message("I've updated the Task section:\n```\nExplain decimals\n```");

        assert_eq!(r.pending().map(|p| p.key.as_str()), Some("task"));
        r.on_user_message("perfect");
        assert_eq!(r.document().get("task"), Some("Explain decimals"));
        assert_eq!(r.document().get("role"), Some("You are a helpful tutor."));
    }

    #[test]
    fn test_new_section_discards_stale_pending() {
        let mut r = Reconciler::new();
        r.on_assistant_message(ROLE_MSG);
        r.on_assistant_message(&refine_role("v2"));
        let outcome = r.on_assistant_message("## Section 2: Task\n```\nExplain fractions\n```");
        assert_eq!(outcome, ReconcileOutcome::SectionAdded { key: "task".to_string() });
        assert!(r.pending().is_none());

        let turn = r.on_user_message("yes");
        assert_eq!(turn.applied, None);
        assert_eq!(r.document().get("role"), Some("You are a helpful tutor."));
    }

    #[test]
    fn test_reset_marker_clears_everything() {
        let mut r = Reconciler::new();
        r.on_assistant_message(ROLE_MSG);
        r.document_mut().set_name("Tutor");
        r.on_assistant_message(&refine_role("v2"));

        let outcome = r.on_assistant_message("[CLEAR] Done! Starting fresh.\n## Section 1: Task\n```\nNew task\n```");
        assert_eq!(outcome, ReconcileOutcome::Cleared);
        assert!(r.document().is_empty());
        assert_eq!(r.document().name(), "");
        assert!(r.pending().is_none());
        assert!(r.current_section().is_none());
    }

    #[test]
    fn test_reset_marker_is_case_sensitive() {
        let mut r = Reconciler::new();
        r.on_assistant_message(ROLE_MSG);
        assert_eq!(r.on_assistant_message("[clear] maybe?"), ReconcileOutcome::NoChange);
        assert!(!r.document().is_empty());
    }

    #[test]
    fn test_custom_reset_marker() {
        let mut r = Reconciler::with_detector(Box::new(PatternDetector::new()), "<<RESET>>");
        r.on_assistant_message(ROLE_MSG);
        assert_eq!(r.on_assistant_message("[CLEAR]"), ReconcileOutcome::NoChange);
        assert_eq!(r.on_assistant_message("ok <<RESET>>"), ReconcileOutcome::Cleared);
    }

    #[test]
    fn test_header_without_content_only_moves_focus() {
        let mut r = Reconciler::new();
        r.on_assistant_message(ROLE_MSG);
        r.on_assistant_message(&refine_role("v2"));

        let outcome = r.on_assistant_message("## Section 2: Context\nTell me about your students.");
        assert_eq!(outcome, ReconcileOutcome::SectionFocused { key: "context".to_string() });
        assert_eq!(r.current_section(), Some("context"));
        assert!(!r.document().contains("context"));
        assert_eq!(r.pending().map(|p| p.key.as_str()), Some("role"));
    }

    #[test]
    fn test_confirmation_without_pending_is_pass_through() {
        let mut r = Reconciler::new();
        let turn = r.on_user_message("yes");
        assert_eq!(turn.applied, None);
        assert!(r.document().is_empty());
    }

    #[test]
    fn test_confirmed_refinement_for_removed_section_is_reinserted() {
        let mut r = Reconciler::new();
        r.on_assistant_message(ROLE_MSG);
        r.on_assistant_message(&refine_role("v2"));
        r.document_mut().remove("role").unwrap();

        let turn = r.on_user_message("ok");
        assert_eq!(turn.applied.as_deref(), Some("role"));
        assert_eq!(r.document().get("role"), Some("v2"));
    }

    #[test]
    fn test_reorder_through_reconciler() {
        let mut r = Reconciler::new();
        r.on_assistant_message(ROLE_MSG);
        r.on_assistant_message("## Section 2: Task\n```\nExplain fractions\n```");
        assert!(r.reorder_sections(&["task"]).is_err());
        r.reorder_sections(&["task", "role"]).unwrap();
        assert_eq!(r.view().keys(), vec!["task", "role"]);
    }

    struct FixedDetector(Option<SectionDetection>);

    impl SectionDetector for FixedDetector {
        fn detect(&self, _message: &str) -> Option<SectionDetection> {
            self.0.clone()
        }
    }

    #[test]
    fn test_detector_is_pluggable() {
        let detection = SectionDetection {
            key: "persona".to_string(),
            label: "Persona".to_string(),
            proposed_content: Some("A pirate".to_string()),
            pattern: DetectionPattern::Bold,
        };
        let mut r = Reconciler::with_detector(Box::new(FixedDetector(Some(detection))), DEFAULT_RESET_MARKER);
        assert_eq!(
            r.on_assistant_message("anything"),
            ReconcileOutcome::SectionAdded { key: "persona".to_string() }
        );
        assert_eq!(r.document().get("persona"), Some("A pirate"));
    }
}
