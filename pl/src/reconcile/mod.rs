//! Conversation reconciliation: assistant proposals in, document edits out

mod engine;

pub use engine::{DEFAULT_RESET_MARKER, PendingRefinement, ReconcileOutcome, Reconciler, UserTurn};
