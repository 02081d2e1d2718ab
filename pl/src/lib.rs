//! Promptly - guided prompt-engineering assistant
//!
//! Chad, the chat assistant, proposes prompt sections one at a time. This
//! crate turns those free-form replies into a structured, technique-based
//! prompt document and keeps finished prompts in a per-user library.
//!
//! The pipeline, bottom-up:
//!
//! - [`sections`]: label normalization, section detection, confirmation
//! - [`technique`]: the technique catalog and technique inference
//! - [`domain`]: the prompt document and the chat log
//! - [`reconcile`]: applies assistant proposals and user confirmations
//! - [`state`]: the workspace actor that owns a reconciler
//! - [`chat`]: the session talking to an [`llm`] provider, and its REPL

pub mod chat;
pub mod cli;
pub mod config;
pub mod domain;
pub mod library;
pub mod llm;
pub mod prompts;
pub mod reconcile;
pub mod sections;
pub mod state;
pub mod technique;
