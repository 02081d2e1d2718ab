//! Prompt templates for Chad
//!
//! Templates use Handlebars syntax and live in `.pmt` files; embedded
//! copies are used when no file overrides them.

mod embedded;
mod loader;

pub use embedded::get_embedded;
pub use loader::{PromptLoader, PromptStateContext, SystemContext, preview};
