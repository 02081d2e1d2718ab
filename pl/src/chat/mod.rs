//! Chat with Chad: the session logic and its interactive REPL

mod repl;
mod session;

pub use repl::{ChatRepl, SlashCommand};
pub use session::{CREDENTIALS_GUIDANCE, ChatSession, SubmitOutcome, error_message};
