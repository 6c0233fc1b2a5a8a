//! Generated in-character replies posted into the chat.

mod generation;
mod responder;

pub use generation::TextGenerator;
pub use responder::{OracleOutcome, OracleResponder};

/// Author label on every oracle message.
pub const ORACLE_LABEL: &str = "Seer";

/// Posted in place of an answer when generation fails.
pub const FALLBACK_REPLY: &str = "The Seer stays silent.";

/// Instruction sent alongside every prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are a fantasy writer, If I give you a description, alter it to make it concise and evocative. If I give you a question, answer as if you are the Oracle of mythical land. Please limit it to one paragraph.";
