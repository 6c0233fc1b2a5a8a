//! Mailbox model: the chat's shape inside the shared document.
//!
//! Each participant appends to an outbox keyed by their identity; the
//! timeline is always derived by merging every outbox, never stored.

mod document;
mod ids;
pub mod markup;
mod model;
mod writer;

pub use document::ChatDocument;
pub use ids::MessageIdGenerator;
pub use model::{append_message, build_timeline, clear_all, extract_outbox};
pub use writer::{Mailbox, Submission, CLEAR_COMMAND};

/// Top-level document key holding every outbox.
pub const CHAT_NAMESPACE_KEY: &str = "mythicbastionland.extension/metadata";

/// Top-level document key stamped on every write so identical content still
/// produces a change notification.
pub const LAST_MODIFIED_KEY: &str = "grimwild.date.extension/metadata";
