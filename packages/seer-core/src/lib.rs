//! Seer Core - shared-chat synchronization library.
//!
//! Every participant owns a small outbox inside one shared document. This
//! crate turns that document into a single time-ordered timeline and keeps it
//! current:
//!
//! - **Mailbox model**: pure functions over the shared document (append, clear,
//!   merge into a timeline, extract an outbox) and the writer that applies them
//!   against a live store
//! - **Stores**: the `SharedDocumentStore` seam, with in-memory and file-backed
//!   implementations
//! - **Sync**: timeline republishing on store changes and the unread badge
//! - **Oracle**: generated replies from an external text service, with a fixed
//!   fallback when the service fails
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use seer_core::{Mailbox, MemoryStore, Role, SessionContext, TimelineSynchronizer};
//!
//! # async fn demo() -> seer_core::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let session = SessionContext::new("p1", "Alice", Role::Player);
//!
//! let mut sync = TimelineSynchronizer::new(store.clone(), session.identity.clone());
//! let mailbox = Mailbox::new(store, session);
//!
//! mailbox.submit("hello").await?;
//! sync.refresh().await?;
//! println!("{} messages", sync.timeline().len());
//! # Ok(())
//! # }
//! ```

pub mod mailbox;
pub mod oracle;
pub mod session;
pub mod store;
pub mod sync;
pub mod types;

// Re-export commonly used types
pub use types::{ApiResponse, Message, ParticipantId, Role};

// Re-export main functionality
pub use mailbox::{
    append_message, build_timeline, clear_all, extract_outbox, ChatDocument, Mailbox,
    MessageIdGenerator, Submission, CHAT_NAMESPACE_KEY, CLEAR_COMMAND, LAST_MODIFIED_KEY,
};
pub use oracle::{
    OracleOutcome, OracleResponder, TextGenerator, FALLBACK_REPLY, ORACLE_LABEL, SYSTEM_INSTRUCTION,
};
pub use session::SessionContext;
pub use store::{
    DocumentUpdate, FileStore, MemoryStore, Metadata, SharedDocumentStore, StoreEvent, Subscription,
};
pub use sync::{PanelState, SyncUpdate, TimelineSynchronizer, UnreadTracker};

/// Error types for seer-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No active session")]
    SessionNotReady,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for seer-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Current wall-clock time in milliseconds since epoch.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
