//! Timeline synchronization and unread tracking.

mod synchronizer;
mod unread;

pub use synchronizer::{SyncUpdate, TimelineSynchronizer};
pub use unread::{PanelState, UnreadTracker};
