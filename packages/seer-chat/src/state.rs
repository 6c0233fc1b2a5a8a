//! What the terminal shows.
//!
//! The printed transcript stands in for the chat panel: while the panel is
//! open new messages are printed, while it is closed they are held back and
//! counted on the unread badge.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use seer_core::{Message, PanelState, SyncUpdate, UnreadTracker};

/// Placeholder shown while no session is loaded.
pub const NO_SESSION: &str = "-- no active session --";

/// Shown when a clear empties the timeline.
pub const CLEARED: &str = "-- chat cleared --";

/// Identifies printed messages. Ids are only unique per outbox, so sender
/// and body are part of the key.
type ShownKey = (i64, String, String);

fn shown_key(message: &Message) -> ShownKey {
    (message.id, message.sender.clone(), message.body.clone())
}

/// Occurrences of each key in `timeline`.
fn occurrences(timeline: &[Message]) -> HashMap<ShownKey, usize> {
    let mut counts = HashMap::new();
    for message in timeline {
        *counts.entry(shown_key(message)).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub ready: bool,
    unread: UnreadTracker,
    /// How many copies of each message were printed
    shown: HashMap<ShownKey, usize>,
    last_badge: Option<String>,
}

impl AppState {
    pub fn new(panel: PanelState) -> Self {
        Self {
            unread: UnreadTracker::new(panel),
            ..Default::default()
        }
    }

    pub fn panel(&self) -> PanelState {
        self.unread.panel()
    }

    pub fn unread(&self) -> u32 {
        self.unread.count()
    }

    /// Apply a synchronizer update and return the lines to print.
    pub fn apply(&mut self, update: SyncUpdate, timeline: &[Message]) -> Vec<String> {
        let mut lines = Vec::new();

        match update {
            SyncUpdate::Unchanged => return lines,
            SyncUpdate::Unready => {
                self.ready = false;
                self.shown.clear();
                lines.push(NO_SESSION.to_string());
            }
            SyncUpdate::Ready { .. } => {
                self.ready = true;
            }
            SyncUpdate::Republished { previous_len, len } => {
                if len < previous_len {
                    let remaining = occurrences(timeline);
                    self.shown.retain(|key, printed| match remaining.get(key) {
                        Some(&count) => {
                            *printed = (*printed).min(count);
                            true
                        }
                        None => false,
                    });
                    if len == 0 {
                        lines.push(CLEARED.to_string());
                    }
                }
            }
        }

        self.unread.observe(&update);
        if self.panel() == PanelState::Open {
            lines.extend(self.take_unseen(timeline));
        }
        lines.extend(self.badge_line());
        lines
    }

    /// Open or close the panel. Opening prints everything held back.
    pub fn set_panel(&mut self, panel: PanelState, timeline: &[Message]) -> Vec<String> {
        self.unread.set_panel(panel);

        let mut lines = Vec::new();
        if panel == PanelState::Open {
            if self.ready {
                lines.extend(self.take_unseen(timeline));
            } else {
                lines.push(NO_SESSION.to_string());
            }
        }
        lines.extend(self.badge_line());
        lines
    }

    fn take_unseen(&mut self, timeline: &[Message]) -> Vec<String> {
        let mut seen: HashMap<ShownKey, usize> = HashMap::new();
        let mut lines = Vec::new();
        for message in timeline {
            let key = shown_key(message);
            let nth = seen.entry(key.clone()).or_insert(0);
            *nth += 1;
            let printed = self.shown.entry(key).or_insert(0);
            if *nth > *printed {
                *printed = *nth;
                lines.push(format_message(message));
            }
        }
        lines
    }

    /// A badge line when the badge text changed since last shown.
    fn badge_line(&mut self) -> Option<String> {
        let badge = self.unread.badge();
        if badge == self.last_badge {
            return None;
        }
        self.last_badge = badge.clone();
        Some(match badge {
            Some(count) => format!("[{} unread]", count),
            None => "[all read]".to_string(),
        })
    }
}

/// One transcript line: local time, sender, plain body.
pub fn format_message(message: &Message) -> String {
    let time = DateTime::from_timestamp_millis(message.id)
        .map(|t| t.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    format!("[{}] {}: {}", time, message.sender, message.body)
}
