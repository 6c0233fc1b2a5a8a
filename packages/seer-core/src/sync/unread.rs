//! Unread badge state machine.

use super::SyncUpdate;

/// Visibility of the chat panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    Open,
    #[default]
    Closed,
}

/// Counts timeline growth while the panel is closed.
///
/// Process-local and never persisted.
#[derive(Debug, Clone, Default)]
pub struct UnreadTracker {
    panel: PanelState,
    count: u32,
}

impl UnreadTracker {
    pub fn new(panel: PanelState) -> Self {
        Self { panel, count: 0 }
    }

    pub fn panel(&self) -> PanelState {
        self.panel
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Apply a panel transition. Opening always clears the count.
    pub fn set_panel(&mut self, panel: PanelState) {
        if panel == PanelState::Open && self.panel == PanelState::Closed {
            self.count = 0;
        }
        self.panel = panel;
    }

    /// One growth event of the published timeline.
    pub fn record_growth(&mut self) {
        if self.panel == PanelState::Closed {
            self.count = self.count.saturating_add(1);
        }
    }

    /// Feed a synchronizer update; only growth counts.
    pub fn observe(&mut self, update: &SyncUpdate) {
        if update.is_growth() {
            self.record_growth();
        }
    }

    /// Badge text: nothing at zero, otherwise the decimal count.
    pub fn badge(&self) -> Option<String> {
        (self.count > 0).then(|| self.count.to_string())
    }
}
