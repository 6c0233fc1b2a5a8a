//! Command handling for the terminal client.

use std::sync::Arc;

use seer_core::{
    Mailbox, OracleOutcome, OracleResponder, PanelState, StoreEvent, Submission,
    TimelineSynchronizer,
};

use crate::state::AppState;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    Ask(String),
    Name(String),
    Quit,
    Help,
    /// Anything else goes to the chat input box
    Say(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (trimmed, ""),
        };

        match head {
            "/open" => Command::Open,
            "/close" => Command::Close,
            "/ask" => Command::Ask(rest.to_string()),
            "/name" => Command::Name(rest.to_string()),
            "/quit" | "/exit" => Command::Quit,
            "/help" => Command::Help,
            _ => Command::Say(line.to_string()),
        }
    }
}

pub const HELP: &str = "Commands: /open, /close, /ask QUESTION (GM), /name NEW_NAME, /quit. \
The GM can type /clearchat to clear the chat. Anything else is posted.";

/// What the event loop should do after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue(Vec<String>),
    /// Start an oracle request in the background
    Ask(String),
    Quit,
}

/// The client: one participant's mailbox, synchronizer and view.
pub struct ChatApp {
    mailbox: Arc<Mailbox>,
    oracle: Arc<OracleResponder>,
    sync: TimelineSynchronizer,
    state: AppState,
}

impl ChatApp {
    pub fn new(
        mailbox: Arc<Mailbox>,
        oracle: Arc<OracleResponder>,
        sync: TimelineSynchronizer,
        panel: PanelState,
    ) -> Self {
        Self {
            mailbox,
            oracle,
            sync,
            state: AppState::new(panel),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn oracle(&self) -> Arc<OracleResponder> {
        self.oracle.clone()
    }

    /// Initial load.
    pub async fn start(&mut self) -> Vec<String> {
        let mut lines = vec![format!(
            "Joined as {} ({})",
            self.mailbox.session().author_label(),
            self.mailbox.identity()
        )];
        lines.extend(self.refresh().await);
        if !self.state.ready {
            lines.push(crate::state::NO_SESSION.to_string());
        }
        lines
    }

    pub async fn refresh(&mut self) -> Vec<String> {
        match self.sync.refresh().await {
            Ok(update) => self.state.apply(update, self.sync.timeline()),
            Err(e) => vec![format!("Sync failed: {}", e)],
        }
    }

    /// Wait for the next store notification. Cancel safe.
    pub async fn next_event(&mut self) -> Option<StoreEvent> {
        self.sync.next_event().await
    }

    pub async fn handle_event(&mut self, event: StoreEvent) -> Vec<String> {
        match self.sync.handle_event(event).await {
            Ok(update) => {
                tracing::debug!("Store event {:?} -> {:?}", event, update);
                self.state.apply(update, self.sync.timeline())
            }
            Err(e) => {
                tracing::warn!("Failed to apply store event: {}", e);
                vec![format!("Sync failed: {}", e)]
            }
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Flow {
        match Command::parse(line) {
            Command::Open => {
                Flow::Continue(self.state.set_panel(PanelState::Open, self.sync.timeline()))
            }
            Command::Close => {
                Flow::Continue(self.state.set_panel(PanelState::Closed, self.sync.timeline()))
            }
            Command::Quit => Flow::Quit,
            Command::Help => Flow::Continue(vec![HELP.to_string()]),
            Command::Name(name) => {
                if name.is_empty() {
                    return Flow::Continue(vec!["Usage: /name NEW_NAME".to_string()]);
                }
                self.mailbox.set_display_name(&name);
                Flow::Continue(vec![format!("Display name set to {}", name)])
            }
            Command::Ask(prompt) => {
                if !self.mailbox.session().is_privileged() {
                    return Flow::Continue(vec!["Only the GM can consult the Seer".to_string()]);
                }
                if prompt.is_empty() {
                    return Flow::Continue(vec!["Usage: /ask QUESTION".to_string()]);
                }
                Flow::Ask(prompt)
            }
            Command::Say(text) => Flow::Continue(self.submit(&text).await),
        }
    }

    async fn submit(&mut self, text: &str) -> Vec<String> {
        match self.mailbox.submit(text).await {
            Ok(Submission::Posted(message)) => {
                tracing::debug!("Submitted message {}", message.id);
                Vec::new()
            }
            Ok(Submission::Cleared) | Ok(Submission::Ignored) => Vec::new(),
            Err(seer_core::Error::SessionNotReady) => vec![crate::state::NO_SESSION.to_string()],
            Err(e) => vec![format!("Could not send: {}", e)],
        }
    }

    /// Report a finished oracle request. The reply itself shows up through
    /// the synchronizer like any other message.
    pub fn handle_oracle(&mut self, outcome: seer_core::Result<OracleOutcome>) -> Vec<String> {
        match outcome {
            Ok(OracleOutcome::FellBack(_)) => {
                tracing::info!("The Seer could not answer; fallback posted");
                Vec::new()
            }
            Ok(_) => Vec::new(),
            Err(e) => vec![format!("Could not post the Seer's reply: {}", e)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use seer_core::{MemoryStore, Role, SessionContext, TextGenerator};

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str) -> seer_core::Result<String> {
            Ok(format!("You asked: {}", prompt))
        }
    }

    fn app(
        store: &Arc<MemoryStore>,
        identity: &str,
        name: &str,
        role: Role,
        panel: PanelState,
    ) -> ChatApp {
        let session = SessionContext::new(identity, name, role);
        let sync = TimelineSynchronizer::new(store.clone(), session.identity.clone());
        let mailbox = Arc::new(Mailbox::new(store.clone(), session));
        let oracle = Arc::new(OracleResponder::new(mailbox.clone(), Arc::new(Echo)));
        ChatApp::new(mailbox, oracle, sync, panel)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/open"), Command::Open);
        assert_eq!(Command::parse(" /close "), Command::Close);
        assert_eq!(
            Command::parse("/ask  who is there? "),
            Command::Ask("who is there?".into())
        );
        assert_eq!(Command::parse("/name Bran"), Command::Name("Bran".into()));
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/clearchat"), Command::Say("/clearchat".into()));
        assert_eq!(Command::parse("hello /open"), Command::Say("hello /open".into()));
    }

    #[tokio::test]
    async fn test_messages_from_other_client_are_printed() {
        let store = Arc::new(MemoryStore::new());
        let mut alice = app(&store, "p1", "Alice", Role::Player, PanelState::Open);
        let mut bob = app(&store, "p2", "Bob", Role::Player, PanelState::Open);
        alice.start().await;
        bob.start().await;

        assert_eq!(bob.handle_line("hi alice").await, Flow::Continue(Vec::new()));

        let event = alice.next_event().await.unwrap();
        let lines = alice.handle_event(event).await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("Bob: hi alice"));
    }

    #[tokio::test]
    async fn test_player_cannot_ask() {
        let store = Arc::new(MemoryStore::new());
        let mut alice = app(&store, "p1", "Alice", Role::Player, PanelState::Open);

        let Flow::Continue(lines) = alice.handle_line("/ask anything").await else {
            panic!("player must not reach the oracle");
        };
        assert_eq!(lines, vec!["Only the GM can consult the Seer"]);
    }

    #[tokio::test]
    async fn test_gm_ask_runs_oracle() {
        let store = Arc::new(MemoryStore::new());
        let mut gm = app(&store, "gm", "Morgan", Role::Gm, PanelState::Open);

        let Flow::Ask(prompt) = gm.handle_line("/ask where is the key?").await else {
            panic!("expected an oracle request");
        };
        let outcome = gm.oracle().respond(&prompt).await;
        assert!(gm.handle_oracle(outcome).is_empty());

        let lines = gm.refresh().await;
        assert!(lines.iter().any(|l| l.ends_with("Seer: You asked: where is the key?")));
    }

    #[tokio::test]
    async fn test_name_change_applies() {
        let store = Arc::new(MemoryStore::new());
        let mut alice = app(&store, "p1", "Alice", Role::Player, PanelState::Open);
        alice.start().await;

        alice.handle_line("/name Alicia").await;
        alice.handle_line("hello").await;

        let lines = alice.refresh().await;
        assert!(lines[0].ends_with("Alicia: hello"));
    }

    #[tokio::test]
    async fn test_closed_panel_badge_then_open() {
        let store = Arc::new(MemoryStore::new());
        let mut alice = app(&store, "p1", "Alice", Role::Player, PanelState::Closed);
        let mut bob = app(&store, "p2", "Bob", Role::Player, PanelState::Open);
        alice.start().await;

        bob.handle_line("one").await;
        assert_eq!(alice.refresh().await, vec!["[1 unread]"]);

        let Flow::Continue(lines) = alice.handle_line("/open").await else {
            panic!("expected output");
        };
        assert!(lines[0].ends_with("Bob: one"));
        assert_eq!(lines.last().unwrap(), "[all read]");
    }

    #[tokio::test]
    async fn test_post_without_session() {
        let store = Arc::new(MemoryStore::new());
        store.set_ready(false);
        let mut alice = app(&store, "p1", "Alice", Role::Player, PanelState::Open);

        let lines = alice.start().await;
        assert_eq!(lines.last().unwrap(), crate::state::NO_SESSION);

        let Flow::Continue(lines) = alice.handle_line("hello").await else {
            panic!("expected output");
        };
        assert_eq!(lines, vec![crate::state::NO_SESSION]);
    }
}
