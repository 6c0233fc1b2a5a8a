use std::sync::Arc;

use super::{TextGenerator, FALLBACK_REPLY, ORACLE_LABEL};
use crate::mailbox::markup::render_markup;
use crate::mailbox::{Mailbox, Submission, CLEAR_COMMAND};
use crate::types::Message;
use crate::Result;

/// Result of one oracle invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleOutcome {
    /// The service answered and the answer was posted
    Answered(Message),
    /// The service failed and the fallback reply was posted
    FellBack(Message),
    /// The privileged clear command ran instead
    Cleared,
    /// Blank input
    Ignored,
}

impl OracleOutcome {
    /// The message that was posted, if any.
    pub fn message(&self) -> Option<&Message> {
        match self {
            OracleOutcome::Answered(message) | OracleOutcome::FellBack(message) => Some(message),
            OracleOutcome::Cleared | OracleOutcome::Ignored => None,
        }
    }
}

/// Sends prompts to a [`TextGenerator`] and posts the answer under the
/// oracle label into the invoking participant's outbox.
///
/// Generation failures never reach the caller; they become the fallback
/// reply. Store failures still propagate. There is no cancellation, so an
/// answer that arrives late is posted anyway.
pub struct OracleResponder {
    mailbox: Arc<Mailbox>,
    generator: Arc<dyn TextGenerator>,
}

impl OracleResponder {
    pub fn new(mailbox: Arc<Mailbox>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { mailbox, generator }
    }

    pub async fn respond(&self, text: &str) -> Result<OracleOutcome> {
        let prompt = text.trim();
        if prompt.is_empty() {
            return Ok(OracleOutcome::Ignored);
        }

        if prompt == CLEAR_COMMAND && self.mailbox.session().is_privileged() {
            self.mailbox.clear_all().await?;
            return Ok(OracleOutcome::Cleared);
        }

        match self.generator.generate(prompt).await {
            Ok(answer) if !answer.trim().is_empty() => {
                let rendered = render_markup(&answer);
                match self.mailbox.post_as(ORACLE_LABEL, &answer, Some(rendered)).await? {
                    Submission::Posted(message) => Ok(OracleOutcome::Answered(message)),
                    _ => Ok(OracleOutcome::Ignored),
                }
            }
            Ok(_) => {
                tracing::warn!("Oracle returned an empty answer");
                self.fall_back().await
            }
            Err(err) => {
                tracing::warn!("Oracle request failed: {}", err);
                self.fall_back().await
            }
        }
    }

    async fn fall_back(&self) -> Result<OracleOutcome> {
        let rendered = render_markup(FALLBACK_REPLY);
        match self
            .mailbox
            .post_as(ORACLE_LABEL, FALLBACK_REPLY, Some(rendered))
            .await?
        {
            Submission::Posted(message) => Ok(OracleOutcome::FellBack(message)),
            _ => Ok(OracleOutcome::Ignored),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::{build_timeline, ChatDocument};
    use crate::session::SessionContext;
    use crate::store::{MemoryStore, SharedDocumentStore};
    use crate::types::Role;
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a fixed result and records every prompt.
    struct Scripted {
        reply: std::result::Result<String, fn() -> Error>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn answering(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(answer.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(err: fn() -> Error) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(err),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Ok(answer) => Ok(answer.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn responder(
        store: &Arc<MemoryStore>,
        role: Role,
        generator: Arc<Scripted>,
    ) -> OracleResponder {
        let mailbox = Mailbox::new(store.clone(), SessionContext::new("gm", "Morgan", role));
        OracleResponder::new(Arc::new(mailbox), generator)
    }

    async fn timeline(store: &MemoryStore) -> Vec<Message> {
        build_timeline(&ChatDocument::from_metadata(&store.get().await.unwrap()))
    }

    #[tokio::test]
    async fn test_answer_is_posted_as_oracle() {
        let store = Arc::new(MemoryStore::new());
        let generator = Scripted::answering("The tower *remembers*.");
        let oracle = responder(&store, Role::Gm, generator.clone());

        let outcome = oracle.respond("  What does the tower hold?  ").await.unwrap();

        let OracleOutcome::Answered(message) = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(message.sender, ORACLE_LABEL);
        assert_eq!(message.body, "The tower *remembers*.");
        assert!(message
            .rendered_body
            .as_deref()
            .unwrap()
            .contains("<em>remembers</em>"));
        assert_eq!(generator.prompts(), vec!["What does the tower hold?"]);
        assert_eq!(timeline(&store).await, vec![message]);
    }

    #[tokio::test]
    async fn test_malformed_response_posts_fallback() {
        let store = Arc::new(MemoryStore::new());
        let generator = Scripted::failing(|| Error::MalformedResponse("no candidates".into()));
        let oracle = responder(&store, Role::Gm, generator);

        let outcome = oracle.respond("Who rules the keep?").await.unwrap();

        assert!(matches!(outcome, OracleOutcome::FellBack(_)));
        let posted = timeline(&store).await;
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].body, FALLBACK_REPLY);
        assert_eq!(posted[0].sender, ORACLE_LABEL);
    }

    #[tokio::test]
    async fn test_network_failure_posts_fallback() {
        let store = Arc::new(MemoryStore::new());
        let generator = Scripted::failing(|| Error::Generation("connection refused".into()));
        let oracle = responder(&store, Role::Player, generator);

        let outcome = oracle.respond("hello?").await.unwrap();

        assert_eq!(outcome.message().unwrap().body, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_empty_answer_posts_fallback() {
        let store = Arc::new(MemoryStore::new());
        let oracle = responder(&store, Role::Gm, Scripted::answering("   "));

        let outcome = oracle.respond("anything").await.unwrap();

        assert!(matches!(outcome, OracleOutcome::FellBack(_)));
    }

    #[tokio::test]
    async fn test_gm_clear_command_bypasses_generation() {
        let store = Arc::new(MemoryStore::new());
        let generator = Scripted::answering("unused");
        let oracle = responder(&store, Role::Gm, generator.clone());
        oracle.respond("first").await.unwrap();

        let outcome = oracle.respond(CLEAR_COMMAND).await.unwrap();

        assert_eq!(outcome, OracleOutcome::Cleared);
        assert_eq!(generator.prompts(), vec!["first"]);
        assert!(timeline(&store).await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_prompt_ignored() {
        let store = Arc::new(MemoryStore::new());
        let generator = Scripted::answering("unused");
        let oracle = responder(&store, Role::Gm, generator.clone());

        assert_eq!(oracle.respond("  ").await.unwrap(), OracleOutcome::Ignored);
        assert!(generator.prompts().is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        store.set_ready(false);
        let oracle = responder(&store, Role::Gm, Scripted::answering("answer"));

        assert!(matches!(
            oracle.respond("question").await,
            Err(Error::SessionNotReady)
        ));
    }
}
