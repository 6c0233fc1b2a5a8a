use async_trait::async_trait;

use crate::Result;

/// External text-generation service.
///
/// Implementations report transport failures as [`Error::Generation`] and
/// unexpected payloads as [`Error::MalformedResponse`].
///
/// [`Error::Generation`]: crate::Error::Generation
/// [`Error::MalformedResponse`]: crate::Error::MalformedResponse
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce one paragraph answering or rewriting `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
