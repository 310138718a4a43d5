//! Text-generation providers. The orchestrator holds an `Arc<dyn TextGenerator>`
//! chosen once at startup.

mod openai;
mod placeholder;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

pub use openai::OpenAiProvider;
pub use placeholder::PlaceholderProvider;

/// A complete one-shot generation. Providers that do not pick a title leave it
/// `None` and the orchestrator derives one from the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub title: Option<String>,
    pub content: String,
}

/// Incremental output, in the order the provider produced it.
pub type ChunkStream = BoxStream<'static, Result<String, ProviderError>>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed provider output: {0}")]
    Malformed(String),

    #[error("provider returned no content")]
    EmptyOutput,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    async fn generate(&self, topic: &str) -> Result<Draft, ProviderError>;

    async fn generate_stream(&self, topic: &str) -> Result<ChunkStream, ProviderError>;
}

/// Prompt sent to remote providers.
pub(crate) fn blog_prompt(topic: &str) -> String {
    format!(
        r#"Write a comprehensive, engaging blog post about "{topic}".

Requirements:
- Minimum 800 words
- Include an engaging title
- Use proper headings (H2, H3)
- Write in a professional, informative tone
- Include actionable insights
- Structure with introduction, main sections, and conclusion
- Format as markdown"#
    )
}

pub(crate) const SYSTEM_PROMPT: &str =
    "You are a professional blog writer who creates high-quality, engaging content.";
