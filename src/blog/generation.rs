use std::{sync::Arc, time::Instant};

use futures::StreamExt;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    provider::{ProviderError, TextGenerator},
    store::{BlogPost, NewBlogPost, PostStatus, Store},
};

pub const GENERATION_FAILED: &str = "Failed to generate blog post";

/// One frame of a streaming generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GenerationEvent {
    Content {
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    Saved {
        post_id: Uuid,
        title: String,
        generation_time: i64,
    },
    Error {
        message: String,
    },
}

impl GenerationEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GenerationEvent::Content { .. })
    }
}

/// Drives a provider and persists what it produces.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn TextGenerator>,
    store: Arc<dyn Store>,
}

enum Relay {
    Finished(BlogPost),
    Abandoned,
}

fn validate_topic(topic: &str) -> Result<String, AppError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation("Topic is required".into()));
    }
    Ok(topic.to_string())
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}

/// First non-blank line with its heading markers stripped, or the topic when
/// nothing is left.
pub fn derive_title(content: &str, topic: &str) -> String {
    lazy_static! {
        static ref HEADING_MARKERS: Regex = Regex::new(r"^#+\s*").unwrap();
    }
    content
        .lines()
        .map(str::trim_start)
        .find(|line| !line.is_empty())
        .map(|line| HEADING_MARKERS.replace(line, "").trim_end().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| topic.to_string())
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn TextGenerator>, store: Arc<dyn Store>) -> Self {
        Self { provider, store }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    fn completed_post(
        owner: Uuid,
        topic: &str,
        title: String,
        content: String,
        started: Instant,
    ) -> NewBlogPost {
        NewBlogPost {
            user_id: owner,
            title,
            content,
            topic: topic.to_string(),
            status: PostStatus::Completed,
            generation_time_ms: elapsed_ms(started),
        }
    }

    /// One-shot generation: waits for the whole draft, then persists it.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn generate(&self, topic: &str, owner: Uuid) -> Result<BlogPost, AppError> {
        let topic = validate_topic(topic)?;
        let started = Instant::now();

        let draft = self.provider.generate(&topic).await?;
        if draft.content.trim().is_empty() {
            return Err(ProviderError::EmptyOutput.into());
        }
        let title = match draft.title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => derive_title(&draft.content, &topic),
        };

        let post = self
            .store
            .record_generation(Self::completed_post(owner, &topic, title, draft.content, started))
            .await?;
        info!(
            post_id = %post.id,
            words = post.word_count,
            ms = post.generation_time_ms,
            "blog post generated"
        );
        Ok(post)
    }

    /// Streaming generation. The topic is validated before anything is spawned;
    /// the returned receiver yields content frames and then exactly one terminal
    /// frame.
    pub fn generate_streaming(
        &self,
        topic: &str,
        owner: Uuid,
    ) -> Result<mpsc::Receiver<GenerationEvent>, AppError> {
        let topic = validate_topic(topic)?;
        let (tx, rx) = mpsc::channel(1);
        let this = self.clone();
        tokio::spawn(async move { this.drive_stream(topic, owner, tx).await });
        Ok(rx)
    }

    #[instrument(skip(self, tx), fields(provider = self.provider.name()))]
    async fn drive_stream(self, topic: String, owner: Uuid, tx: mpsc::Sender<GenerationEvent>) {
        let started = Instant::now();
        match self.relay(&topic, owner, &tx, started).await {
            Ok(Relay::Finished(post)) => {
                info!(
                    post_id = %post.id,
                    words = post.word_count,
                    ms = post.generation_time_ms,
                    "streamed blog post saved"
                );
                let saved = GenerationEvent::Saved {
                    post_id: post.id,
                    title: post.title,
                    generation_time: post.generation_time_ms,
                };
                if tx.send(saved).await.is_err() {
                    warn!(post_id = %post.id, "client left before the saved event");
                }
            }
            Ok(Relay::Abandoned) => {
                warn!(%owner, "client disconnected, generation abandoned");
            }
            Err(e) => {
                error!(error = %e, %owner, "streaming generation failed");
                let failed = GenerationEvent::Error {
                    message: GENERATION_FAILED.into(),
                };
                if tx.send(failed).await.is_err() {
                    warn!(%owner, "client left before the error event");
                }
            }
        }
    }

    async fn relay(
        &self,
        topic: &str,
        owner: Uuid,
        tx: &mpsc::Sender<GenerationEvent>,
        started: Instant,
    ) -> Result<Relay, AppError> {
        let mut chunks = self.provider.generate_stream(topic).await?;
        let mut content = String::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            content.push_str(&chunk);
            if tx
                .send(GenerationEvent::Content { content: chunk })
                .await
                .is_err()
            {
                // dropping `chunks` aborts the upstream request
                return Ok(Relay::Abandoned);
            }
        }
        drop(chunks);

        if content.trim().is_empty() {
            return Err(ProviderError::EmptyOutput.into());
        }
        if tx.is_closed() {
            return Ok(Relay::Abandoned);
        }

        let title = derive_title(&content, topic);
        let post = self
            .store
            .record_generation(Self::completed_post(owner, topic, title, content, started))
            .await?;
        Ok(Relay::Finished(post))
    }
}
