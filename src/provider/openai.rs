use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};

use super::{blog_prompt, ChunkStream, Draft, ProviderError, TextGenerator, SYSTEM_PROMPT};
use crate::config::ProviderConfig;

const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.7;

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct Completion {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// One decoded `data:` line of the completions event stream.
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    Content(String),
    Done,
}

impl OpenAiProvider {
    pub fn new(cfg: &ProviderConfig, api_key: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: cfg.model.clone(),
        })
    }

    async fn post_completion(
        &self,
        topic: &str,
        stream: bool,
    ) -> Result<reqwest::Response, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": blog_prompt(topic) },
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "stream": stream,
        });

        let res = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, "provider rejected completion request");
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res)
    }
}

#[async_trait]
impl TextGenerator for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn generate(&self, topic: &str) -> Result<Draft, ProviderError> {
        let completion: Completion = self
            .post_completion(topic, false)
            .await?
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("missing choices[0].message.content".into()))?;
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyOutput);
        }
        debug!(chars = content.len(), "completion received");
        Ok(Draft { title: None, content })
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn generate_stream(&self, topic: &str) -> Result<ChunkStream, ProviderError> {
        let res = self.post_completion(topic, true).await?;
        Ok(content_deltas(res.bytes_stream().boxed()))
    }
}

fn parse_sse_line(line: &str) -> Result<Option<SseLine>, ProviderError> {
    let Some(payload) = line.strip_prefix("data:") else {
        // comments, `event:` and blank separator lines carry nothing for us
        return Ok(None);
    };
    let payload = payload.trim();
    if payload == "[DONE]" {
        return Ok(Some(SseLine::Done));
    }
    let chunk: StreamChunk =
        serde_json::from_str(payload).map_err(|e| ProviderError::Malformed(e.to_string()))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|c| !c.is_empty())
        .map(SseLine::Content))
}

struct DeltaState<S> {
    body: S,
    buf: Vec<u8>,
    ready: VecDeque<Result<String, ProviderError>>,
    done: bool,
}

/// Turns the raw completions event stream into content chunks, splitting on line
/// boundaries across network reads.
fn content_deltas<S>(body: S) -> ChunkStream
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + Unpin + 'static,
{
    let init = DeltaState {
        body,
        buf: Vec::new(),
        ready: VecDeque::new(),
        done: false,
    };

    stream::unfold(init, |mut st| async move {
        loop {
            if let Some(item) = st.ready.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.body.next().await {
                Some(Ok(bytes)) => {
                    st.buf.extend_from_slice(&bytes);
                    while let Some(pos) = st.buf.iter().position(|b| *b == b'\n') {
                        let raw: Vec<u8> = st.buf.drain(..=pos).collect();
                        let line = String::from_utf8_lossy(&raw);
                        match parse_sse_line(line.trim_end()) {
                            Ok(Some(SseLine::Content(c))) => st.ready.push_back(Ok(c)),
                            Ok(Some(SseLine::Done)) => {
                                st.done = true;
                                break;
                            }
                            Ok(None) => {}
                            Err(e) => {
                                st.done = true;
                                st.ready.push_back(Err(e));
                                break;
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    st.done = true;
                    return Some((Err(ProviderError::Http(e)), st));
                }
                None => {
                    st.done = true;
                    let tail = std::mem::take(&mut st.buf);
                    let line = String::from_utf8_lossy(&tail);
                    match parse_sse_line(line.trim()) {
                        Ok(Some(SseLine::Content(c))) => st.ready.push_back(Ok(c)),
                        Ok(_) => {}
                        Err(e) => st.ready.push_back(Err(e)),
                    }
                }
            }
        }
    })
    .boxed()
}
