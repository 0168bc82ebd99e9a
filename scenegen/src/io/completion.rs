//! Streaming chat-completion client.
//!
//! The [`CompletionClient`] trait decouples the orchestrator from the hosted
//! model. [`HttpCompletionClient`] talks to an OpenAI-compatible
//! `chat/completions` endpoint (Groq by default) with `stream: true` and
//! yields the server-sent-event body lazily as text fragments. Tests use
//! scripted clients that return predetermined fragments.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::io::config::CompletionConfig;

/// Lazily delivered completion fragments.
///
/// `Ok(None)` is a chunk that carried no text (role announcements, usage
/// trailers); it contributes nothing to the response.
pub type FragmentStream<'a> = Box<dyn Iterator<Item = Result<Option<String>>> + 'a>;

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of a streaming chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_completion_tokens: u32,
    pub top_p: f32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl CompletionRequest {
    /// Single user-message streaming request using the configured sampling parameters.
    pub fn from_prompt(config: &CompletionConfig, prompt: impl Into<String>) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: config.temperature,
            max_completion_tokens: config.max_completion_tokens,
            top_p: config.top_p,
            stream: true,
            stop: None,
        }
    }
}

/// Abstraction over completion backends.
pub trait CompletionClient {
    /// Start a completion and return its fragments in delivery order.
    fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream<'_>>;
}

/// Drain a fragment stream into one string.
///
/// Stops at the first failed fragment; nothing is returned for a partial stream.
pub fn collect_fragments(fragments: FragmentStream<'_>) -> Result<String> {
    let mut raw = String::new();
    let mut count = 0usize;
    for fragment in fragments {
        if let Some(text) = fragment? {
            raw.push_str(&text);
        }
        count += 1;
    }
    debug!(fragments = count, bytes = raw.len(), "completion stream drained");
    Ok(raw)
}

/// HTTP client for OpenAI-compatible streaming chat completions.
#[derive(Clone)]
pub struct HttpCompletionClient {
    api_url: String,
    api_key_env: String,
    api_key: Option<String>,
    client: Client,
}

impl std::fmt::Debug for HttpCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletionClient")
            .field("api_url", &self.api_url)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpCompletionClient {
    /// Build a client for the configured endpoint.
    ///
    /// The API key is read from `config.api_key_env` when a request is made,
    /// so a missing key surfaces as a failed completion rather than a startup error.
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout_secs.map(Duration::from_secs))
            .build()
            .context("create HTTP client")?;

        Ok(Self {
            api_url: config.api_url.clone(),
            api_key_env: config.api_key_env.clone(),
            api_key: None,
            client,
        })
    }

    /// Use an explicit key instead of the environment variable.
    #[cfg(test)]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(anyhow!(
                "{} environment variable not set",
                self.api_key_env
            )),
        }
    }
}

impl CompletionClient for HttpCompletionClient {
    #[instrument(skip_all, fields(model = %request.model, max_completion_tokens = request.max_completion_tokens))]
    fn stream(&self, request: &CompletionRequest) -> Result<FragmentStream<'_>> {
        let api_key = self.resolve_api_key()?;

        info!(api_url = %self.api_url, "starting completion stream");
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .context("send completion request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            info!(status = status.as_u16(), "completion request rejected");
            bail!("completion API error ({}): {}", status.as_u16(), body.trim());
        }

        Ok(Box::new(SseFragments::new(BufReader::new(response))))
    }
}

/// One `data:` payload of a streamed chat completion.
#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    #[serde(default)]
    message: String,
}

/// Iterator over the text fragments of a server-sent-event body.
///
/// Ends at `data: [DONE]` or at end of body, whichever comes first. After an
/// error the iterator is exhausted.
pub struct SseFragments<R> {
    reader: R,
    line: String,
    done: bool,
}

impl<R: BufRead> SseFragments<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            done: false,
        }
    }

    fn fail(&mut self, err: anyhow::Error) -> Option<Result<Option<String>>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for SseFragments<R> {
    type Item = Result<Option<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.line.clear();
            let n = match self.reader.read_line(&mut self.line) {
                Ok(n) => n,
                Err(e) => return self.fail(anyhow!(e).context("read completion stream")),
            };
            if n == 0 {
                self.done = true;
                break;
            }

            let line = self.line.trim_end_matches(['\r', '\n']);
            // Blank separators, comments and non-data fields carry no content.
            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim_start();
            if payload == "[DONE]" {
                self.done = true;
                break;
            }

            let chunk: ChatCompletionChunk = match serde_json::from_str(payload) {
                Ok(chunk) => chunk,
                Err(e) => {
                    return self.fail(anyhow!(e).context("parse completion chunk"));
                }
            };
            if let Some(error) = chunk.error {
                return self.fail(anyhow!("completion stream error: {}", error.message));
            }
            let content = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta)
                .and_then(|delta| delta.content);
            return Some(Ok(content));
        }
        None
    }
}
