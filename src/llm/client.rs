//! OpenAI-compatible chat completions client
//!
//! Issues one streaming request per round and hands back the decoded event
//! sequence. Configuration is fixed per client instance; an empty tool list
//! omits the `tools` field entirely, which disables tool use server-side.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use log::debug;
use reqwest::Client;

use crate::error::{QuillError, Result};
use crate::llm::stream::{ChatEvent, ChatStream, SseDecoder};
use crate::llm::types::{ChatRequest, Message, ToolDefinition};

/// Default completions endpoint base
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model to use
const DEFAULT_MODEL: &str = "gpt-4o";

/// Default max output tokens
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Generation parameters, constant for the lifetime of one client
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.7,
            top_p: 1.0,
            presence_penalty: 0.0,
            frequency_penalty: 0.0,
            timeout: Duration::from_secs(300),
        }
    }
}

impl GenerationConfig {
    /// Create a config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Anything that can open a streamed completion over a message snapshot.
///
/// The caller passes an immutable copy of the history; implementations never
/// mutate conversation state.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn open_stream(&self, messages: Vec<Message>) -> Result<Box<dyn ChatStream>>;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for std::sync::Arc<T> {
    async fn open_stream(&self, messages: Vec<Message>) -> Result<Box<dyn ChatStream>> {
        (**self).open_stream(messages).await
    }
}

/// HTTP client for an OpenAI-compatible completions endpoint
pub struct ChatClient {
    http: Client,
    api_key: String,
    base_url: String,
    config: GenerationConfig,
    tools: Vec<ToolDefinition>,
}

impl ChatClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        config: GenerationConfig,
        tools: Vec<ToolDefinition>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| QuillError::Protocol(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            config,
            tools,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the request body for one round over the given snapshot.
    fn build_request(&self, messages: Vec<Message>) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages,
            tools: if self.tools.is_empty() {
                None
            } else {
                Some(self.tools.clone())
            },
            stream: true,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            presence_penalty: self.config.presence_penalty,
            frequency_penalty: self.config.frequency_penalty,
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.config.model)
            .field("tools", &self.tools.len())
            .finish()
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn open_stream(&self, messages: Vec<Message>) -> Result<Box<dyn ChatStream>> {
        let request = self.build_request(messages);
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!("POST {} model={}", url, request.model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "<no body>".to_string());
            return Err(QuillError::Request {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(QuillError::from));

        Ok(Box::new(SseDecoder::new(Box::pin(body))))
    }
}

/// Scripted backend for tests: each `open_stream` call pops the next event
/// sequence, and every snapshot it was handed is captured for inspection.
#[derive(Default)]
pub struct MockBackend {
    scripts: Mutex<VecDeque<Vec<ChatEvent>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the event sequence for the next round.
    pub fn push_script(&self, events: Vec<ChatEvent>) {
        self.scripts.lock().unwrap().push_back(events);
    }

    /// Message snapshots received so far, one per round.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn open_stream(&self, messages: Vec<Message>) -> Result<Box<dyn ChatStream>> {
        self.requests.lock().unwrap().push(messages);

        let events = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| QuillError::Protocol("mock backend has no scripted response".to_string()))?;

        Ok(Box::new(MockStream {
            events: events.into(),
        }))
    }
}

struct MockStream {
    events: VecDeque<ChatEvent>,
}

#[async_trait]
impl ChatStream for MockStream {
    async fn next_event(&mut self) -> Result<Option<ChatEvent>> {
        Ok(self.events.pop_front())
    }
}
