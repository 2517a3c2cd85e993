//! SSE stream decoding for streamed completions
//!
//! Turns the raw byte stream of a chat completions response into a lazy
//! sequence of [`ChatEvent`]s: text fragments as they arrive, and at most
//! one trailing batch of fully assembled tool calls. The sequence is finite
//! and single-pass; dropping it drops the underlying transport.

use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use log::debug;

use crate::error::{QuillError, Result};
use crate::llm::accumulator::ToolCallAccumulator;
use crate::llm::types::{StreamChunk, ToolCall};

/// Marker prefix for SSE data lines
const DATA_PREFIX: &str = "data:";

/// Payload that terminates the stream
const DONE_TOKEN: &str = "[DONE]";

/// One decoded event from a streamed response
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// A fragment of assistant text, surfaced as soon as it is decoded
    Text(String),

    /// The complete batch of tool calls, emitted once at stream end
    ToolCalls(Vec<ToolCall>),
}

/// A pull-based, single-pass sequence of chat events.
///
/// `next_event` returns `Ok(None)` once the stream is exhausted; a transport
/// failure mid-stream surfaces as a `Protocol` error.
#[async_trait]
pub trait ChatStream: Send {
    async fn next_event(&mut self) -> Result<Option<ChatEvent>>;
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// Decodes a server-sent-event byte stream into chat events.
pub struct SseDecoder {
    body: ByteStream,
    buffer: Vec<u8>,
    accumulator: ToolCallAccumulator,
    queued: VecDeque<ChatEvent>,
    done: bool,
}

impl SseDecoder {
    pub fn new(body: ByteStream) -> Self {
        Self {
            body,
            buffer: Vec::new(),
            accumulator: ToolCallAccumulator::new(),
            queued: VecDeque::new(),
            done: false,
        }
    }

    /// Buffer a chunk of bytes and decode every complete line in it.
    ///
    /// A trailing fragment without a newline stays buffered until the next
    /// chunk; partial lines are never parsed.
    fn push_bytes(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if self.done {
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            self.handle_line(line.trim());
        }
    }

    fn handle_line(&mut self, line: &str) {
        // Lines without the data marker (comments, event names, blanks) are
        // not part of the payload stream.
        let Some(payload) = line.strip_prefix(DATA_PREFIX).map(str::trim_start) else {
            return;
        };

        if payload == DONE_TOKEN {
            self.finish();
            return;
        }

        // A malformed payload must not abort the stream.
        let chunk: StreamChunk = match serde_json::from_str(payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                debug!("skipping malformed stream payload: {}", e);
                return;
            }
        };

        let Some(choice) = chunk.choices.into_iter().next() else {
            return;
        };

        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                self.queued.push_back(ChatEvent::Text(content));
            }
        }

        if let Some(deltas) = choice.delta.tool_calls {
            for delta in &deltas {
                self.accumulator.apply(delta);
            }
        }
    }

    /// End the sequence, materializing any assembled tool calls as a single
    /// trailing batch.
    fn finish(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        let calls = self.accumulator.finish();
        if !calls.is_empty() {
            self.queued.push_back(ChatEvent::ToolCalls(calls));
        }
    }
}

#[async_trait]
impl ChatStream for SseDecoder {
    async fn next_event(&mut self) -> Result<Option<ChatEvent>> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Ok(Some(event));
            }
            if self.done {
                return Ok(None);
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.push_bytes(&chunk),
                Some(Err(e)) => {
                    self.done = true;
                    return Err(QuillError::Protocol(format!("response body unreadable: {}", e)));
                }
                // Server closed without [DONE]; treat as stream end.
                None => self.finish(),
            }
        }
    }
}
