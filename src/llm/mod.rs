//! LLM client layer - OpenAI-compatible streaming and tool-call assembly
//!
//! This module provides:
//! - Wire types for messages, tool calls, and stream deltas
//! - The SSE stream decoder
//! - The tool-call fragment accumulator
//! - The ChatBackend trait with HTTP and mock implementations

pub mod accumulator;
pub mod client;
pub mod stream;
pub mod types;

pub use accumulator::ToolCallAccumulator;
pub use client::{ChatBackend, ChatClient, GenerationConfig, MockBackend};
pub use stream::{ChatEvent, ChatStream, SseDecoder};
pub use types::{ChatRequest, FunctionCall, Message, Role, ToolCall, ToolCallDelta, ToolDefinition};
