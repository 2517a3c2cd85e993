//! Quill - a streaming terminal chat client
//!
//! Quill talks to an OpenAI-compatible chat completions endpoint, streams
//! responses token-by-token, and lets the model call a web search tool
//! mid-conversation.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;

pub use error::{QuillError, Result};
