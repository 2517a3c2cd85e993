//! Reassembly of streamed tool-call fragments
//!
//! The server delivers tool calls as many small deltas, each tagged with a
//! stream index identifying which in-progress call it belongs to. Argument
//! text arrives as successive substrings of one serialized JSON value and is
//! concatenated; id and name arrive once (or repeatedly with empty values)
//! and are set-once.

use std::collections::BTreeMap;

use crate::llm::types::{ToolCall, ToolCallDelta};

/// Accumulator-internal record; every field optional until filled.
#[derive(Debug, Clone, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: Option<String>,
    arguments: String,
}

/// Stateful reassembly of tool-call deltas into complete calls.
///
/// Valid for a single streamed response; indices are not stable beyond it.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    partial: BTreeMap<u32, PartialToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one delta into the record for its index.
    ///
    /// Argument deltas concatenate; id and name take the last non-empty
    /// value seen and are never cleared by a later empty delta.
    pub fn apply(&mut self, delta: &ToolCallDelta) {
        let entry = self.partial.entry(delta.index).or_default();

        if let Some(id) = &delta.id {
            if !id.is_empty() {
                entry.id = Some(id.clone());
            }
        }

        if let Some(name) = &delta.function.name {
            if !name.is_empty() {
                entry.name = Some(name.clone());
            }
        }

        // An absent or empty arguments delta contributes nothing.
        if let Some(arguments) = &delta.function.arguments {
            entry.arguments.push_str(arguments);
        }
    }

    /// True if no fragments have been seen for this response.
    pub fn is_empty(&self) -> bool {
        self.partial.is_empty()
    }

    /// Materialize every complete record, ordered by stream index.
    ///
    /// A record needs a non-empty id and name; its arguments string may be
    /// empty. Records missing either are dropped, not errors. Returns an
    /// empty batch when no fragments were ever seen.
    pub fn finish(&mut self) -> Vec<ToolCall> {
        std::mem::take(&mut self.partial)
            .into_values()
            .filter_map(|partial| match (partial.id, partial.name) {
                (Some(id), Some(name)) => Some(ToolCall::new(id, name, partial.arguments)),
                _ => None,
            })
            .collect()
    }
}
