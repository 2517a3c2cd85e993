//! Tool system for model-invoked capabilities
//!
//! Tools are resolved by name from a fixed registry built at startup. Every
//! failure mode at the dispatch boundary is folded into a result string so a
//! bad tool call can never abort a conversation turn.

mod search;

pub use search::SearchTool;

use std::collections::HashMap;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::llm::types::{ToolCall, ToolDefinition};

/// A capability the model can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the function name in tool calls)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters
    fn parameters(&self) -> Value;

    /// Execute the tool
    async fn execute(&self, input: Value) -> Result<ToolOutput, eyre::Error>;
}

/// Result from tool execution
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Fixed name-to-handler mapping, resolved once at startup
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    /// Registry with the standard tool set
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add_tool(Box::new(SearchTool));
        registry
    }

    pub fn add_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool definitions to advertise to the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition::function(t.name(), t.description(), t.parameters()))
            .collect()
    }

    /// Execute one tool call, returning the result text for its tool message.
    ///
    /// An unmatched name yields an "Unknown tool" string and an unparseable
    /// argument payload falls back to the raw text as the sole input; neither
    /// aborts the turn.
    pub async fn execute(&self, call: &ToolCall) -> String {
        let Some(tool) = self.tools.get(&call.function.name) else {
            return format!("Unknown tool: {}", call.function.name);
        };

        let input = parse_arguments(&call.function.arguments);
        debug!("executing tool {} ({})", call.function.name, call.id);

        match tool.execute(input).await {
            Ok(output) => output.content,
            Err(e) => format!("Tool error: {}", e),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Parse a raw argument payload, recovering from malformed JSON by treating
/// the raw text as the capability's sole input.
fn parse_arguments(raw: &str) -> Value {
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!("tool arguments not valid JSON ({}), passing raw text", e);
            Value::String(raw.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn description(&self) -> &'static str {
            "Echo the input back"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(&self, input: Value) -> Result<ToolOutput, eyre::Error> {
            Ok(ToolOutput::success(input.to_string()))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn description(&self) -> &'static str {
            "Always fails"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, _input: Value) -> Result<ToolOutput, eyre::Error> {
            Err(eyre::eyre!("boom"))
        }
    }

    #[test]
    fn test_tool_output_constructors() {
        let ok = ToolOutput::success("done");
        assert_eq!(ok.content, "done");
        assert!(!ok.is_error);

        let err = ToolOutput::error("failed");
        assert!(err.is_error);
    }

    #[test]
    fn test_standard_registry_has_search() {
        let registry = ToolRegistry::standard();
        assert!(registry.has_tool("search"));
        assert!(!registry.has_tool("read_file"));
    }

    #[test]
    fn test_definitions() {
        let registry = ToolRegistry::standard();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].function.name, "search");
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.definitions().is_empty());
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("call_1", "nonexistent", "{}");

        let result = registry.execute(&call).await;
        assert_eq!(result, "Unknown tool: nonexistent");
    }

    #[tokio::test]
    async fn test_execute_dispatches_by_name() {
        let mut registry = ToolRegistry::new();
        registry.add_tool(Box::new(EchoTool));

        let call = ToolCall::new("call_1", "echo", r#"{"text":"hi"}"#);
        let result = registry.execute(&call).await;
        assert_eq!(result, r#"{"text":"hi"}"#);
    }

    #[tokio::test]
    async fn test_execute_raw_fallback_for_bad_arguments() {
        let mut registry = ToolRegistry::new();
        registry.add_tool(Box::new(EchoTool));

        let call = ToolCall::new("call_1", "echo", "not json");
        let result = registry.execute(&call).await;
        assert_eq!(result, "\"not json\"");
    }

    #[tokio::test]
    async fn test_execute_folds_tool_errors_into_text() {
        let mut registry = ToolRegistry::new();
        registry.add_tool(Box::new(FailingTool));

        let call = ToolCall::new("call_1", "broken", "{}");
        let result = registry.execute(&call).await;
        assert!(result.contains("Tool error"));
        assert!(result.contains("boom"));
    }

    #[test]
    fn test_parse_arguments_valid_json() {
        let value = parse_arguments(r#"{"query":"rust"}"#);
        assert_eq!(value["query"], "rust");
    }

    #[test]
    fn test_parse_arguments_raw_fallback() {
        let value = parse_arguments("rain in madrid");
        assert_eq!(value, Value::String("rain in madrid".to_string()));
    }
}
