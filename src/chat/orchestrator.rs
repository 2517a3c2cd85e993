//! Conversation orchestrator - drives one user turn through streaming and
//! tool-execution rounds
//!
//! One turn: append the user message, stream a response, and if the model
//! requested tools, execute them, append the results, and stream a follow-up
//! over the extended history. Rounds repeat until a response arrives with no
//! tool calls; there is no round ceiling.

use std::io::Write;

use colored::*;
use log::{debug, info};

use crate::chat::history::ConversationHistory;
use crate::error::Result;
use crate::llm::client::ChatBackend;
use crate::llm::stream::ChatEvent;
use crate::llm::types::{Message, ToolCall};
use crate::tools::ToolRegistry;

/// System prompt for the chat session
const SYSTEM_PROMPT: &str = "You are a helpful assistant. \
When you need current information from the web, use the search tool, \
then answer from its results. Be concise.";

pub struct Orchestrator {
    backend: Box<dyn ChatBackend>,
    tools: ToolRegistry,
    history: ConversationHistory,
}

impl Orchestrator {
    pub fn new(backend: Box<dyn ChatBackend>, tools: ToolRegistry) -> Self {
        Self {
            backend,
            tools,
            history: ConversationHistory::new(),
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Wipe the conversation history.
    pub fn clear(&mut self) {
        self.history.clear();
        info!("history cleared");
    }

    /// Run one full user turn, streaming output as it arrives.
    ///
    /// On any round-boundary error the history is rolled back to its
    /// pre-turn state and the error is returned for display; the session
    /// itself continues.
    pub async fn run_turn(&mut self, input: &str) -> Result<()> {
        let rollback_mark = self.history.len();

        match self.run_rounds(input).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.history.truncate(rollback_mark);
                Err(e)
            }
        }
    }

    async fn run_rounds(&mut self, input: &str) -> Result<()> {
        self.history.push(Message::user(input));

        let mut more_rounds = true;
        while more_rounds {
            // Snapshot-then-send: the client only ever sees an immutable
            // copy of the history, with the system prompt prepended.
            let mut messages = vec![Message::system(SYSTEM_PROMPT)];
            messages.extend(self.history.snapshot());

            let mut stream = self.backend.open_stream(messages).await?;

            let mut text = String::new();
            let mut pending_calls: Vec<ToolCall> = Vec::new();

            while let Some(event) = stream.next_event().await? {
                match event {
                    ChatEvent::Text(fragment) => {
                        self.surface_text(&fragment);
                        text.push_str(&fragment);
                    }
                    ChatEvent::ToolCalls(calls) => {
                        pending_calls = calls;
                    }
                }
            }

            let content = if text.is_empty() { None } else { Some(text) };

            if pending_calls.is_empty() {
                self.history.push(Message::assistant(content));
                more_rounds = false;
            } else {
                // The assistant message declaring the calls must precede
                // every tool message answering them.
                self.history
                    .push(Message::assistant_with_tools(content, pending_calls.clone()));
                self.execute_tools(&pending_calls).await;
                debug!("round complete, {} tool call(s) answered", pending_calls.len());
            }
        }

        println!();
        Ok(())
    }

    async fn execute_tools(&mut self, calls: &[ToolCall]) {
        for call in calls {
            println!(
                "\n{} {}({})",
                "tool:".yellow(),
                call.function.name,
                call.function.arguments.dimmed()
            );

            let result = self.tools.execute(call).await;
            self.history
                .push(Message::tool(call.id.clone(), call.function.name.clone(), result));
        }
    }

    fn surface_text(&self, fragment: &str) {
        print!("{}", fragment);
        let _ = std::io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuillError;
    use crate::llm::client::MockBackend;
    use crate::llm::types::Role;
    use crate::tools::{Tool, ToolOutput};
    use async_trait::async_trait;
    use serde_json::Value;

    struct StubSearch;

    #[async_trait]
    impl Tool for StubSearch {
        fn name(&self) -> &'static str {
            "search"
        }

        fn description(&self) -> &'static str {
            "stub"
        }

        fn parameters(&self) -> Value {
            serde_json::json!({"type": "object"})
        }

        async fn execute(&self, input: Value) -> std::result::Result<ToolOutput, eyre::Error> {
            let query = input["query"].as_str().or(input.as_str()).unwrap_or("?");
            Ok(ToolOutput::success(format!("results for {}", query)))
        }
    }

    fn orchestrator_with(backend: MockBackend) -> Orchestrator {
        let mut tools = ToolRegistry::new();
        tools.add_tool(Box::new(StubSearch));
        Orchestrator::new(Box::new(backend), tools)
    }

    #[tokio::test]
    async fn test_plain_turn_appends_user_then_assistant() {
        let backend = MockBackend::new();
        backend.push_script(vec![
            ChatEvent::Text("Hi".to_string()),
            ChatEvent::Text(" there".to_string()),
        ]);

        let mut orch = orchestrator_with(backend);
        orch.run_turn("hello").await.unwrap();

        let history = orch.history().as_slice();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content.as_deref(), Some("hello"));
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content.as_deref(), Some("Hi there"));
    }

    #[tokio::test]
    async fn test_empty_response_stores_absent_content() {
        let backend = MockBackend::new();
        backend.push_script(vec![]);

        let mut orch = orchestrator_with(backend);
        orch.run_turn("hello").await.unwrap();

        let history = orch.history().as_slice();
        assert_eq!(history.len(), 2);
        assert!(history[1].content.is_none());
    }

    #[tokio::test]
    async fn test_tool_round_ordering() {
        let backend = MockBackend::new();
        backend.push_script(vec![
            ChatEvent::Text("Let me check".to_string()),
            ChatEvent::ToolCalls(vec![ToolCall::new("call_1", "search", r#"{"query":"weather"}"#)]),
        ]);
        backend.push_script(vec![ChatEvent::Text("It will rain".to_string())]);

        let mut orch = orchestrator_with(backend);
        orch.run_turn("search for weather").await.unwrap();

        let history = orch.history().as_slice();
        assert_eq!(history.len(), 4);

        // user, assistant-with-calls, tool, assistant
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        let calls = history[1].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, "call_1");

        assert_eq!(history[2].role, Role::Tool);
        assert_eq!(history[2].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(history[2].name.as_deref(), Some("search"));
        assert_eq!(history[2].content.as_deref(), Some("results for weather"));

        assert_eq!(history[3].role, Role::Assistant);
        assert_eq!(history[3].content.as_deref(), Some("It will rain"));
    }

    #[tokio::test]
    async fn test_multiple_tool_rounds() {
        let backend = MockBackend::new();
        backend.push_script(vec![ChatEvent::ToolCalls(vec![ToolCall::new(
            "call_1",
            "search",
            r#"{"query":"first"}"#,
        )])]);
        backend.push_script(vec![ChatEvent::ToolCalls(vec![ToolCall::new(
            "call_2",
            "search",
            r#"{"query":"second"}"#,
        )])]);
        backend.push_script(vec![ChatEvent::Text("done".to_string())]);

        let mut orch = orchestrator_with(backend);
        orch.run_turn("dig deep").await.unwrap();

        let history = orch.history().as_slice();
        // user, assistant+call, tool, assistant+call, tool, assistant
        assert_eq!(history.len(), 6);
        assert_eq!(history[5].content.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_result_string() {
        let backend = MockBackend::new();
        backend.push_script(vec![ChatEvent::ToolCalls(vec![ToolCall::new(
            "call_1", "teleport", "{}",
        )])]);
        backend.push_script(vec![ChatEvent::Text("ok".to_string())]);

        let mut orch = orchestrator_with(backend);
        orch.run_turn("go").await.unwrap();

        let history = orch.history().as_slice();
        assert_eq!(history[2].content.as_deref(), Some("Unknown tool: teleport"));
    }

    #[tokio::test]
    async fn test_request_error_rolls_back_history() {
        let backend = MockBackend::new();
        backend.push_script(vec![ChatEvent::Text("kept".to_string())]);
        // Second turn has no script: MockBackend returns an error.

        let mut orch = orchestrator_with(backend);
        orch.run_turn("first").await.unwrap();
        let len_before = orch.history().len();

        let err = orch.run_turn("second").await.unwrap_err();
        assert!(matches!(err, QuillError::Protocol(_)));
        assert_eq!(orch.history().len(), len_before);
    }

    #[tokio::test]
    async fn test_snapshot_includes_system_prompt_first() {
        let backend = std::sync::Arc::new(MockBackend::new());
        backend.push_script(vec![ChatEvent::Text("hi".to_string())]);

        let mut tools = ToolRegistry::new();
        tools.add_tool(Box::new(StubSearch));
        let mut orch = Orchestrator::new(Box::new(backend.clone()), tools);
        orch.run_turn("hello").await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].role, Role::System);
        assert_eq!(requests[0][1].role, Role::User);
        assert_eq!(requests[0][1].content.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_clear_resets_context() {
        let backend = MockBackend::new();
        backend.push_script(vec![ChatEvent::Text("hi".to_string())]);

        let mut orch = orchestrator_with(backend);
        orch.run_turn("hello").await.unwrap();
        assert_eq!(orch.history().len(), 2);

        orch.clear();
        assert!(orch.history().is_empty());

        orch.clear();
        assert!(orch.history().is_empty());
    }
}
