//! Conversation layer - history, turn orchestration, and the interactive loop

pub mod history;
pub mod orchestrator;
pub mod repl;

pub use history::ConversationHistory;
pub use orchestrator::Orchestrator;
pub use repl::Repl;
