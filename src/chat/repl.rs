//! Interactive read-eval-print loop
//!
//! Reads lines from stdin, dispatches slash commands, and hands everything
//! else to the orchestrator as a conversation turn. A failed turn is printed
//! and the session continues; only EOF or an exit command ends it.

use colored::*;
use log::info;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::chat::orchestrator::Orchestrator;
use crate::error::Result;

const HELP_TEXT: &str = "\
Commands:
  /help   Show this help
  /clear  Clear the conversation history
  /exit   Quit (also /quit, or Ctrl-D)";

/// What a line of input should do
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Chat(String),
    Clear,
    Help,
    Exit,
    Nothing,
}

/// Classify one line of input. Only exact matches are commands; any other
/// slash-prefixed text is ordinary conversation.
fn classify(line: &str) -> Action {
    match line.trim() {
        "" => Action::Nothing,
        "/exit" | "/quit" => Action::Exit,
        "/clear" => Action::Clear,
        "/help" => Action::Help,
        text => Action::Chat(text.to_string()),
    }
}

pub struct Repl {
    orchestrator: Orchestrator,
}

impl Repl {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("{}", "quill - type /help for commands".dimmed());

        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        loop {
            self.prompt().await?;

            let Some(line) = lines.next_line().await? else {
                // EOF ends the session.
                println!();
                break;
            };

            match classify(&line) {
                Action::Nothing => {}
                Action::Exit => break,
                Action::Help => println!("{}", HELP_TEXT),
                Action::Clear => {
                    self.orchestrator.clear();
                    println!("{}", "History cleared".yellow());
                }
                Action::Chat(text) => {
                    if let Err(e) = self.orchestrator.run_turn(&text).await {
                        println!("{} {}", "error:".red(), e);
                    }
                }
            }
        }

        info!("session ended");
        Ok(())
    }

    async fn prompt(&self) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("{} ", "you>".cyan().bold()).as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}
