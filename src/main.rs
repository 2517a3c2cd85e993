use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

mod cli;

use cli::Cli;
use quill::chat::{Orchestrator, Repl};
use quill::config::Config;
use quill::error::QuillError;
use quill::llm::{ChatClient, GenerationConfig};
use quill::tools::ToolRegistry;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quill")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("quill.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Read the API key from the environment, rejecting unset or placeholder
/// values before any request is made.
fn resolve_api_key() -> quill::Result<String> {
    let key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| QuillError::Config("OPENAI_API_KEY is not set".to_string()))?;

    let trimmed = key.trim();
    if trimmed.is_empty() || trimmed.starts_with("your-") || trimmed == "changeme" {
        return Err(QuillError::Config(
            "OPENAI_API_KEY looks like a placeholder, set a real key".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

fn generation_config(cli: &Cli, config: &Config) -> GenerationConfig {
    GenerationConfig {
        model: cli.model.clone().unwrap_or_else(|| config.api.model.clone()),
        max_tokens: config.api.max_tokens,
        temperature: config.api.temperature,
        top_p: config.api.top_p,
        presence_penalty: config.api.presence_penalty,
        frequency_penalty: config.api.frequency_penalty,
        timeout: Duration::from_millis(config.api.timeout_ms),
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let api_key = resolve_api_key()?;

    let tools = if cli.no_search || !config.search.enabled {
        ToolRegistry::new()
    } else {
        ToolRegistry::standard()
    };

    let generation = generation_config(cli, config);
    info!("model: {}", generation.model);

    let client = ChatClient::new(api_key, config.api.base_url.clone(), generation, tools.definitions())?;

    let orchestrator = Orchestrator::new(Box::new(client), tools);
    let mut repl = Repl::new(orchestrator);

    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            std::process::exit(0);
        }
    });

    repl.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await?;

    Ok(())
}
