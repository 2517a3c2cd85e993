//! CLI argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

/// Quill - a streaming terminal chat client with web search
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model to use, overriding the config file
    #[arg(short, long)]
    pub model: Option<String>,

    /// Disable the web search tool
    #[arg(long)]
    pub no_search: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["quill"]);
        assert!(cli.config.is_none());
        assert!(cli.model.is_none());
        assert!(!cli.no_search);
        assert!(!cli.is_verbose());
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["quill", "--model", "gpt-4o-mini", "--no-search", "-v"]);
        assert_eq!(cli.model.as_deref(), Some("gpt-4o-mini"));
        assert!(cli.no_search);
        assert!(cli.is_verbose());
    }
}
