//! search tool - web search capability
//!
//! The provider is picked from whichever API key is present in the
//! environment. Results come back as a formatted text block (rank, title,
//! URL, snippet per result); every failure is a readable string, never an
//! error past this boundary.

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::time::Duration;

use super::{Tool, ToolOutput};

/// Maximum snippet length in formatted output
const SNIPPET_LIMIT: usize = 200;

/// Default number of results
const DEFAULT_MAX_RESULTS: usize = 5;

/// Search the web for information
pub struct SearchTool;

/// Which backing search API to call
#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchProvider {
    Tavily { api_key: String },
    Brave { api_key: String },
}

impl SearchProvider {
    /// Pick a provider from environment variables, Tavily first.
    fn from_env() -> Option<Self> {
        if let Ok(api_key) = std::env::var("TAVILY_API_KEY") {
            debug!("search: using tavily");
            return Some(Self::Tavily { api_key });
        }
        if let Ok(api_key) = std::env::var("BRAVE_API_KEY") {
            debug!("search: using brave");
            return Some(Self::Brave { api_key });
        }
        debug!("search: no provider key found");
        None
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &'static str {
        "search"
    }

    fn description(&self) -> &'static str {
        "Search the web for current information. Requires TAVILY_API_KEY or BRAVE_API_KEY."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, eyre::Error> {
        // Accept either the schema shape or, when argument parsing fell back
        // to raw text, a bare string as the query.
        let query = match &input {
            Value::String(s) => s.as_str(),
            other => match other["query"].as_str() {
                Some(q) => q,
                None => return Ok(ToolOutput::error("query is required")),
            },
        };

        let Some(provider) = SearchProvider::from_env() else {
            return Ok(ToolOutput::error(
                "No search API configured. Set TAVILY_API_KEY or BRAVE_API_KEY environment variable.",
            ));
        };

        Ok(run_search(&provider, query, DEFAULT_MAX_RESULTS).await)
    }
}

async fn run_search(provider: &SearchProvider, query: &str, max_results: usize) -> ToolOutput {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default();

    let response = match provider {
        SearchProvider::Tavily { api_key } => {
            let body = serde_json::json!({
                "api_key": api_key,
                "query": query,
                "max_results": max_results,
                "search_depth": "basic"
            });
            client.post("https://api.tavily.com/search").json(&body).send().await
        }
        SearchProvider::Brave { api_key } => {
            client
                .get("https://api.search.brave.com/res/v1/web/search")
                .header("X-Subscription-Token", api_key)
                .query(&[("q", query), ("count", &max_results.to_string())])
                .send()
                .await
        }
    };

    let response = match response {
        Ok(r) => r,
        Err(e) => return ToolOutput::error(format!("Search request failed: {}", e)),
    };

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return ToolOutput::error(format!("Search API error {}: {}", status, error_text));
    }

    let body: Value = match response.json().await {
        Ok(v) => v,
        Err(e) => return ToolOutput::error(format!("Failed to parse search response: {}", e)),
    };

    let results = match provider {
        SearchProvider::Tavily { .. } => body["results"].as_array().cloned(),
        SearchProvider::Brave { .. } => body["web"]["results"].as_array().cloned(),
    };

    format_results(provider, results.as_deref().unwrap_or(&[]))
}

/// Render results as one block: rank, title, URL, snippet per entry.
fn format_results(provider: &SearchProvider, results: &[Value]) -> ToolOutput {
    if results.is_empty() {
        return ToolOutput::success("No results found");
    }

    let snippet_key = match provider {
        SearchProvider::Tavily { .. } => "content",
        SearchProvider::Brave { .. } => "description",
    };

    let output: Vec<String> = results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let title = r["title"].as_str().unwrap_or("(no title)");
            let url = r["url"].as_str().unwrap_or("");
            let snippet = r[snippet_key].as_str().unwrap_or("");
            format!("{}. {}\n   {}\n   {}\n", i + 1, title, url, truncate(snippet, SNIPPET_LIMIT))
        })
        .collect();

    ToolOutput::success(output.join("\n"))
}

/// Truncate to max length on a char boundary
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}
