//! Title, summary and tag generation for captured content.

mod heuristic;
mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::NoteType;
use crate::Result;

pub use heuristic::HeuristicSummarizer;
pub use http::HttpSummarizer;

/// Generated metadata for a piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Summary {
    /// Placeholder used when the content could not be processed.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            title: "Error Processing Content".to_string(),
            summary: "Could not process this content automatically.".to_string(),
            tags: vec!["error".to_string()],
        }
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, content: &str, kind: NoteType) -> Result<Summary>;

    /// Retrieve readable text for a URL note.
    async fn fetch_url_content(&self, url: &str) -> Result<String>;
}
