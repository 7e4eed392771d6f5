//! Turning raw user input into an unsaved note.

use crate::error::{Error, Result};
use crate::models::{NewNote, NoteType};
use crate::summarize::{Summarizer, Summary};

/// Raw input for the capture flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub kind: NoteType,
    /// Text body, URL, or file/image reference depending on `kind`.
    pub input: String,
}

impl NoteDraft {
    pub fn new(kind: NoteType, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
        }
    }
}

/// Build a [`NewNote`] from a draft.
///
/// URL drafts are fetched first and the page text becomes the note content.
/// A summarizer failure falls back to [`Summary::fallback`] instead of
/// aborting the capture.
pub async fn compose_note(summarizer: &dyn Summarizer, draft: &NoteDraft) -> Result<NewNote> {
    let input = draft.input.trim();
    if input.is_empty() {
        return Err(Error::InvalidInput("Please enter some content".to_string()));
    }

    let content = if draft.kind == NoteType::Url {
        summarizer.fetch_url_content(input).await.map_err(|error| {
            tracing::warn!("URL fetch failed for {}: {}", input, error);
            Error::InvalidInput("Could not fetch URL content".to_string())
        })?
    } else {
        input.to_string()
    };

    let summary = match summarizer.summarize(&content, draft.kind).await {
        Ok(summary) => summary,
        Err(error) => {
            tracing::warn!("Summarization failed, using fallback: {}", error);
            Summary::fallback()
        }
    };

    Ok(NewNote::new(
        draft.kind,
        input,
        summary.title,
        content,
        summary.summary,
        summary.tags,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::HeuristicSummarizer;
    use async_trait::async_trait;

    struct BrokenSummarizer;

    #[async_trait]
    impl Summarizer for BrokenSummarizer {
        async fn summarize(&self, _content: &str, _kind: NoteType) -> Result<Summary> {
            Err(Error::Network("connection refused".to_string()))
        }

        async fn fetch_url_content(&self, _url: &str) -> Result<String> {
            Err(Error::Network("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn text_draft_is_summarized() {
        let draft = NoteDraft::new(NoteType::Text, "Buy milk.\nAlso buy eggs and bread.");
        let note = compose_note(&HeuristicSummarizer, &draft).await.unwrap();
        assert_eq!(note.title, "Buy milk.");
        assert_eq!(note.kind, NoteType::Text);
        assert_eq!(note.source_url, None);
        assert_eq!(note.file_url, None);
    }

    #[tokio::test]
    async fn url_draft_keeps_source_and_fetched_content() {
        let draft = NoteDraft::new(NoteType::Url, " https://example.com/post ");
        let note = compose_note(&HeuristicSummarizer, &draft).await.unwrap();
        assert_eq!(note.kind, NoteType::Url);
        assert_eq!(note.source_url.as_deref(), Some("https://example.com/post"));
        assert!(note
            .original_content
            .starts_with("Content from: https://example.com/post"));
    }

    #[tokio::test]
    async fn image_draft_sets_file_url() {
        let draft = NoteDraft::new(NoteType::Image, "file:///photos/receipt.jpg");
        let note = compose_note(&HeuristicSummarizer, &draft).await.unwrap();
        assert_eq!(note.file_url.as_deref(), Some("file:///photos/receipt.jpg"));
        assert_eq!(note.source_url, None);
    }

    #[tokio::test]
    async fn blank_draft_is_rejected() {
        let draft = NoteDraft::new(NoteType::Text, "   ");
        assert!(matches!(
            compose_note(&HeuristicSummarizer, &draft).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn url_fetch_failure_is_reported() {
        let draft = NoteDraft::new(NoteType::Url, "https://example.com");
        let error = compose_note(&BrokenSummarizer, &draft).await.unwrap_err();
        assert_eq!(error.to_string(), "Invalid input: Could not fetch URL content");
    }

    #[tokio::test]
    async fn summarizer_failure_uses_fallback() {
        let draft = NoteDraft::new(NoteType::Text, "Some text");
        let note = compose_note(&BrokenSummarizer, &draft).await.unwrap();
        assert_eq!(note.title, "Error Processing Content");
        assert_eq!(note.tags, vec!["error".to_string()]);
        assert_eq!(note.original_content, "Some text");
    }
}
