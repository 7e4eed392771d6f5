//! Offline summarizer built from simple text heuristics.

use std::collections::HashSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use super::{Summarizer, Summary};
use crate::models::NoteType;
use crate::util::truncate_with_ellipsis;
use crate::Result;

const TITLE_MAX_CHARS: usize = 50;
const SUMMARY_FALLBACK_CHARS: usize = 100;
const SUMMARY_SENTENCES: usize = 2;
const MAX_TAGS: usize = 5;
const STOPWORDS: [&str; 12] = [
    "this", "that", "with", "have", "will", "been", "from", "they", "know", "want", "were", "said",
];

/// Summarizer that needs no network access.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicSummarizer;

impl HeuristicSummarizer {
    #[must_use]
    pub fn summarize_text(content: &str) -> Summary {
        Summary {
            title: title(content),
            summary: summary(content),
            tags: tags(content),
        }
    }
}

#[async_trait]
impl Summarizer for HeuristicSummarizer {
    async fn summarize(&self, content: &str, _kind: NoteType) -> Result<Summary> {
        Ok(Self::summarize_text(content))
    }

    async fn fetch_url_content(&self, url: &str) -> Result<String> {
        Ok(format!(
            "Content from: {url}\n\nThis is a placeholder for the actual webpage content that would be extracted by a web scraping service."
        ))
    }
}

fn title(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map_or_else(
            || "Untitled Note".to_string(),
            |line| truncate_with_ellipsis(line, TITLE_MAX_CHARS),
        )
}

fn summary(content: &str) -> String {
    static SENTENCE_END: OnceLock<Regex> = OnceLock::new();
    let re = SENTENCE_END.get_or_init(|| Regex::new(r"[.!?]+").expect("Invalid regex"));

    let sentences: Vec<&str> = re
        .split(content)
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect();

    if sentences.is_empty() {
        let head: String = content.chars().take(SUMMARY_FALLBACK_CHARS).collect();
        return format!("{head}...");
    }

    let mut summary = sentences
        .iter()
        .take(SUMMARY_SENTENCES)
        .copied()
        .collect::<Vec<_>>()
        .join(". ");
    if sentences.len() > SUMMARY_SENTENCES {
        summary.push('.');
    }
    summary
}

fn tags(content: &str) -> Vec<String> {
    static WORD: OnceLock<Regex> = OnceLock::new();
    let re = WORD.get_or_init(|| Regex::new(r"\b\w{4,}\b").expect("Invalid regex"));

    let lowered = content.to_lowercase();
    let mut seen = HashSet::new();
    re.find_iter(&lowered)
        .map(|word| word.as_str())
        .filter(|word| seen.insert(*word))
        .filter(|word| !STOPWORDS.contains(word))
        .take(MAX_TAGS)
        .map(ToString::to_string)
        .collect()
}
