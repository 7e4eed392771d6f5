//! Note model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Kind of content a note was captured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    Text,
    Url,
    File,
    Image,
}

impl NoteType {
    pub const ALL: [Self; 4] = [Self::Text, Self::Url, Self::File, Self::Image];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Url => "url",
            Self::File => "file",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for NoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "url" => Ok(Self::Url),
            "file" => Ok(Self::File),
            "image" => Ok(Self::Image),
            other => Err(format!("unknown note type '{other}'")),
        }
    }
}

/// A note row as stored remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub user_id: String,
    pub title: String,
    pub original_content: String,
    #[serde(default)]
    pub summary: String,
    #[serde(rename = "type")]
    pub kind: NoteType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Merge a partial update into this note.
    pub fn apply(&mut self, patch: &NotePatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &patch.original_content {
            self.original_content.clone_from(content);
        }
        if let Some(summary) = &patch.summary {
            self.summary.clone_from(summary);
        }
        if let Some(tags) = &patch.tags {
            self.tags.clone_from(tags);
        }
        self.updated_at = now;
    }

    /// Whether any tag matches one of `keywords` (case-insensitive).
    #[must_use]
    pub fn has_any_tag(&self, keywords: &[&str]) -> bool {
        self.tags
            .iter()
            .any(|tag| keywords.contains(&tag.to_lowercase().as_str()))
    }
}

/// Fields for a note that has not been stored yet.
///
/// Build it with [`NewNote::new`] so the type and reference fields agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNote {
    pub title: String,
    pub original_content: String,
    pub summary: String,
    #[serde(rename = "type")]
    pub kind: NoteType,
    pub tags: Vec<String>,
    pub source_url: Option<String>,
    pub file_url: Option<String>,
}

impl NewNote {
    /// Create an unsaved note, routing `reference` into the field its type owns:
    /// URLs go to `source_url`, files and images to `file_url`, text to neither.
    #[must_use]
    pub fn new(
        kind: NoteType,
        reference: &str,
        title: impl Into<String>,
        original_content: impl Into<String>,
        summary: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        let reference = reference.trim().to_string();
        let (source_url, file_url) = match kind {
            NoteType::Text => (None, None),
            NoteType::Url => (Some(reference), None),
            NoteType::File | NoteType::Image => (None, Some(reference)),
        };

        Self {
            title: title.into(),
            original_content: original_content.into(),
            summary: summary.into(),
            kind,
            tags,
            source_url,
            file_url,
        }
    }
}

/// Insert payload for the `notes` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteInsert {
    pub user_id: String,
    #[serde(flatten)]
    pub note: NewNote,
}

/// Partial update for a note. Type and reference fields are fixed at capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NotePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.original_content.is_none()
            && self.summary.is_none()
            && self.tags.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_note() -> Note {
        let now = Utc::now();
        Note {
            id: NoteId::new(),
            user_id: "user-1".to_string(),
            title: "Title".to_string(),
            original_content: "Body".to_string(),
            summary: "Summary".to_string(),
            kind: NoteType::Text,
            tags: vec!["Health".to_string()],
            source_url: None,
            file_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_note_id_parse() {
        let id = NoteId::new();
        let parsed: NoteId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn new_note_routes_reference_by_type() {
        let text = NewNote::new(NoteType::Text, "ignored", "t", "c", "s", vec![]);
        assert_eq!((text.source_url, text.file_url), (None, None));

        let url = NewNote::new(NoteType::Url, " https://a.b ", "t", "c", "s", vec![]);
        assert_eq!(url.source_url.as_deref(), Some("https://a.b"));
        assert_eq!(url.file_url, None);

        for kind in [NoteType::File, NoteType::Image] {
            let file = NewNote::new(kind, "file:///tmp/x.png", "t", "c", "s", vec![]);
            assert_eq!(file.source_url, None);
            assert_eq!(file.file_url.as_deref(), Some("file:///tmp/x.png"));
        }
    }

    #[test]
    fn note_type_serializes_lowercase_under_type_key() {
        let insert = NoteInsert {
            user_id: "u".to_string(),
            note: NewNote::new(NoteType::Image, "uri", "t", "c", "s", vec![]),
        };
        let value = serde_json::to_value(&insert).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["user_id"], "u");
        assert_eq!(value["file_url"], "uri");
    }

    #[test]
    fn patch_skips_absent_fields() {
        let patch = NotePatch {
            tags: Some(vec!["a".to_string()]),
            ..Default::default()
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value, serde_json::json!({ "tags": ["a"] }));
    }

    #[test]
    fn apply_patch_merges_and_bumps_updated_at() {
        let mut note = sample_note();
        let later = note.updated_at + chrono::Duration::seconds(5);
        note.apply(
            &NotePatch {
                title: Some("New".to_string()),
                ..Default::default()
            },
            later,
        );
        assert_eq!(note.title, "New");
        assert_eq!(note.original_content, "Body");
        assert_eq!(note.updated_at, later);
    }

    #[test]
    fn has_any_tag_ignores_case() {
        let note = sample_note();
        assert!(note.has_any_tag(&["health", "fitness"]));
        assert!(!note.has_any_tag(&["finance"]));
    }
}
