//! In-memory filtering and sorting of the cached note list.

use std::fmt;
use std::str::FromStr;

use crate::models::{Note, NoteType};

/// Sort order for filtered notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NoteSort {
    #[default]
    Newest,
    Oldest,
    Title,
    Type,
}

impl NoteSort {
    pub const ALL: [Self; 4] = [Self::Newest, Self::Oldest, Self::Title, Self::Type];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Title => "title",
            Self::Type => "type",
        }
    }
}

impl fmt::Display for NoteSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "title" => Ok(Self::Title),
            "type" => Ok(Self::Type),
            other => Err(format!("unknown sort '{other}'")),
        }
    }
}

/// Query, type filter and sort applied to a note list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub query: String,
    pub kind: Option<NoteType>,
    pub sort: NoteSort,
}

impl NoteFilter {
    /// Whether `note` passes the query and type filter.
    #[must_use]
    pub fn matches(&self, note: &Note) -> bool {
        if self.kind.is_some_and(|kind| kind != note.kind) {
            return false;
        }

        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }

        note.title.to_lowercase().contains(&query)
            || note.original_content.to_lowercase().contains(&query)
            || note.summary.to_lowercase().contains(&query)
            || note
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&query))
    }

    /// Matching notes in the requested order.
    #[must_use]
    pub fn apply(&self, notes: &[Note]) -> Vec<Note> {
        let mut matched: Vec<Note> = notes
            .iter()
            .filter(|note| self.matches(note))
            .cloned()
            .collect();

        match self.sort {
            NoteSort::Newest => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            NoteSort::Oldest => matched.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            NoteSort::Title => matched.sort_by_cached_key(|note| note.title.to_lowercase()),
            NoteSort::Type => matched.sort_by_key(|note| note.kind.as_str()),
        }
        matched
    }

    /// Filters that differ from the defaults, not counting the query.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        usize::from(self.kind.is_some()) + usize::from(self.sort != NoteSort::Newest)
    }
}
