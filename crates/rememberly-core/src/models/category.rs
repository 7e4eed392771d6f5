//! Tag-derived note categories

use super::Note;

/// A built-in category matched against note tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// Lowercase tags that place a note in this category
    pub keywords: &'static [&'static str],
}

impl Category {
    #[must_use]
    pub fn matches(&self, note: &Note) -> bool {
        note.has_any_tag(self.keywords)
    }

    /// Look up a built-in category by id or name (case-insensitive).
    #[must_use]
    pub fn find(key: &str) -> Option<&'static Self> {
        let key = key.trim();
        BUILTIN_CATEGORIES.iter().find(|category| {
            category.id.eq_ignore_ascii_case(key) || category.name.eq_ignore_ascii_case(key)
        })
    }
}

pub static BUILTIN_CATEGORIES: [Category; 4] = [
    Category {
        id: "health",
        name: "Health",
        description: "Medical, fitness, wellness",
        keywords: &["health", "fitness", "medical", "wellness", "exercise", "diet"],
    },
    Category {
        id: "technology",
        name: "Technology",
        description: "AI, software, gadgets",
        keywords: &["technology", "ai", "software", "programming", "tech", "code"],
    },
    Category {
        id: "finance",
        name: "Finance",
        description: "Investment, banking, crypto",
        keywords: &["finance", "money", "investment", "banking", "crypto", "stocks"],
    },
    Category {
        id: "news",
        name: "News",
        description: "Current events, politics",
        keywords: &["news", "politics", "current", "events", "world", "breaking"],
    },
];

/// Notes belonging to `category`, in their existing order.
pub fn notes_in_category<'a>(notes: &'a [Note], category: &Category) -> Vec<&'a Note> {
    notes.iter().filter(|note| category.matches(note)).collect()
}

/// Number of notes in each built-in category.
pub fn category_counts(notes: &[Note]) -> Vec<(&'static Category, usize)> {
    BUILTIN_CATEGORIES
        .iter()
        .map(|category| {
            let count = notes.iter().filter(|note| category.matches(note)).count();
            (category, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteId, NoteType};
    use chrono::Utc;

    fn note_with_tags(tags: &[&str]) -> Note {
        let now = Utc::now();
        Note {
            id: NoteId::new(),
            user_id: "user".to_string(),
            title: "t".to_string(),
            original_content: "c".to_string(),
            summary: String::new(),
            kind: NoteType::Text,
            tags: tags.iter().map(ToString::to_string).collect(),
            source_url: None,
            file_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn counts_notes_per_category() {
        let notes = vec![
            note_with_tags(&["fitness", "diet"]),
            note_with_tags(&["Crypto"]),
            note_with_tags(&["gardening"]),
            note_with_tags(&["code", "money"]),
        ];

        let counts = category_counts(&notes)
            .into_iter()
            .map(|(category, count)| (category.id, count))
            .collect::<Vec<_>>();
        assert_eq!(
            counts,
            vec![("health", 1), ("technology", 1), ("finance", 2), ("news", 0)]
        );
    }

    #[test]
    fn find_accepts_id_or_name() {
        assert_eq!(Category::find("Finance").map(|c| c.id), Some("finance"));
        assert_eq!(Category::find("news").map(|c| c.id), Some("news"));
        assert!(Category::find("recipes").is_none());
    }

    #[test]
    fn notes_in_category_filters() {
        let notes = vec![note_with_tags(&["politics"]), note_with_tags(&["diet"])];
        let news = Category::find("news").unwrap();
        let matched = notes_in_category(&notes, news);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].tags, vec!["politics".to_string()]);
    }
}
