use crate::notes::{util, Note, Priority};

/// Priority restriction applied to the rendered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    pub fn matches(&self, priority: Priority) -> bool {
        match self {
            PriorityFilter::All => true,
            PriorityFilter::Only(wanted) => *wanted == priority,
        }
    }

    /// Cycles all → low → medium → high → all.
    pub fn next(self) -> Self {
        match self {
            PriorityFilter::All => PriorityFilter::Only(Priority::Low),
            PriorityFilter::Only(Priority::Low) => PriorityFilter::Only(Priority::Medium),
            PriorityFilter::Only(Priority::Medium) => PriorityFilter::Only(Priority::High),
            PriorityFilter::Only(Priority::High) => PriorityFilter::All,
        }
    }

    pub fn label(&self) -> String {
        match self {
            PriorityFilter::All => "all".to_string(),
            PriorityFilter::Only(priority) => priority.to_string(),
        }
    }
}

/// Live view restriction: free-text search plus a priority selector.
#[derive(Debug, Clone, Default)]
pub struct FilterQuery {
    pub search: String,
    pub priority: PriorityFilter,
}

impl FilterQuery {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.priority == PriorityFilter::All
    }

    /// Retains notes whose priority passes the selector and whose combined
    /// title, content, and tags contain the search string, case-insensitive.
    /// Result order equals list order.
    pub fn apply<'a>(&self, notes: &'a [Note]) -> Vec<&'a Note> {
        let needle = self.search.trim().to_lowercase();
        notes
            .iter()
            .filter(|note| self.priority.matches(note.priority))
            .filter(|note| needle.is_empty() || haystack(note).contains(&needle))
            .collect()
    }
}

fn haystack(note: &Note) -> String {
    let mut combined =
        String::with_capacity(note.title.len() + note.content.len() + note.tags.len() * 8);
    combined.push_str(&note.title);
    combined.push(' ');
    combined.push_str(&note.content);
    for tag in &note.tags {
        combined.push(' ');
        combined.push_str(tag);
    }
    combined.to_lowercase()
}

/// Trailing count line under the rendered list, e.g. "3 notes".
pub fn count_label(count: usize) -> String {
    format!("{count} {}", util::pluralize(count, "note", "notes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{NoteBook, NoteDraft};

    fn board() -> NoteBook {
        let mut book = NoteBook::new();
        book.create(NoteDraft {
            title: "Work plan".into(),
            content: "quarterly roadmap".into(),
            tags: vec!["office".into()],
            priority: Priority::High,
        })
        .unwrap();
        book.create(NoteDraft {
            title: "Shopping".into(),
            content: "milk and eggs".into(),
            tags: vec!["errand".into()],
            priority: Priority::Low,
        })
        .unwrap();
        // List order: [Shopping, Work plan]
        book
    }

    fn titles<'a>(notes: &[&'a Note]) -> Vec<&'a str> {
        notes.iter().map(|note| note.title.as_str()).collect()
    }

    #[test]
    fn priority_filter_restricts_to_one_value() {
        let book = board();
        let query = FilterQuery {
            search: String::new(),
            priority: PriorityFilter::Only(Priority::High),
        };
        assert_eq!(titles(&query.apply(book.notes())), ["Work plan"]);
    }

    #[test]
    fn search_matches_title_content_and_tags() {
        let book = board();
        let by_title = FilterQuery {
            search: "plan".into(),
            priority: PriorityFilter::All,
        };
        assert_eq!(titles(&by_title.apply(book.notes())), ["Work plan"]);

        let by_content = FilterQuery {
            search: "MILK".into(),
            priority: PriorityFilter::All,
        };
        assert_eq!(titles(&by_content.apply(book.notes())), ["Shopping"]);

        let by_tag = FilterQuery {
            search: "errand".into(),
            priority: PriorityFilter::All,
        };
        assert_eq!(titles(&by_tag.apply(book.notes())), ["Shopping"]);
    }

    #[test]
    fn empty_query_returns_everything_in_list_order() {
        let book = board();
        let query = FilterQuery::default();
        assert_eq!(titles(&query.apply(book.notes())), ["Shopping", "Work plan"]);
    }

    #[test]
    fn search_and_priority_combine() {
        let book = board();
        let query = FilterQuery {
            search: "plan".into(),
            priority: PriorityFilter::Only(Priority::Low),
        };
        assert!(query.apply(book.notes()).is_empty());
    }

    #[test]
    fn filter_cycle_wraps_back_to_all() {
        let mut filter = PriorityFilter::All;
        for _ in 0..4 {
            filter = filter.next();
        }
        assert_eq!(filter, PriorityFilter::All);
    }

    #[test]
    fn count_label_is_pluralized() {
        assert_eq!(count_label(1), "1 note");
        assert_eq!(count_label(0), "0 notes");
        assert_eq!(count_label(2), "2 notes");
    }
}
