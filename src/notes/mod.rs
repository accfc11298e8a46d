use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;

pub mod util;

/// A single note record. List position is significant: the board displays
/// notes in list order and reordering moves records within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Low
    }
}

/// Mutable fields of a note as captured by the editor form.
#[derive(Debug, Clone)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub priority: Priority,
}

impl Default for NoteDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            tags: Vec::new(),
            priority: Priority::Medium,
        }
    }
}

/// The working copy of all notes. Every user action mutates this list and
/// the caller flushes it to storage afterwards.
#[derive(Debug, Clone, Default)]
pub struct NoteBook {
    notes: Vec<Note>,
}

impl NoteBook {
    pub fn new() -> Self {
        Self { notes: Vec::new() }
    }

    pub fn from_notes(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.notes.iter().position(|note| note.id == id)
    }

    /// Prepends a new record built from `draft` and returns its id.
    pub fn create(&mut self, draft: NoteDraft) -> Result<String> {
        let (title, content) = validated_fields(&draft)?;
        let now = now_timestamp();
        let note = Note {
            id: util::generate_id(),
            title,
            content,
            tags: draft.tags,
            priority: draft.priority,
            created_at: now,
            updated_at: now,
        };
        let id = note.id.clone();
        self.notes.insert(0, note);
        Ok(id)
    }

    /// Replaces the mutable fields of the note with `id` in place, keeping
    /// its id, creation timestamp, and list position. Returns false when no
    /// note carries that id.
    pub fn update(&mut self, id: &str, draft: NoteDraft) -> Result<bool> {
        let (title, content) = validated_fields(&draft)?;
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            return Ok(false);
        };
        note.title = title;
        note.content = content;
        note.tags = draft.tags;
        note.priority = draft.priority;
        note.updated_at = now_timestamp();
        Ok(true)
    }

    /// Removes the note with `id`; unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        self.notes.len() != before
    }

    /// Empties the entire list, returning how many notes were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.notes.len();
        self.notes.clear();
        dropped
    }

    /// Moves the note `source_id` so it sits immediately before the note
    /// `target_id` currently does. Missing ids or identical ids leave the
    /// list untouched.
    pub fn reorder(&mut self, source_id: &str, target_id: &str) -> bool {
        if source_id == target_id {
            return false;
        }
        let Some(source) = self.position(source_id) else {
            return false;
        };
        let moved = self.notes.remove(source);
        match self.position(target_id) {
            Some(target) => {
                self.notes.insert(target, moved);
                true
            }
            None => {
                // Target vanished between lookup and removal; restore.
                self.notes.insert(source, moved);
                false
            }
        }
    }
}

fn validated_fields(draft: &NoteDraft) -> Result<(String, String)> {
    let title = draft.title.trim();
    let content = draft.content.trim();
    if title.is_empty() || content.is_empty() {
        bail!("title and content are required");
    }
    Ok((title.to_string(), content.to_string()))
}

fn now_timestamp() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, content: &str) -> NoteDraft {
        NoteDraft {
            title: title.to_string(),
            content: content.to_string(),
            tags: Vec::new(),
            priority: Priority::Medium,
        }
    }

    fn seeded() -> (NoteBook, Vec<String>) {
        let mut book = NoteBook::new();
        let c = book.create(draft("C", "third")).unwrap();
        let b = book.create(draft("B", "second")).unwrap();
        let a = book.create(draft("A", "first")).unwrap();
        // Creation prepends, so the list now reads [A, B, C].
        (book, vec![a, b, c])
    }

    fn titles(book: &NoteBook) -> Vec<&str> {
        book.notes().iter().map(|note| note.title.as_str()).collect()
    }

    #[test]
    fn create_prepends_and_grows_list_by_one() {
        let mut book = NoteBook::new();
        book.create(draft("Old", "body")).unwrap();
        let len_before = book.len();
        let id = book.create(draft("New", "body")).unwrap();
        assert_eq!(book.len(), len_before + 1);
        assert_eq!(book.notes()[0].id, id);
        assert_eq!(book.notes()[0].title, "New");
    }

    #[test]
    fn create_rejects_blank_title_or_content() {
        let mut book = NoteBook::new();
        assert!(book.create(draft("   ", "body")).is_err());
        assert!(book.create(draft("Title", " \t ")).is_err());
        assert!(book.is_empty());
    }

    #[test]
    fn create_trims_title_and_content() {
        let mut book = NoteBook::new();
        book.create(draft("  Trimmed  ", "  body  ")).unwrap();
        assert_eq!(book.notes()[0].title, "Trimmed");
        assert_eq!(book.notes()[0].content, "body");
    }

    #[test]
    fn update_preserves_id_and_created_at() {
        let mut book = NoteBook::new();
        let id = book.create(draft("Before", "old body")).unwrap();
        let created_at = book.get(&id).unwrap().created_at;
        let len_before = book.len();

        let changed = book
            .update(
                &id,
                NoteDraft {
                    title: "After".into(),
                    content: "new body".into(),
                    tags: vec!["x".into()],
                    priority: Priority::High,
                },
            )
            .unwrap();
        assert!(changed);
        assert_eq!(book.len(), len_before);

        let note = book.get(&id).unwrap();
        assert_eq!(note.id, id);
        assert_eq!(note.created_at, created_at);
        assert!(note.updated_at >= created_at);
        assert_eq!(note.title, "After");
        assert_eq!(note.priority, Priority::High);
    }

    #[test]
    fn update_unknown_id_is_a_noop() {
        let (mut book, _) = seeded();
        let snapshot = book.notes().to_vec();
        let changed = book.update("missing", draft("X", "y")).unwrap();
        assert!(!changed);
        assert_eq!(book.notes(), snapshot.as_slice());
    }

    #[test]
    fn remove_deletes_exactly_one_id() {
        let (mut book, ids) = seeded();
        assert!(book.remove(&ids[1]));
        assert_eq!(book.len(), 2);
        assert!(book.get(&ids[0]).is_some());
        assert!(book.get(&ids[1]).is_none());
        assert!(book.get(&ids[2]).is_some());
    }

    #[test]
    fn remove_unknown_id_is_a_noop() {
        let (mut book, _) = seeded();
        assert!(!book.remove("missing"));
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn clear_empties_the_list() {
        let (mut book, _) = seeded();
        assert_eq!(book.clear(), 3);
        assert!(book.is_empty());
        assert_eq!(book.clear(), 0);
    }

    #[test]
    fn reorder_inserts_source_before_target() {
        // [A, B, C]: moving A before C removes A, then inserts it at C's
        // current index, yielding [B, A, C].
        let (mut book, ids) = seeded();
        assert!(book.reorder(&ids[0], &ids[2]));
        assert_eq!(titles(&book), ["B", "A", "C"]);
    }

    #[test]
    fn reorder_moves_later_note_earlier() {
        let (mut book, ids) = seeded();
        assert!(book.reorder(&ids[2], &ids[0]));
        assert_eq!(titles(&book), ["C", "A", "B"]);
    }

    #[test]
    fn reorder_with_missing_id_is_a_noop() {
        let (mut book, ids) = seeded();
        assert!(!book.reorder("missing", &ids[0]));
        assert!(!book.reorder(&ids[0], "missing"));
        assert!(!book.reorder(&ids[1], &ids[1]));
        assert_eq!(titles(&book), ["A", "B", "C"]);
    }

    #[test]
    fn priority_round_trips_through_strings() {
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("MEDIUM".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!(Priority::Low.to_string(), "low");
        assert!("urgent".parse::<Priority>().is_err());
    }
}
