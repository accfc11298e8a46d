use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;

use crate::notes::Note;

const SLOT_TMP_EXTENSION: &str = "json.tmp";

/// Outcome of a best-effort save. Persistence is never fatal: a failed write
/// leaves the previously persisted list untouched and callers may surface
/// the reason as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Failed { reason: String },
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved)
    }
}

/// The persistent slot: one file holding the entire note list as a JSON
/// array. Reads tolerate a missing, unreadable, or corrupt slot; writes
/// always replace the whole list.
#[derive(Debug, Clone)]
pub struct NoteStore {
    slot_path: PathBuf,
}

impl NoteStore {
    pub fn new(slot_path: PathBuf) -> Self {
        Self { slot_path }
    }

    pub fn slot_path(&self) -> &Path {
        &self.slot_path
    }

    /// Reads the full list from the slot. An absent slot, unparseable
    /// content, or a JSON value that is not an array all yield an empty
    /// list; corrupt entries within an otherwise valid array are skipped.
    pub fn load(&self) -> Vec<Note> {
        let raw = match fs::read_to_string(&self.slot_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                tracing::warn!(?err, slot = %self.slot_path.display(), "failed to read note slot");
                return Vec::new();
            }
        };
        let parsed: Value = match serde_json::from_str(&raw) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(?err, slot = %self.slot_path.display(), "note slot is not valid JSON");
                return Vec::new();
            }
        };
        let Value::Array(entries) = parsed else {
            tracing::warn!(slot = %self.slot_path.display(), "note slot is not a JSON array");
            return Vec::new();
        };
        let mut notes = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<Note>(entry) {
                Ok(note) => notes.push(note),
                Err(err) => {
                    tracing::warn!(?err, "skipping malformed note record");
                }
            }
        }
        notes
    }

    /// Serializes and atomically replaces the whole slot. A failure is
    /// reported, not raised, and does not disturb the prior slot contents.
    pub fn save(&self, notes: &[Note]) -> SaveOutcome {
        match self.write_slot(notes) {
            Ok(()) => SaveOutcome::Saved,
            Err(err) => {
                tracing::warn!(?err, slot = %self.slot_path.display(), "failed to persist notes");
                SaveOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn write_slot(&self, notes: &[Note]) -> Result<()> {
        let json = serde_json::to_vec_pretty(notes).context("serialising note list")?;
        if let Some(parent) = self.slot_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
        let tmp_path = self.slot_path.with_extension(SLOT_TMP_EXTENSION);
        fs::write(&tmp_path, &json)
            .with_context(|| format!("writing temporary slot {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.slot_path)
            .with_context(|| format!("replacing note slot {}", self.slot_path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{NoteBook, NoteDraft, Priority};
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> NoteStore {
        NoteStore::new(temp.path().join("data/notes.json"))
    }

    fn sample_notes() -> Vec<Note> {
        let mut book = NoteBook::new();
        book.create(NoteDraft {
            title: "Shopping".into(),
            content: "milk, eggs".into(),
            tags: vec!["errand".into()],
            priority: Priority::Low,
        })
        .unwrap();
        book.create(NoteDraft {
            title: "Work plan".into(),
            content: "draft roadmap".into(),
            tags: vec!["work".into(), "q3".into()],
            priority: Priority::High,
        })
        .unwrap();
        book.notes().to_vec()
    }

    #[test]
    fn save_then_load_round_trips_content_and_order() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let notes = sample_notes();

        assert_matches!(store.save(&notes), SaveOutcome::Saved);
        assert_eq!(store.load(), notes);
    }

    #[test]
    fn load_of_missing_slot_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(store_in(&temp).load().is_empty());
    }

    #[test]
    fn load_of_unparseable_slot_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::create_dir_all(store.slot_path().parent().unwrap()).unwrap();
        fs::write(store.slot_path(), "{not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn load_of_non_array_slot_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::create_dir_all(store.slot_path().parent().unwrap()).unwrap();
        fs::write(store.slot_path(), r#"{"notes": []}"#).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn load_skips_malformed_records() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        fs::create_dir_all(store.slot_path().parent().unwrap()).unwrap();
        fs::write(
            store.slot_path(),
            r#"[
                {"id":"a","title":"Kept","content":"body","tags":[],"priority":"low","createdAt":1,"updatedAt":1},
                {"title":"No id"}
            ]"#,
        )
        .unwrap();
        let notes = store.load();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].title, "Kept");
    }

    #[test]
    fn failed_save_reports_and_preserves_prior_slot() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let notes = sample_notes();
        assert_matches!(store.save(&notes), SaveOutcome::Saved);

        // Turning the slot path into a directory makes the rename fail.
        let blocked = NoteStore::new(temp.path().join("data"));
        let outcome = blocked.save(&notes);
        assert_matches!(outcome, SaveOutcome::Failed { .. });
        assert!(!outcome.is_saved());

        assert_eq!(store.load(), notes);
    }
}
