use crate::config::AppConfig;
use crate::filter::{FilterQuery, PriorityFilter};
use crate::notes::{util, Note, NoteBook, NoteDraft, Priority};
use crate::storage::{NoteStore, SaveOutcome};
use crate::weather::WeatherReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Form,
    List,
}

/// What a form submit will do: prepend a fresh record, or replace the fields
/// of the record being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Creating,
    Editing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Content,
    Tags,
    Priority,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Title => FormField::Content,
            FormField::Content => FormField::Tags,
            FormField::Tags => FormField::Priority,
            FormField::Priority => FormField::Title,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FormField::Title => FormField::Priority,
            FormField::Content => FormField::Title,
            FormField::Tags => FormField::Content,
            FormField::Priority => FormField::Tags,
        }
    }
}

/// The editor form. Inputs mirror the card fields; tags are kept as the raw
/// comma-separated string until submit.
#[derive(Debug, Clone)]
pub struct FormState {
    pub mode: FormMode,
    pub active: FormField,
    pub title: String,
    pub content: String,
    pub tags: String,
    pub priority: Priority,
}

impl FormState {
    pub fn new(default_priority: Priority) -> Self {
        Self {
            mode: FormMode::Creating,
            active: FormField::Title,
            title: String::new(),
            content: String::new(),
            tags: String::new(),
            priority: default_priority,
        }
    }

    pub fn reset(&mut self, default_priority: Priority) {
        *self = FormState::new(default_priority);
    }

    /// Loads a record's fields into the inputs and switches to edit mode.
    pub fn load(&mut self, note: &Note) {
        self.mode = FormMode::Editing(note.id.clone());
        self.active = FormField::Title;
        self.title = note.title.clone();
        self.content = note.content.clone();
        self.tags = note.tags.join(", ");
        self.priority = note.priority;
    }

    pub fn is_editing(&self, id: &str) -> bool {
        matches!(&self.mode, FormMode::Editing(editing) if editing == id)
    }

    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            FormMode::Editing(id) => Some(id),
            FormMode::Creating => None,
        }
    }

    pub fn draft(&self) -> NoteDraft {
        NoteDraft {
            title: self.title.clone(),
            content: self.content.clone(),
            tags: util::parse_tags(&self.tags),
            priority: self.priority,
        }
    }

    pub fn active_input_mut(&mut self) -> Option<&mut String> {
        match self.active {
            FormField::Title => Some(&mut self.title),
            FormField::Content => Some(&mut self.content),
            FormField::Tags => Some(&mut self.tags),
            FormField::Priority => None,
        }
    }

    pub fn cycle_priority(&mut self) {
        self.priority = match self.priority {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High => Priority::Low,
        };
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmDeleteOverlay {
    pub note_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct WeatherOverlay {
    pub city_input: String,
    pub loading: bool,
    pub report: Option<WeatherReport>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    ConfirmDelete(ConfirmDeleteOverlay),
    ConfirmDeleteAll,
    Weather(WeatherOverlay),
}

/// Application state: the working note list, the editor form, the live
/// filter, and transient UI state. Every mutation flushes the whole list to
/// the store before the next render.
pub struct AppState {
    pub focus: FocusPane,
    pub form: FormState,
    pub query: FilterQuery,
    pub selected: usize,
    pub search_active: bool,
    pub move_source: Option<String>,
    pub status_message: Option<String>,
    pub overlay: Option<OverlayState>,
    book: NoteBook,
    store: NoteStore,
    default_priority: Priority,
}

impl AppState {
    pub fn load(store: NoteStore, config: &AppConfig) -> Self {
        let book = NoteBook::from_notes(store.load());
        Self {
            focus: FocusPane::List,
            form: FormState::new(config.default_priority),
            query: FilterQuery::default(),
            selected: 0,
            search_active: false,
            move_source: None,
            status_message: None,
            overlay: None,
            book,
            store,
            default_priority: config.default_priority,
        }
    }

    pub fn book(&self) -> &NoteBook {
        &self.book
    }

    /// The filtered view in list order.
    pub fn visible(&self) -> Vec<&Note> {
        self.query.apply(self.book.notes())
    }

    pub fn visible_len(&self) -> usize {
        self.visible().len()
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.visible().get(self.selected).copied()
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.visible_len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let current = self.selected.min(len - 1) as isize;
        self.selected = current.saturating_add(delta).clamp(0, len as isize - 1) as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Create-or-update per the form mode. A blank trimmed title or content
    /// blocks the submit with a notice and mutates nothing. Returns true
    /// when the list changed.
    pub fn submit_form(&mut self) -> bool {
        if self.form.title.trim().is_empty() || self.form.content.trim().is_empty() {
            self.set_status_message("Title and content are required.");
            return false;
        }
        let draft = self.form.draft();
        match self.form.mode.clone() {
            FormMode::Creating => match self.book.create(draft) {
                Ok(_) => {}
                Err(err) => {
                    self.set_status_message(err.to_string());
                    return false;
                }
            },
            FormMode::Editing(id) => match self.book.update(&id, draft) {
                Ok(true) => {}
                Ok(false) => {
                    // The record vanished while it was being edited.
                    self.set_status_message("Note no longer exists.");
                    self.form.reset(self.default_priority);
                    return false;
                }
                Err(err) => {
                    self.set_status_message(err.to_string());
                    return false;
                }
            },
        }
        self.persist();
        self.form.reset(self.default_priority);
        self.clamp_selection();
        true
    }

    /// Returns to creating mode without touching the list.
    pub fn clear_form(&mut self) {
        self.form.reset(self.default_priority);
    }

    /// Loads the selected card into the form for editing.
    pub fn begin_edit_selected(&mut self) -> bool {
        let Some(note) = self.selected_note().cloned() else {
            return false;
        };
        self.form.load(&note);
        self.focus = FocusPane::Form;
        true
    }

    /// Removes the note by id; resets the form when that note was being
    /// edited. Unknown ids are a no-op.
    pub fn delete_note(&mut self, id: &str) -> bool {
        if !self.book.remove(id) {
            return false;
        }
        if self.form.is_editing(id) {
            self.form.reset(self.default_priority);
        }
        self.persist();
        self.clamp_selection();
        true
    }

    /// Empties the entire list. Callers confirm first; an already empty
    /// list never reaches this.
    pub fn delete_all(&mut self) -> usize {
        let dropped = self.book.clear();
        self.form.reset(self.default_priority);
        self.persist();
        self.selected = 0;
        dropped
    }

    /// Explicit reorder: move `source_id` immediately before `target_id`.
    pub fn reorder(&mut self, source_id: &str, target_id: &str) -> bool {
        if !self.book.reorder(source_id, target_id) {
            return false;
        }
        self.persist();
        true
    }

    /// Drops the grabbed note onto the currently selected card.
    pub fn drop_grabbed_on_selected(&mut self) -> bool {
        let Some(source_id) = self.move_source.take() else {
            return false;
        };
        let Some(target_id) = self.selected_note().map(|note| note.id.clone()) else {
            return false;
        };
        let moved = self.reorder(&source_id, &target_id);
        if moved {
            // Keep the moved card selected after the list shifts.
            if let Some(position) = self
                .visible()
                .iter()
                .position(|note| note.id == source_id)
            {
                self.selected = position;
            }
        }
        moved
    }

    pub fn cycle_priority_filter(&mut self) {
        self.query.priority = self.query.priority.next();
        self.clamp_selection();
    }

    pub fn reset_filters(&mut self) {
        self.query = FilterQuery::default();
        self.clamp_selection();
    }

    pub fn push_search_char(&mut self, ch: char) {
        self.query.search.push(ch);
        self.clamp_selection();
    }

    pub fn pop_search_char(&mut self) {
        self.query.search.pop();
        self.clamp_selection();
    }

    pub fn cancel_search(&mut self) {
        self.search_active = false;
        self.query.search.clear();
        self.clamp_selection();
    }

    pub fn priority_filter(&self) -> PriorityFilter {
        self.query.priority
    }

    /// Flushes the whole list to the slot. A failed write is a warning, not
    /// an error: the in-memory list stays authoritative.
    pub fn persist(&mut self) {
        if let SaveOutcome::Failed { reason } = self.store.save(self.book.notes()) {
            self.set_status_message(format!("Changes kept in memory; disk write failed: {reason}"));
        }
    }
}
