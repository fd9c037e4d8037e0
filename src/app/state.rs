use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::list::{sort_notes, ListNavigator, ListOutcome};
use crate::app::session::{EditorFields, NoteCommit, NoteEditSession, SessionOutcome};
use crate::app::view::{ViewModeController, ViewOutcome};
use crate::config::SortMode;
use crate::storage::{Note, NoteUpdate, Priority};

/// The two faces of the note editor.
#[derive(Debug, Clone)]
pub enum EditorScreen {
    View(ViewModeController),
    Edit(NoteEditSession),
}

#[derive(Debug, Clone)]
pub enum Mode {
    List,
    Edit(EditorScreen),
    DeleteConfirm(Note),
}

/// Work the runtime must carry out against storage or the desktop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create or replace a note. The editor stays open until
    /// [`AppState::finish_commit`] is called.
    Commit(NoteCommit),
    /// Immediate write from the read-only view.
    Persist { note_id: String, update: NoteUpdate },
    SetPriority { note_id: String, priority: Priority },
    ToggleObscured(String),
    Delete(String),
    OpenUrl(String),
    Quit,
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Collection in persisted order; `notes` is derived from it.
    stored: Vec<Note>,
    notes: Vec<Note>,
    list: ListNavigator,
    mode: Mode,
    fields: EditorFields,
    status_message: Option<String>,
}

impl AppState {
    pub fn new(notes: Vec<Note>, sort_mode: SortMode, fields: EditorFields) -> Self {
        Self {
            notes: sort_notes(&notes, sort_mode),
            stored: notes,
            list: ListNavigator::new(sort_mode),
            mode: Mode::List,
            fields,
            status_message: None,
        }
    }

    /// Notes in display order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.list.selected()
    }

    pub fn selected(&self) -> Option<&Note> {
        self.notes.get(self.list.selected())
    }

    pub fn sort_mode(&self) -> SortMode {
        self.list.sort_mode()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn is_listing(&self) -> bool {
        matches!(self.mode, Mode::List)
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    /// Swap in a fresh copy of the collection, keeping the selection on
    /// `focus` when it is still present.
    pub fn replace_notes(&mut self, notes: Vec<Note>, focus: Option<&str>) {
        self.notes = sort_notes(&notes, self.list.sort_mode());
        self.stored = notes;
        match focus {
            Some(id) => self.select_note_by_id(id),
            None => self.list.normalize(self.notes.len()),
        }
    }

    pub fn select_note_by_id(&mut self, note_id: &str) {
        match self.notes.iter().position(|note| note.id == note_id) {
            Some(idx) => self.list.select_index(idx, self.notes.len()),
            None => self.list.normalize(self.notes.len()),
        }
    }

    /// Refresh the note shown in the read-only view after it was persisted.
    pub fn sync_viewed_note(&mut self, note: Note) {
        if let Mode::Edit(EditorScreen::View(view)) = &mut self.mode {
            view.sync(note);
        }
    }

    /// Close the editor after its commit reached storage.
    pub fn finish_commit(&mut self) {
        if matches!(self.mode, Mode::Edit(EditorScreen::Edit(_))) {
            self.mode = Mode::List;
        }
    }

    pub fn return_to_list(&mut self) {
        self.mode = Mode::List;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        self.status_message = None;
        if self.is_listing() {
            return self.handle_list_key(key);
        }
        match &mut self.mode {
            Mode::List => None,
            Mode::Edit(EditorScreen::View(view)) => match view.handle_key(key) {
                ViewOutcome::Continue => None,
                ViewOutcome::Back => {
                    self.mode = Mode::List;
                    None
                }
                ViewOutcome::Edit => {
                    let session = NoteEditSession::for_note(view.note(), self.fields);
                    self.mode = Mode::Edit(EditorScreen::Edit(session));
                    None
                }
                ViewOutcome::OpenLink(url) => Some(Command::OpenUrl(url)),
                ViewOutcome::Persist(update) => Some(Command::Persist {
                    note_id: view.note().id.clone(),
                    update,
                }),
            },
            Mode::Edit(EditorScreen::Edit(session)) => match session.handle_key(key) {
                SessionOutcome::Continue => None,
                SessionOutcome::Cancel => {
                    self.mode = Mode::List;
                    None
                }
                SessionOutcome::Save(commit) => Some(Command::Commit(commit)),
            },
            Mode::DeleteConfirm(note) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return None;
                }
                match key.code {
                    KeyCode::Char('d') | KeyCode::Char('y') | KeyCode::Enter => {
                        let note_id = note.id.clone();
                        self.mode = Mode::List;
                        Some(Command::Delete(note_id))
                    }
                    KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                        self.mode = Mode::List;
                        None
                    }
                    _ => None,
                }
            }
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Option<Command> {
        match self.list.handle_key(key, &self.notes) {
            ListOutcome::Continue => None,
            ListOutcome::Quit => Some(Command::Quit),
            ListOutcome::Resort => {
                self.notes = sort_notes(&self.stored, self.list.sort_mode());
                None
            }
            ListOutcome::Add => {
                let session = NoteEditSession::new_note(self.fields);
                self.mode = Mode::Edit(EditorScreen::Edit(session));
                None
            }
            ListOutcome::View(note_id) => {
                if let Some(note) = self.find(&note_id) {
                    self.mode = Mode::Edit(EditorScreen::View(ViewModeController::new(note)));
                }
                None
            }
            ListOutcome::Edit(note_id) => {
                if let Some(note) = self.find(&note_id) {
                    let session = NoteEditSession::for_note(&note, self.fields);
                    self.mode = Mode::Edit(EditorScreen::Edit(session));
                }
                None
            }
            ListOutcome::Delete(note_id) => {
                if let Some(note) = self.find(&note_id) {
                    self.mode = Mode::DeleteConfirm(note);
                }
                None
            }
            ListOutcome::SetPriority(note_id, priority) => {
                Some(Command::SetPriority { note_id, priority })
            }
            ListOutcome::ToggleObscured(note_id) => Some(Command::ToggleObscured(note_id)),
        }
    }

    fn find(&self, note_id: &str) -> Option<Note> {
        self.notes.iter().find(|note| note.id == note_id).cloned()
    }
}
