use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::storage::{Note, NoteUpdate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    Continue,
    Back,
    Edit,
    OpenLink(String),
    /// Change already applied to the displayed note; persist it now.
    Persist(NoteUpdate),
}

/// Read-only display of a note with link navigation.
#[derive(Debug, Clone)]
pub struct ViewModeController {
    note: Note,
    selected_link: usize,
}

impl ViewModeController {
    pub fn new(note: Note) -> Self {
        Self {
            note,
            selected_link: 0,
        }
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn selected_link(&self) -> usize {
        self.selected_link
    }

    /// Replace the displayed note with the stored copy after a save.
    pub fn sync(&mut self, note: Note) {
        if note.id == self.note.id {
            self.note = note;
            self.clamp_selection();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ViewOutcome {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
        {
            return ViewOutcome::Continue;
        }
        match key.code {
            KeyCode::Esc => ViewOutcome::Back,
            KeyCode::Enter => ViewOutcome::Edit,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_link = self.selected_link.saturating_sub(1);
                ViewOutcome::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_link += 1;
                self.clamp_selection();
                ViewOutcome::Continue
            }
            KeyCode::Char('o') => match self.note.links.get(self.selected_link) {
                Some(link) => ViewOutcome::OpenLink(link.url.clone()),
                None => ViewOutcome::Continue,
            },
            KeyCode::Char('d') | KeyCode::Delete => self.remove_selected_link(),
            KeyCode::Char('x') => {
                self.note.obscured = !self.note.obscured;
                ViewOutcome::Persist(NoteUpdate {
                    obscured: Some(self.note.obscured),
                    ..NoteUpdate::from_note(&self.note)
                })
            }
            _ => ViewOutcome::Continue,
        }
    }

    fn remove_selected_link(&mut self) -> ViewOutcome {
        if self.selected_link >= self.note.links.len() {
            return ViewOutcome::Continue;
        }
        self.note.links.remove(self.selected_link);
        self.clamp_selection();
        ViewOutcome::Persist(NoteUpdate {
            links: Some(self.note.links.clone()),
            ..NoteUpdate::from_note(&self.note)
        })
    }

    fn clamp_selection(&mut self) {
        self.selected_link = self
            .selected_link
            .min(self.note.links.len().saturating_sub(1));
    }
}
