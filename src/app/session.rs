use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::buffer::TextBuffer;
use crate::app::link::{LinkEntryFlow, LinkOutcome};
use crate::config::EditorLayout;
use crate::storage::{Link, Note, NoteDraft, Priority};

bitflags! {
    /// Optional parts of the editor, beyond title and content.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EditorFields: u8 {
        const PRIORITY = 1;
        const LINKS = 1 << 1;
        const OBSCURED = 1 << 2;
    }
}

impl From<EditorLayout> for EditorFields {
    fn from(layout: EditorLayout) -> Self {
        match layout {
            EditorLayout::Minimal => EditorFields::empty(),
            EditorLayout::Extended => EditorFields::all(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusField {
    Title,
    Priority,
    Content,
}

/// Vertical focus order of the editor's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    order: &'static [FocusField],
}

impl FieldLayout {
    pub fn for_fields(fields: EditorFields) -> Self {
        const MINIMAL: &[FocusField] = &[FocusField::Title, FocusField::Content];
        const EXTENDED: &[FocusField] =
            &[FocusField::Title, FocusField::Priority, FocusField::Content];
        let order = if fields.contains(EditorFields::PRIORITY) {
            EXTENDED
        } else {
            MINIMAL
        };
        Self { order }
    }

    pub fn fields(&self) -> &'static [FocusField] {
        self.order
    }

    pub fn first(&self) -> FocusField {
        self.order[0]
    }

    pub fn next(&self, field: FocusField) -> Option<FocusField> {
        let idx = self.order.iter().position(|f| *f == field)?;
        self.order.get(idx + 1).copied()
    }

    pub fn prev(&self, field: FocusField) -> Option<FocusField> {
        let idx = self.order.iter().position(|f| *f == field)?;
        idx.checked_sub(1).map(|prev| self.order[prev])
    }
}

/// Working copy of a note's editable fields.
#[derive(Debug, Clone, Default)]
pub struct EditDraft {
    pub title: TextBuffer,
    pub content: TextBuffer,
    pub priority: Priority,
    pub links: Vec<Link>,
    pub obscured: bool,
}

impl EditDraft {
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: TextBuffer::new(note.title.as_str()),
            content: TextBuffer::new(note.content.as_str()),
            priority: note.priority,
            links: note.links.clone(),
            obscured: note.obscured,
        }
    }

    pub fn to_note_draft(&self) -> NoteDraft {
        NoteDraft {
            title: self.title.text().to_string(),
            content: self.content.text().to_string(),
            priority: self.priority,
            links: self.links.clone(),
            obscured: self.obscured,
        }
    }

    pub fn is_saveable(&self) -> bool {
        !self.title.text().trim().is_empty() && !self.content.text().trim().is_empty()
    }
}

/// A validated draft, ready to be created or to replace `note_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteCommit {
    pub note_id: Option<String>,
    pub draft: NoteDraft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Continue,
    Save(NoteCommit),
    Cancel,
}

/// Editing session for one note. Nothing reaches storage until the caller
/// acts on `SessionOutcome::Save`.
#[derive(Debug, Clone)]
pub struct NoteEditSession {
    note_id: Option<String>,
    draft: EditDraft,
    baseline: NoteDraft,
    fields: EditorFields,
    layout: FieldLayout,
    focus: FocusField,
    link_flow: Option<LinkEntryFlow>,
}

impl NoteEditSession {
    pub fn new_note(fields: EditorFields) -> Self {
        Self::with_draft(None, EditDraft::default(), fields)
    }

    pub fn for_note(note: &Note, fields: EditorFields) -> Self {
        Self::with_draft(Some(note.id.clone()), EditDraft::from_note(note), fields)
    }

    fn with_draft(note_id: Option<String>, draft: EditDraft, fields: EditorFields) -> Self {
        let layout = FieldLayout::for_fields(fields);
        Self {
            note_id,
            baseline: draft.to_note_draft(),
            draft,
            fields,
            focus: layout.first(),
            layout,
            link_flow: None,
        }
    }

    pub fn note_id(&self) -> Option<&str> {
        self.note_id.as_deref()
    }

    pub fn draft(&self) -> &EditDraft {
        &self.draft
    }

    pub fn fields(&self) -> EditorFields {
        self.fields
    }

    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    pub fn focus(&self) -> FocusField {
        self.focus
    }

    pub fn link_flow(&self) -> Option<&LinkEntryFlow> {
        self.link_flow.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.draft.to_note_draft() != self.baseline
    }

    pub fn can_save(&self) -> bool {
        self.draft.is_saveable()
    }

    pub fn commit(&self) -> Option<NoteCommit> {
        self.can_save().then(|| NoteCommit {
            note_id: self.note_id.clone(),
            draft: self.draft.to_note_draft(),
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SessionOutcome {
        if key.code == KeyCode::Esc {
            if self.link_flow.take().is_some() {
                return SessionOutcome::Continue;
            }
            return SessionOutcome::Cancel;
        }

        if let Some(flow) = self.link_flow.as_mut() {
            if let LinkOutcome::Completed(link) = flow.handle_key(key) {
                self.draft.links.push(link);
                self.link_flow = None;
            }
            return SessionOutcome::Continue;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return self.handle_control(key.code);
        }
        if key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER) {
            return SessionOutcome::Continue;
        }

        match self.focus {
            FocusField::Priority => self.handle_priority_key(key.code),
            FocusField::Title | FocusField::Content => self.handle_text_key(key.code),
        }
        SessionOutcome::Continue
    }

    fn handle_control(&mut self, code: KeyCode) -> SessionOutcome {
        match code {
            KeyCode::Char('s') => {
                if let Some(commit) = self.commit() {
                    return SessionOutcome::Save(commit);
                }
            }
            KeyCode::Char('l') if self.fields.contains(EditorFields::LINKS) => {
                self.link_flow = Some(LinkEntryFlow::new());
            }
            KeyCode::Char('x') if self.fields.contains(EditorFields::OBSCURED) => {
                self.draft.obscured = !self.draft.obscured;
            }
            _ => {}
        }
        SessionOutcome::Continue
    }

    fn handle_priority_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left | KeyCode::Char('h') => self.draft.priority = self.draft.priority.prev(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                self.draft.priority = self.draft.priority.next()
            }
            KeyCode::Up => self.focus_prev(),
            KeyCode::Down | KeyCode::Enter => self.focus_next(),
            _ => {}
        }
    }

    fn handle_text_key(&mut self, code: KeyCode) {
        let on_content = self.focus == FocusField::Content;
        match code {
            KeyCode::Tab => {
                if self.fields.contains(EditorFields::PRIORITY) {
                    self.draft.priority = self.draft.priority.next();
                }
            }
            KeyCode::Up => {
                if !on_content || !self.draft.content.move_up() {
                    self.focus_prev();
                }
            }
            KeyCode::Down => {
                if on_content {
                    self.draft.content.move_down();
                } else {
                    self.focus_next();
                }
            }
            KeyCode::Enter => {
                if on_content {
                    self.draft.content.insert_newline();
                } else {
                    self.focus_next();
                }
            }
            code => {
                let buffer = if on_content {
                    &mut self.draft.content
                } else {
                    &mut self.draft.title
                };
                match code {
                    KeyCode::Char(ch) => {
                        buffer.insert_char(ch);
                    }
                    KeyCode::Backspace | KeyCode::Delete => {
                        buffer.backspace();
                    }
                    KeyCode::Left => {
                        buffer.move_left();
                    }
                    KeyCode::Right => {
                        buffer.move_right();
                    }
                    KeyCode::Home => {
                        buffer.move_home();
                    }
                    KeyCode::End => {
                        buffer.move_end();
                    }
                    _ => {}
                }
            }
        }
    }

    fn focus_next(&mut self) {
        if let Some(next) = self.layout.next(self.focus) {
            self.focus = next;
        }
    }

    fn focus_prev(&mut self) {
        if let Some(prev) = self.layout.prev(self.focus) {
            self.focus = prev;
        }
    }
}
