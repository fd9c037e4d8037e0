use anyhow::{Context, Result};

use crate::app::session::NoteCommit;
use crate::storage::{Note, NoteUpdate, Priority, StorageError, StorageHandle, StorageResult};

/// Storage side of every mutating command.
pub struct ActionDispatcher<'a> {
    storage: &'a StorageHandle,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(storage: &'a StorageHandle) -> Self {
        Self { storage }
    }

    /// Update when the commit names a note, create otherwise.
    pub fn save(&self, commit: NoteCommit) -> StorageResult<Note> {
        let NoteCommit { note_id, draft } = commit;
        match note_id {
            Some(id) => self.storage.update(
                &id,
                NoteUpdate {
                    title: draft.title,
                    content: draft.content,
                    priority: Some(draft.priority),
                    links: Some(draft.links),
                    obscured: Some(draft.obscured),
                },
            ),
            None => self.storage.create(draft),
        }
    }

    pub fn persist(&self, note_id: &str, update: NoteUpdate) -> StorageResult<Note> {
        self.storage.update(note_id, update)
    }

    pub fn set_priority(&self, note_id: &str, priority: Priority) -> StorageResult<Note> {
        let note = self.fetch(note_id)?;
        self.storage.update(
            note_id,
            NoteUpdate {
                priority: Some(priority),
                ..NoteUpdate::from_note(&note)
            },
        )
    }

    pub fn toggle_obscured(&self, note_id: &str) -> StorageResult<Note> {
        let note = self.fetch(note_id)?;
        self.storage.update(
            note_id,
            NoteUpdate {
                obscured: Some(!note.obscured),
                ..NoteUpdate::from_note(&note)
            },
        )
    }

    pub fn delete(&self, note_id: &str) -> StorageResult<bool> {
        self.storage.delete(note_id)
    }

    fn fetch(&self, note_id: &str) -> StorageResult<Note> {
        self.storage
            .get_by_id(note_id)?
            .ok_or_else(|| StorageError::NotFound(note_id.to_string()))
    }
}

/// Hands a URL to the desktop. Returns once the request is issued.
pub trait UrlOpener {
    fn open_url(&self, url: &str) -> Result<()>;
}

/// Opens links with the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    fn open_url(&self, url: &str) -> Result<()> {
        open::that_detached(url).with_context(|| format!("launching browser for {url}"))
    }
}
