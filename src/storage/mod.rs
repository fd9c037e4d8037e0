use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::themes::{ThemePalette, ThemeRegistry};
use crate::config::StorageOptions;

pub mod schema;

pub use schema::{Link, Note, Priority, StoreDocument};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("note {0} not found")]
    NotFound(String),
    #[error("{action} {path}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing notes file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serializing notes")]
    Serialize(#[source] serde_json::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Fields for a brand-new note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub priority: Priority,
    pub links: Vec<Link>,
    pub obscured: bool,
}

/// Replacement fields for an existing note; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: String,
    pub content: String,
    pub priority: Option<Priority>,
    pub links: Option<Vec<Link>>,
    pub obscured: Option<bool>,
}

impl NoteUpdate {
    /// Keeps title and content as they are and changes nothing else.
    pub fn from_note(note: &Note) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            ..Self::default()
        }
    }
}

/// JSON file store. Every mutation rereads the file and rewrites it whole.
#[derive(Clone)]
pub struct StorageHandle {
    data_file: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn load_all(&self) -> StorageResult<Vec<Note>> {
        Ok(self.read_document()?.notes)
    }

    pub fn get_by_id(&self, id: &str) -> StorageResult<Option<Note>> {
        Ok(self
            .read_document()?
            .notes
            .into_iter()
            .find(|note| note.id == id))
    }

    pub fn create(&self, draft: NoteDraft) -> StorageResult<Note> {
        let mut doc = self.read_document()?;
        let now = OffsetDateTime::now_utc();
        let note = Note {
            id: Uuid::new_v4().to_string(),
            title: draft.title.trim().to_string(),
            content: draft.content.trim().to_string(),
            priority: draft.priority,
            links: draft.links,
            obscured: draft.obscured,
            created_at: now,
            updated_at: now,
        };
        doc.notes.push(note.clone());
        self.write_document(&doc)?;
        tracing::debug!(note_id = %note.id, "created note");
        Ok(note)
    }

    pub fn update(&self, id: &str, update: NoteUpdate) -> StorageResult<Note> {
        let mut doc = self.read_document()?;
        let note = doc
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        note.title = update.title.trim().to_string();
        note.content = update.content.trim().to_string();
        if let Some(priority) = update.priority {
            note.priority = priority;
        }
        if let Some(links) = update.links {
            note.links = links;
        }
        if let Some(obscured) = update.obscured {
            note.obscured = obscured;
        }
        note.updated_at = OffsetDateTime::now_utc();
        let updated = note.clone();
        self.write_document(&doc)?;
        tracing::debug!(note_id = %id, "updated note");
        Ok(updated)
    }

    /// Returns false when no note had `id`; the file is not rewritten then.
    pub fn delete(&self, id: &str) -> StorageResult<bool> {
        let mut doc = self.read_document()?;
        let before = doc.notes.len();
        doc.notes.retain(|note| note.id != id);
        if doc.notes.len() == before {
            return Ok(false);
        }
        self.write_document(&doc)?;
        tracing::debug!(note_id = %id, "deleted note");
        Ok(true)
    }

    /// Active theme name and its palette.
    pub fn load_theme(&self) -> StorageResult<(String, ThemePalette)> {
        let doc = self.read_document()?;
        let registry = ThemeRegistry::new(doc.themes);
        let palette = registry.resolve(&doc.config.theme);
        Ok((doc.config.theme, palette))
    }

    fn read_document(&self) -> StorageResult<StoreDocument> {
        let path = self.data_file.as_path();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let doc = StoreDocument::default();
                self.write_document(&doc)?;
                tracing::info!(path = %path.display(), "created notes file");
                return Ok(doc);
            }
            Err(source) => {
                return Err(StorageError::Io {
                    action: "reading notes file",
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let parse_err = |source| StorageError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let value = serde_json::from_str(&raw).map_err(parse_err)?;
        let migrated = schema::migrate(value).map_err(parse_err)?;
        if migrated.changed {
            tracing::info!(path = %path.display(), "migrating notes file to current layout");
            self.write_document(&migrated.document)?;
        }
        Ok(migrated.document)
    }

    fn write_document(&self, doc: &StoreDocument) -> StorageResult<()> {
        let json = if self.options.pretty {
            serde_json::to_string_pretty(doc)
        } else {
            serde_json::to_string(doc)
        }
        .map_err(StorageError::Serialize)?;
        write_atomic(&self.data_file, json.as_bytes())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let mut tmp_name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("notes"));
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, bytes).map_err(|source| StorageError::Io {
        action: "writing temporary notes file",
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| StorageError::Io {
        action: "replacing notes file",
        path: path.to_path_buf(),
        source,
    })
}

pub fn init(storage: &StorageOptions) -> anyhow::Result<StorageHandle> {
    let data_file = &storage.data_file;
    if let Some(parent) = data_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let handle = StorageHandle {
        data_file: Arc::new(data_file.clone()),
        options: Arc::new(storage.clone()),
    };
    let notes = handle
        .load_all()
        .with_context(|| format!("opening notes file {}", data_file.display()))?;
    tracing::info!(path = %data_file.display(), notes = notes.len(), "storage ready");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    fn init_storage() -> anyhow::Result<(TempDir, StorageHandle)> {
        let temp = TempDir::new()?;
        let options = StorageOptions {
            data_file: temp.path().join("notes.json"),
            ..StorageOptions::default()
        };
        let storage = init(&options)?;
        Ok((temp, storage))
    }

    fn groceries() -> NoteDraft {
        NoteDraft {
            title: "Groceries".to_string(),
            content: "Milk, eggs".to_string(),
            priority: Priority::High,
            ..NoteDraft::default()
        }
    }

    #[test]
    fn init_writes_default_document() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let raw = fs::read_to_string(storage.data_file())?;
        let doc: StoreDocument = serde_json::from_str(&raw)?;
        assert_eq!(doc, StoreDocument::default());
        let (theme, palette) = storage.load_theme()?;
        assert_eq!(theme, "default");
        assert_eq!(palette.primary, "#6ee7b7");
        Ok(())
    }

    #[test]
    fn create_fills_defaults_and_timestamps() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let note = storage.create(groceries())?;
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "Milk, eggs");
        assert_eq!(note.priority, Priority::High);
        assert!(!note.obscured);
        assert!(note.links.is_empty());
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(storage.load_all()?, vec![note]);
        Ok(())
    }

    #[test]
    fn create_trims_text_fields() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let note = storage.create(NoteDraft {
            title: "  padded \n".to_string(),
            content: "\tbody  ".to_string(),
            ..NoteDraft::default()
        })?;
        assert_eq!(note.title, "padded");
        assert_eq!(note.content, "body");
        Ok(())
    }

    #[test]
    fn update_leaves_unset_fields_alone() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let created = storage.create(NoteDraft {
            obscured: true,
            ..groceries()
        })?;
        let updated = storage.update(
            &created.id,
            NoteUpdate {
                title: "Groceries ".to_string(),
                content: "Milk, eggs, bread".to_string(),
                priority: Some(Priority::Low),
                ..NoteUpdate::default()
            },
        )?;
        assert_eq!(updated.title, "Groceries");
        assert_eq!(updated.content, "Milk, eggs, bread");
        assert_eq!(updated.priority, Priority::Low);
        assert!(updated.obscured);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(storage.get_by_id(&created.id)?, Some(updated));
        Ok(())
    }

    #[test]
    fn update_missing_note_reports_not_found() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let err = storage
            .update("missing", NoteUpdate::default())
            .expect_err("no such note");
        assert_matches!(err, StorageError::NotFound(id) if id == "missing");
        Ok(())
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        let keep = storage.create(groceries())?;
        let gone = storage.create(groceries())?;
        assert!(!storage.delete("nope")?);
        assert_eq!(storage.load_all()?.len(), 2);
        assert!(storage.delete(&gone.id)?);
        assert_eq!(storage.load_all()?, vec![keep]);
        assert_eq!(storage.get_by_id(&gone.id)?, None);
        Ok(())
    }

    #[test]
    fn legacy_array_file_is_migrated_on_open() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let data_file = temp.path().join("legacy.json");
        fs::write(
            &data_file,
            r#"[{"id":"1700000000000","title":"Old","content":"note","priority":"",
                "createdAt":"2023-11-14T22:13:20.000Z","updatedAt":"2023-11-14T22:13:20.000Z"}]"#,
        )?;
        let storage = init(&StorageOptions {
            data_file: data_file.clone(),
            ..StorageOptions::default()
        })?;
        let notes = storage.load_all()?;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "1700000000000");
        assert_eq!(notes[0].priority, Priority::None);

        let rewritten: serde_json::Value = serde_json::from_str(&fs::read_to_string(&data_file)?)?;
        assert!(rewritten["themes"]["dracula"].is_object());
        assert_eq!(rewritten["notes"][0]["links"], serde_json::json!([]));
        assert_eq!(rewritten["notes"][0]["obscured"], serde_json::json!(false));
        Ok(())
    }

    #[test]
    fn corrupt_file_is_reported_not_overwritten() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        fs::write(storage.data_file(), "{ not json")?;
        assert_matches!(storage.load_all(), Err(StorageError::Parse { .. }));
        assert_eq!(fs::read_to_string(storage.data_file())?, "{ not json");
        Ok(())
    }

    #[test]
    fn writes_leave_no_temporary_file_behind() -> anyhow::Result<()> {
        let (temp, storage) = init_storage()?;
        storage.create(groceries())?;
        let leftovers: Vec<_> = fs::read_dir(temp.path())?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }
}
