//! On-disk layout of the notes file and the migrations applied when older
//! layouts are read.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DefaultOnError, DefaultOnNull};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use time::OffsetDateTime;

use crate::config::themes::{ThemePalette, ThemeRegistry, DEFAULT_THEME};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl Priority {
    /// Sort rank: high sorts first when ascending.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::None => 4,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Priority::High => Priority::Medium,
            Priority::Medium => Priority::Low,
            Priority::Low => Priority::None,
            Priority::None => Priority::High,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Priority::High => Priority::None,
            Priority::Medium => Priority::High,
            Priority::Low => Priority::Medium,
            Priority::None => Priority::Low,
        }
    }

    /// Single-character badge shown in the list.
    pub fn badge(self) -> &'static str {
        match self {
            Priority::High => "1",
            Priority::Medium => "2",
            Priority::Low => "3",
            Priority::None => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
    pub title: String,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Blank, `null` or unrecognised values read as `none`.
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub priority: Priority,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub obscured: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub theme: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

fn default_themes() -> IndexMap<String, ThemePalette> {
    ThemeRegistry::default().into_palettes()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub config: StoreConfig,
    #[serde(default = "default_themes")]
    pub themes: IndexMap<String, ThemePalette>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            config: StoreConfig::default(),
            themes: default_themes(),
            notes: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Migrated {
    pub document: StoreDocument,
    /// True when the raw value was in an older layout and should be rewritten.
    pub changed: bool,
}

/// Bring any supported layout up to the current `StoreDocument`.
pub fn migrate(raw: Value) -> Result<Migrated, serde_json::Error> {
    match raw {
        Value::Array(notes) => {
            let notes = serde_json::from_value(Value::Array(notes))?;
            Ok(Migrated {
                document: StoreDocument {
                    notes,
                    ..StoreDocument::default()
                },
                changed: true,
            })
        }
        Value::Object(mut root) => {
            let mut changed = !root.get("config").is_some_and(Value::is_object)
                || !root.get("themes").is_some_and(Value::is_object);
            match root.get("notes") {
                Some(Value::Array(notes)) => {
                    changed |= notes.iter().any(note_needs_migration);
                }
                _ => {
                    root.insert("notes".to_string(), Value::Array(Vec::new()));
                    changed = true;
                }
            }
            for key in ["config", "themes"] {
                if !root.get(key).is_some_and(Value::is_object) {
                    root.remove(key);
                }
            }
            let document = serde_json::from_value(Value::Object(root))?;
            Ok(Migrated { document, changed })
        }
        other => Err(serde::de::Error::custom(format!(
            "expected an object or array at the root of the notes file, found {other}"
        ))),
    }
}

fn note_needs_migration(note: &Value) -> bool {
    !note.get("links").is_some_and(Value::is_array)
        || !note.get("obscured").is_some_and(Value::is_boolean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy_note(id: &str) -> Value {
        json!({
            "id": id,
            "title": "Legacy",
            "content": "from an older release",
            "priority": "low",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "updatedAt": "2024-03-01T10:00:00.000Z"
        })
    }

    #[test]
    fn bare_array_becomes_document() -> anyhow::Result<()> {
        let migrated = migrate(json!([legacy_note("1709287200000")]))?;
        assert!(migrated.changed);
        let doc = migrated.document;
        assert_eq!(doc.config.theme, DEFAULT_THEME);
        assert!(doc.themes.contains_key("gruvbox"));
        assert_eq!(doc.notes.len(), 1);
        assert_eq!(doc.notes[0].priority, Priority::Low);
        assert!(doc.notes[0].links.is_empty());
        assert!(!doc.notes[0].obscured);
        Ok(())
    }

    #[test]
    fn missing_note_fields_are_filled_and_flagged() -> anyhow::Result<()> {
        let raw = json!({
            "config": { "theme": "nord" },
            "themes": {},
            "notes": [legacy_note("a")]
        });
        let migrated = migrate(raw)?;
        assert!(migrated.changed);
        assert_eq!(migrated.document.config.theme, "nord");
        assert!(migrated.document.themes.is_empty());
        Ok(())
    }

    #[test]
    fn current_layout_is_left_alone() -> anyhow::Result<()> {
        let mut note = legacy_note("b");
        note["links"] = json!([{ "url": "https://example.com", "title": "Example" }]);
        note["obscured"] = json!(true);
        note["priority"] = Value::Null;
        let raw = json!({ "config": { "theme": "default" }, "themes": {}, "notes": [note] });
        let migrated = migrate(raw)?;
        assert!(!migrated.changed);
        let note = &migrated.document.notes[0];
        assert_eq!(note.priority, Priority::None);
        assert_eq!(note.links[0].title, "Example");
        assert!(note.obscured);
        Ok(())
    }

    #[test]
    fn blank_priority_reads_as_none() -> anyhow::Result<()> {
        let mut blank = legacy_note("blank");
        blank["priority"] = json!("");
        let mut bogus = legacy_note("bogus");
        bogus["priority"] = json!(0);
        let migrated = migrate(json!({ "notes": [blank, bogus, legacy_note("kept")] }))?;
        let priorities: Vec<_> = migrated
            .document
            .notes
            .iter()
            .map(|note| note.priority)
            .collect();
        assert_eq!(priorities, [Priority::None, Priority::None, Priority::Low]);
        Ok(())
    }

    #[test]
    fn scalar_root_is_rejected() {
        assert!(migrate(json!("notes")).is_err());
    }

    #[test]
    fn priority_cycles_back_after_four_steps() {
        use strum::IntoEnumIterator;
        for priority in Priority::iter() {
            assert_eq!(priority.next().next().next().next(), priority);
            assert_eq!(priority.next().prev(), priority);
        }
        assert_eq!(Priority::High.to_string(), "high");
        assert_eq!("medium".parse::<Priority>().ok(), Some(Priority::Medium));
    }
}
