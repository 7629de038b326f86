//! Note domain model.
//!
//! # Invariants
//! - `title` is never blank for a persisted note; blank input becomes
//!   `UNTITLED_NOTE_TITLE`.
//! - `tags` is derived from the `note_tags` relation and sorted by name.

use crate::model::non_blank;
use crate::model::project::ProjectId;
use crate::model::timestamp::{self, EpochMillis};
use serde::{Deserialize, Deserializer, Serialize};

/// Title assigned to notes saved without one.
pub const UNTITLED_NOTE_TITLE: &str = "Untitled Note";

/// Stable note identifier (UUID text when engine-generated).
pub type NoteId = String;

/// Persisted note with its resolved tag names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub project_id: Option<ProjectId>,
    #[serde(with = "timestamp::rfc3339")]
    pub created_at: EpochMillis,
    #[serde(with = "timestamp::rfc3339")]
    pub updated_at: EpochMillis,
    pub tags: Vec<String>,
}

/// Write payload for `Store::save_note`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    #[serde(default)]
    pub id: Option<NoteId>,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    /// Free-text tag strings; trimmed and de-duplicated on save.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the caller-supplied id, treating blank values as absent.
    pub fn existing_id(&self) -> Option<String> {
        non_blank(self.id.as_deref())
    }

    /// Title to persist, defaulted when blank.
    pub fn effective_title(&self) -> String {
        effective_title(Some(self.title.as_str()))
    }

    pub fn effective_project_id(&self) -> Option<ProjectId> {
        non_blank(self.project_id.as_deref())
    }
}

/// Applies the untitled-note default to an optional title.
pub fn effective_title(title: Option<&str>) -> String {
    non_blank(title).unwrap_or_else(|| UNTITLED_NOTE_TITLE.to_string())
}

/// Deserializes `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{NoteDraft, UNTITLED_NOTE_TITLE};

    #[test]
    fn blank_title_defaults_to_untitled() {
        let draft = NoteDraft::new("  ", "body");
        assert_eq!(draft.effective_title(), UNTITLED_NOTE_TITLE);
    }

    #[test]
    fn null_tags_and_content_deserialize_as_empty() {
        let draft: NoteDraft =
            serde_json::from_str(r#"{"title":"Recon","content":null,"tags":null}"#).unwrap();
        assert!(draft.tags.is_empty());
        assert!(draft.content.is_empty());
        assert_eq!(draft.existing_id(), None);
    }
}
