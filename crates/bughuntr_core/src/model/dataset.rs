//! Whole-dataset payloads for import, export and legacy migration.
//!
//! # Invariants
//! - Every field except names is optional on input; defaults are resolved by
//!   the import gateway, not by callers.
//! - Exported datasets re-import to the same rows.

use crate::model::note::{null_as_default, Note};
use crate::model::project::Project;
use crate::model::template::Template;
use crate::model::timestamp::{self, EpochMillis};
use serde::{Deserialize, Serialize};

/// Complete dataset in the `{projects, notes, templates}` document shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub projects: Vec<ImportedProject>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: Vec<ImportedNote>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub templates: Vec<ImportedTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedProject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default, with = "timestamp::rfc3339_option")]
    pub created_at: Option<EpochMillis>,
    #[serde(default, with = "timestamp::rfc3339_option")]
    pub updated_at: Option<EpochMillis>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedNote {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, with = "timestamp::rfc3339_option")]
    pub created_at: Option<EpochMillis>,
    #[serde(default, with = "timestamp::rfc3339_option")]
    pub updated_at: Option<EpochMillis>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedTemplate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

/// Row counts written by one `bulk_replace` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub projects: usize,
    pub notes: usize,
    pub tags: usize,
    pub note_tags: usize,
    pub templates: usize,
    /// Notes whose `projectId` named no imported project and were detached.
    pub detached_notes: usize,
}

impl From<Project> for ImportedProject {
    fn from(value: Project) -> Self {
        Self {
            id: Some(value.id),
            name: value.name,
            url: value.url,
            scope: value.scope,
            created_at: Some(value.created_at),
            updated_at: Some(value.updated_at),
        }
    }
}

impl From<Note> for ImportedNote {
    fn from(value: Note) -> Self {
        Self {
            id: Some(value.id),
            title: Some(value.title),
            content: Some(value.content),
            project_id: value.project_id,
            tags: value.tags,
            created_at: Some(value.created_at),
            updated_at: Some(value.updated_at),
        }
    }
}

impl From<Template> for ImportedTemplate {
    fn from(value: Template) -> Self {
        Self {
            id: Some(value.id),
            name: value.name,
            category: Some(value.category),
            content: value.content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DataSet;

    #[test]
    fn legacy_shaped_document_parses_with_iso_timestamps() {
        let raw = r#"{
            "projects": [{"id": "p1", "name": "Acme", "url": null,
                          "createdAt": "2023-05-01T10:00:00.000Z",
                          "updatedAt": "2023-05-02T10:00:00.000Z"}],
            "notes": [{"id": "n1", "title": "Recon", "content": null,
                       "projectId": "p1", "tags": ["web", "recon"],
                       "updatedAt": 1683021600000}],
            "theme": "dark"
        }"#;
        let data: DataSet = serde_json::from_str(raw).unwrap();
        assert_eq!(data.projects.len(), 1);
        assert_eq!(data.projects[0].created_at, Some(1_682_935_200_000));
        assert_eq!(data.notes[0].updated_at, Some(1_683_021_600_000));
        assert_eq!(data.notes[0].created_at, None);
        assert_eq!(data.notes[0].tags, vec!["web", "recon"]);
        assert!(data.templates.is_empty());
    }
}
