//! Project domain model.
//!
//! # Invariants
//! - `id` is immutable once assigned.
//! - `name` is never blank for a persisted project.
//! - `created_at` is stamped once; `updated_at` on every save.

use crate::model::non_blank;
use crate::model::timestamp::{self, EpochMillis};
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};

/// Stable project identifier (UUID text when engine-generated).
pub type ProjectId = String;

/// Persisted project row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub url: Option<String>,
    pub scope: Option<String>,
    #[serde(with = "timestamp::rfc3339")]
    pub created_at: EpochMillis,
    #[serde(with = "timestamp::rfc3339")]
    pub updated_at: EpochMillis,
}

/// Write payload for `Store::save_project`.
///
/// A blank or absent `id` creates a new project; otherwise the row with that
/// id is upserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    #[serde(default)]
    pub id: Option<ProjectId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns the caller-supplied id, treating blank values as absent.
    pub fn existing_id(&self) -> Option<String> {
        non_blank(self.id.as_deref())
    }

    /// Rejects payloads without a usable name.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }
        Ok(())
    }
}
