//! Template domain model. Templates have no relations to other entities.

use crate::model::non_blank;
use crate::model::timestamp::now_epoch_ms;
use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned to templates saved without one.
pub const DEFAULT_TEMPLATE_CATEGORY: &str = "general";

/// Persisted template row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub category: String,
    pub content: String,
}

/// Write payload for `Store::save_template`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl TemplateDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyTemplateName);
        }
        Ok(())
    }

    /// Resolves defaults and returns the row to persist.
    pub fn into_template(self) -> Template {
        Template {
            id: non_blank(self.id.as_deref()).unwrap_or_else(generate_template_id),
            name: self.name.trim().to_string(),
            category: effective_category(self.category.as_deref()),
            content: self.content,
        }
    }
}

/// Applies the default category to an optional label.
pub fn effective_category(category: Option<&str>) -> String {
    non_blank(category).unwrap_or_else(|| DEFAULT_TEMPLATE_CATEGORY.to_string())
}

/// Generates a time-derived template id (`<epoch-ms>-<suffix>`).
///
/// The random suffix disambiguates templates created within the same
/// millisecond (bulk import).
pub fn generate_template_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", now_epoch_ms(), &suffix[..8])
}
