//! Payload validation performed before any storage access.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller payload is missing a required field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Project `name` is empty or whitespace-only.
    EmptyProjectName,
    /// Template `name` is empty or whitespace-only.
    EmptyTemplateName,
    /// One record of an import payload failed validation.
    ImportRecord {
        collection: &'static str,
        index: usize,
        reason: Box<ValidationError>,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyProjectName => write!(f, "project name cannot be empty"),
            Self::EmptyTemplateName => write!(f, "template name cannot be empty"),
            Self::ImportRecord {
                collection,
                index,
                reason,
            } => write!(f, "{collection}[{index}]: {reason}"),
        }
    }
}

impl Error for ValidationError {}
