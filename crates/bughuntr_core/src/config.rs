//! Filesystem layout of one BugHuntr profile.
//!
//! # Responsibility
//! - Resolve the per-user data directory and the files derived from it.
//!
//! # Invariants
//! - `BUGHUNTR_DATA_DIR`, when set and non-blank, wins over the platform
//!   default (`dirs::data_dir()/bughuntr`).
//! - All derived paths live directly under the data directory.

use std::path::PathBuf;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "BUGHUNTR_DATA_DIR";
/// Environment variable overriding the log level.
pub const LOG_LEVEL_ENV: &str = "BUGHUNTR_LOG_LEVEL";

const APP_DIR_NAME: &str = "bughuntr";
const DB_FILE_NAME: &str = "bughuntr.db";
const LEGACY_FILE_NAME: &str = "config.json";
const LOG_DIR_NAME: &str = "logs";

/// Resolved profile paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    /// Relational store file.
    pub db_path: PathBuf,
    /// Legacy flat JSON document, read only by migration.
    pub legacy_path: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    /// Builds the layout below an explicit data directory.
    pub fn from_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            legacy_path: data_dir.join(LEGACY_FILE_NAME),
            log_dir: data_dir.join(LOG_DIR_NAME),
            data_dir,
        }
    }

    /// Resolves the layout from the environment override or the platform
    /// data directory.
    ///
    /// Returns `None` when neither is available.
    pub fn resolve() -> Option<Self> {
        resolve_data_dir(std::env::var(DATA_DIR_ENV).ok().as_deref(), dirs::data_dir())
            .map(Self::from_data_dir)
    }
}

/// Log level from `BUGHUNTR_LOG_LEVEL`, or the build-mode default.
pub fn configured_log_level() -> String {
    std::env::var(LOG_LEVEL_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| crate::logging::default_log_level().to_string())
}

fn resolve_data_dir(env_value: Option<&str>, platform_dir: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(raw) = env_value {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    platform_dir.map(|dir| dir.join(APP_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::{resolve_data_dir, AppPaths};
    use std::path::PathBuf;

    #[test]
    fn env_override_wins_over_platform_dir() {
        let resolved = resolve_data_dir(Some(" /tmp/bh "), Some(PathBuf::from("/home/u/.local")));
        assert_eq!(resolved, Some(PathBuf::from("/tmp/bh")));
    }

    #[test]
    fn blank_override_falls_back_to_platform_dir() {
        let resolved = resolve_data_dir(Some("  "), Some(PathBuf::from("/home/u/.local")));
        assert_eq!(resolved, Some(PathBuf::from("/home/u/.local/bughuntr")));
        assert_eq!(resolve_data_dir(None, None), None);
    }

    #[test]
    fn derived_paths_share_the_data_dir() {
        let paths = AppPaths::from_data_dir("/srv/profile");
        assert_eq!(paths.db_path, PathBuf::from("/srv/profile/bughuntr.db"));
        assert_eq!(paths.legacy_path, PathBuf::from("/srv/profile/config.json"));
        assert_eq!(paths.log_dir, PathBuf::from("/srv/profile/logs"));
    }
}
