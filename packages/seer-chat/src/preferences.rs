//! Local preferences and the startup environment check.
//!
//! The chat only runs when this small file can be read (or created). Any
//! other failure disables the client instead of crashing it.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why the preferences file could not be used.
#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not valid preferences: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Persisted per-machine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Stable identity used as this client's outbox key
    pub participant_id: String,
}

/// Outcome of the startup check.
#[derive(Debug)]
pub enum Environment {
    Supported(Preferences),
    Unsupported(PreferencesError),
}

impl Preferences {
    /// Fresh preferences with a random identity.
    pub fn generate() -> Self {
        Self {
            participant_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// `preferences.json` in the platform data directory.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "seer", "seer-chat")
            .map(|dirs| dirs.data_dir().join("preferences.json"))
            .unwrap_or_else(|| PathBuf::from("seer-preferences.json"))
    }

    /// Read preferences, creating them on first run.
    pub fn load_or_create(path: &Path) -> Result<Self, PreferencesError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| PreferencesError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let preferences = Self::generate();
                preferences.save(path)?;
                tracing::info!(
                    "Created participant identity {} at {}",
                    preferences.participant_id,
                    path.display()
                );
                Ok(preferences)
            }
            Err(source) => Err(PreferencesError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PreferencesError> {
        let write_err = |source| PreferencesError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|source| PreferencesError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, raw).map_err(write_err)
    }
}

impl Environment {
    /// Run the startup check against `path`.
    pub fn check(path: &Path) -> Self {
        match Preferences::load_or_create(path) {
            Ok(preferences) => Environment::Supported(preferences),
            Err(e) => {
                tracing::warn!("Unsupported environment: {}", e);
                Environment::Unsupported(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_first_run_creates_identity() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data/preferences.json");

        let Environment::Supported(first) = Environment::check(&path) else {
            panic!("expected a supported environment");
        };
        assert!(path.exists());
        assert!(uuid::Uuid::parse_str(&first.participant_id).is_ok());

        let Environment::Supported(second) = Environment::check(&path) else {
            panic!("expected a supported environment");
        };
        assert_eq!(first, second);
    }

    #[test]
    fn test_corrupt_file_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            Environment::check(&path),
            Environment::Unsupported(PreferencesError::Parse { .. })
        ));
    }

    #[test]
    fn test_unreadable_path_is_unsupported() {
        let dir = tempdir().unwrap();

        // A directory where the file should be cannot be read as text.
        assert!(matches!(
            Environment::check(dir.path()),
            Environment::Unsupported(PreferencesError::Read { .. })
        ));
    }
}
