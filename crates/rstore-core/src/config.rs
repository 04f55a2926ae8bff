//! Storage configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! data_dir = "/var/lib/rstore"
//!
//! [ledger]
//! backend = "sqlite"
//! path = "/var/lib/rstore/metadata.sqlite"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

const DOCUMENTS_DIR: &str = "documents";
const LEDGER_FILE: &str = "metadata.sqlite";

/// Top-level storage configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding documents and, by default, the ledger database.
    pub data_dir: PathBuf,
    pub ledger: LedgerConfig,
}

/// Which version ledger backend to use.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum LedgerConfig {
    /// SQLite database; `path` defaults to `<data_dir>/metadata.sqlite`.
    Sqlite {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
    },
    /// Volatile in-process ledger.
    Memory,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::Sqlite { path: None }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            ledger: LedgerConfig::default(),
        }
    }
}

impl StorageConfig {
    /// Configuration rooted at `data_dir` with default backends.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(s: &str) -> StorageResult<Self> {
        toml::from_str(s).map_err(|e| StorageError::Config(e.to_string()))
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| StorageError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> StorageResult<String> {
        toml::to_string(self).map_err(|e| StorageError::Config(e.to_string()))
    }

    /// Root directory of the filesystem content store.
    pub fn document_root(&self) -> PathBuf {
        self.data_dir.join(DOCUMENTS_DIR)
    }

    /// Location of the SQLite ledger, or `None` for the memory backend.
    pub fn ledger_path(&self) -> Option<PathBuf> {
        match &self.ledger {
            LedgerConfig::Sqlite { path: Some(path) } => Some(path.clone()),
            LedgerConfig::Sqlite { path: None } => Some(self.data_dir.join(LEDGER_FILE)),
            LedgerConfig::Memory => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config = StorageConfig::from_toml_str("").unwrap();
        assert_eq!(config, StorageConfig::default());
        assert_eq!(config.document_root(), PathBuf::from("data/documents"));
        assert_eq!(config.ledger_path(), Some(PathBuf::from("data/metadata.sqlite")));
    }

    #[test]
    fn explicit_sqlite_path() {
        let config = StorageConfig::from_toml_str(
            r#"
            data_dir = "/srv/rstore"

            [ledger]
            backend = "sqlite"
            path = "/var/db/versions.sqlite"
            "#,
        )
        .unwrap();
        assert_eq!(config.document_root(), PathBuf::from("/srv/rstore/documents"));
        assert_eq!(config.ledger_path(), Some(PathBuf::from("/var/db/versions.sqlite")));
    }

    #[test]
    fn memory_backend() {
        let config = StorageConfig::from_toml_str("[ledger]\nbackend = \"memory\"\n").unwrap();
        assert_eq!(config.ledger, LedgerConfig::Memory);
        assert_eq!(config.ledger_path(), None);
    }

    #[test]
    fn rejects_unknown_backend() {
        let err = StorageConfig::from_toml_str("[ledger]\nbackend = \"redis\"\n").unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("rstore.toml");
        let config = StorageConfig::with_data_dir(dir.path());
        std::fs::write(&file, config.to_toml_string().unwrap()).unwrap();

        assert_eq!(StorageConfig::load(&file).unwrap(), config);
        assert!(matches!(
            StorageConfig::load(dir.path().join("missing.toml")),
            Err(StorageError::Config(_))
        ));
    }
}
