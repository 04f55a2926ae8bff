//! The storage orchestrator.

use std::collections::BTreeMap;

use rstore_ledger::{
    ChangeSet, DocumentMeta, InMemoryVersionLedger, LedgerError, SqliteVersionLedger, Version,
    VersionLedger,
};
use rstore_path::StoragePath;
use rstore_store::{ContentStore, FolderEntry, FsContentStore};
use tracing::{debug, info, warn};

use crate::conditions::Conditions;
use crate::config::StorageConfig;
use crate::error::{ConflictReason, NotModifiedReason, StorageError, StorageResult};
use crate::folder::{FolderDescription, FolderItem};
use crate::locks::{poisoned, UserLocks};

/// Content type reported for documents whose record carries none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A document as returned by [`RemoteStorage::get_document`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub data: Vec<u8>,
    pub content_type: String,
    pub version: Version,
}

/// A folder as returned by [`RemoteStorage::get_folder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderListing {
    /// The folder's own version, absent when the folder does not exist.
    pub version: Option<Version>,
    pub description: FolderDescription,
}

/// Conditional document and folder operations over a content store and a
/// version ledger.
///
/// Mutations for one user run under that user's write lock, in the order
/// precondition check, content mutation, ledger mutation. Reads share the
/// read lock, so they never see content whose version is not yet recorded.
pub struct RemoteStorage<C, L> {
    content: C,
    ledger: L,
    locks: UserLocks,
}

impl RemoteStorage<FsContentStore, Box<dyn VersionLedger>> {
    /// Open the filesystem store and the configured ledger.
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        let content = FsContentStore::open(config.document_root())?;
        let ledger: Box<dyn VersionLedger> = match config.ledger_path() {
            Some(path) => Box::new(SqliteVersionLedger::open(path)?),
            None => Box::new(InMemoryVersionLedger::new()),
        };
        info!(data_dir = %config.data_dir.display(), "remote storage opened");
        Ok(Self::new(content, ledger))
    }
}

impl<C: ContentStore, L: VersionLedger> RemoteStorage<C, L> {
    pub fn new(content: C, ledger: L) -> Self {
        Self {
            content,
            ledger,
            locks: UserLocks::default(),
        }
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Write a document and bump it together with its ancestor folders.
    ///
    /// Fails with `"document already exists"` when `If-None-Match` holds
    /// the wildcard and the document has a version, and with
    /// `"version mismatch"` when `If-Match` does not hold its current
    /// version. Returns the document's new version.
    pub fn put_document(
        &self,
        path: &StoragePath,
        content_type: &str,
        data: &[u8],
        conditions: &Conditions,
    ) -> StorageResult<Version> {
        path.require_document()?;
        let lock = self.locks.for_user(path.user_id())?;
        let _guard = lock.write().map_err(poisoned)?;

        let current = self.ledger.version_of(path.as_str())?;
        if conditions.forbids_existing(current.as_ref()) {
            return Err(StorageError::conflict(
                path.as_str(),
                ConflictReason::AlreadyExists,
            ));
        }
        if conditions.if_match_fails(current.as_ref()) {
            return Err(StorageError::conflict(
                path.as_str(),
                ConflictReason::VersionMismatch,
            ));
        }

        let ancestors = self.content.put(path, data)?;
        let changes = ChangeSet::new()
            .document(path.as_str(), DocumentMeta::new(content_type, data.len() as u64))
            .bump(ancestors);
        let stamp = self
            .ledger
            .apply(&changes)
            .map_err(|source| inconsistent(path, source))?;

        let version = self
            .ledger
            .version_of(path.as_str())
            .map_err(|source| inconsistent(path, source))?
            .ok_or_else(|| StorageError::MissingVersion(path.to_string()))?;
        debug!(path = %path, %version, %stamp, bytes = data.len(), "document stored");
        Ok(version)
    }

    /// Read a document.
    ///
    /// Only `If-None-Match` is consulted: a token equal to the current
    /// version short-circuits with `"document not modified"`.
    pub fn get_document(
        &self,
        path: &StoragePath,
        conditions: &Conditions,
    ) -> StorageResult<Document> {
        path.require_document()?;
        let lock = self.locks.for_user(path.user_id())?;
        let _guard = lock.read().map_err(poisoned)?;

        let record = self.ledger.record(path.as_str())?;
        let current = record.as_ref().map(|r| &r.version);
        if conditions.if_none_match_hits(current) {
            return Err(StorageError::not_modified(
                path.as_str(),
                NotModifiedReason::Document,
            ));
        }

        let data = self.content.get(path)?;
        let Some(record) = record else {
            warn!(path = %path, "document has no version record");
            return Err(StorageError::MissingVersion(path.to_string()));
        };
        let content_type = record
            .meta
            .map(|meta| meta.content_type)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        Ok(Document {
            data,
            content_type,
            version: record.version,
        })
    }

    /// Delete a document, prune the folders it leaves empty, and bump every
    /// surviving ancestor.
    ///
    /// Returns the document path followed by the removed folders, deepest
    /// first. The ledger removals and bumps commit as one change set.
    pub fn delete_document(
        &self,
        path: &StoragePath,
        conditions: &Conditions,
    ) -> StorageResult<Vec<String>> {
        path.require_document()?;
        let lock = self.locks.for_user(path.user_id())?;
        let _guard = lock.write().map_err(poisoned)?;

        let current = self.ledger.version_of(path.as_str())?;
        if conditions.if_match_fails(current.as_ref()) {
            return Err(StorageError::conflict(
                path.as_str(),
                ConflictReason::VersionMismatch,
            ));
        }

        let removed = self.content.delete(path)?;
        let surviving = path
            .ancestor_folders()
            .iter()
            .filter(|folder| !removed.contains(folder));
        let changes = ChangeSet::new()
            .remove(removed.iter().map(String::as_str))
            .bump(surviving.map(String::as_str));
        self.ledger
            .apply(&changes)
            .map_err(|source| inconsistent(path, source))?;

        debug!(path = %path, removed = removed.len(), "document deleted");
        Ok(removed)
    }

    /// List a folder with each child's version and, for documents, content
    /// type and length.
    ///
    /// An absent folder lists as empty. `If-None-Match` holding the current
    /// version short-circuits with `"folder not modified"`.
    pub fn get_folder(
        &self,
        path: &StoragePath,
        conditions: &Conditions,
    ) -> StorageResult<FolderListing> {
        path.require_folder()?;
        let lock = self.locks.for_user(path.user_id())?;
        let _guard = lock.read().map_err(poisoned)?;

        let version = self.ledger.version_of(path.as_str())?;
        if conditions.if_none_match_hits(version.as_ref()) {
            return Err(StorageError::not_modified(
                path.as_str(),
                NotModifiedReason::Folder,
            ));
        }

        let contents = self.content.list_folder(path)?;
        if version.is_none() && !contents.is_empty() {
            warn!(path = %path, "folder has no version record");
            return Err(StorageError::MissingVersion(path.to_string()));
        }

        let mut items = BTreeMap::new();
        for (name, entry) in contents {
            let child = format!("{path}{name}");
            let Some(record) = self.ledger.record(&child)? else {
                warn!(path = %child, "folder entry has no version record");
                return Err(StorageError::MissingVersion(child));
            };
            let etag = record.version.to_string();
            let item = match entry {
                FolderEntry::Document { size } => FolderItem::Document {
                    etag,
                    content_type: record
                        .meta
                        .map(|meta| meta.content_type)
                        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                    content_length: size,
                },
                FolderEntry::Folder => FolderItem::Folder { etag },
            };
            items.insert(name, item);
        }

        Ok(FolderListing {
            version,
            description: FolderDescription::new(items),
        })
    }

    /// Current version of a document or folder.
    pub fn get_version(&self, path: &StoragePath) -> StorageResult<Option<Version>> {
        Ok(self.ledger.version_of(path.as_str())?)
    }
}

fn inconsistent(path: &StoragePath, source: LedgerError) -> StorageError {
    warn!(path = %path, error = %source, "ledger update failed after content change");
    StorageError::Inconsistent {
        path: path.to_string(),
        source,
    }
}

impl<C, L> std::fmt::Debug for RemoteStorage<C, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStorage").finish_non_exhaustive()
    }
}
