use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rstore_path::StoragePath;

use crate::entry::{FolderContents, FolderEntry};
use crate::error::{ContentConflict, ContentError, ContentResult};
use crate::traits::ContentStore;

/// In-memory content store.
///
/// Intended for tests and embedding. Only documents are stored, keyed by
/// their path; folders are derived from the set of keys sharing a prefix,
/// so they appear and disappear with the documents beneath them.
pub struct InMemoryContentStore {
    documents: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryContentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.read().map(|docs| docs.len()).unwrap_or_default()
    }

    /// Returns `true` if no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> ContentResult<RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.documents
            .read()
            .map_err(|e| ContentError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> ContentResult<RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>>> {
        self.documents
            .write()
            .map_err(|e| ContentError::Unavailable(format!("lock poisoned: {e}")))
    }
}

/// `true` when any document lives beneath `folder` (which ends in `/`).
fn has_descendants(docs: &BTreeMap<String, Vec<u8>>, folder: &str) -> bool {
    docs.range(folder.to_string()..)
        .next()
        .is_some_and(|(key, _)| key.starts_with(folder))
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for InMemoryContentStore {
    fn put(&self, path: &StoragePath, data: &[u8]) -> ContentResult<Vec<String>> {
        let mut docs = self.write()?;

        if path.is_folder() || has_descendants(&docs, &format!("{path}/")) {
            return Err(ContentError::conflict(
                path.as_str(),
                ContentConflict::PathIsFolder,
            ));
        }
        let ancestors = path.ancestor_folders();
        for folder in ancestors {
            if docs.contains_key(folder.trim_end_matches('/')) {
                return Err(ContentError::conflict(
                    folder,
                    ContentConflict::DocumentBlocksFolder,
                ));
            }
        }

        docs.insert(path.to_string(), data.to_vec());
        Ok(ancestors.to_vec())
    }

    fn get(&self, path: &StoragePath) -> ContentResult<Vec<u8>> {
        self.read()?
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| ContentError::NotFound(path.to_string()))
    }

    fn delete(&self, path: &StoragePath) -> ContentResult<Vec<String>> {
        let mut docs = self.write()?;
        if docs.remove(path.as_str()).is_none() {
            return Err(ContentError::NotFound(path.to_string()));
        }

        let mut removed = vec![path.to_string()];
        for folder in path.ancestor_folders().iter().rev() {
            if has_descendants(&docs, folder) {
                break;
            }
            removed.push(folder.clone());
        }
        Ok(removed)
    }

    fn list_folder(&self, path: &StoragePath) -> ContentResult<FolderContents> {
        let mut contents = FolderContents::new();
        if path.is_document() {
            return Ok(contents);
        }

        let prefix = path.as_str();
        let docs = self.read()?;
        for (key, data) in docs
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
        {
            let rest = &key[prefix.len()..];
            match rest.split_once('/') {
                Some((folder, _)) => {
                    contents.insert(format!("{folder}/"), FolderEntry::Folder);
                }
                None => {
                    let size = data.len() as u64;
                    contents.insert(rest.to_string(), FolderEntry::Document { size });
                }
            }
        }
        Ok(contents)
    }

    fn document_exists(&self, path: &StoragePath) -> ContentResult<bool> {
        Ok(self.read()?.contains_key(path.as_str()))
    }

    fn folder_exists(&self, path: &StoragePath) -> ContentResult<bool> {
        Ok(path.is_folder() && has_descendants(&*self.read()?, path.as_str()))
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("document_count", &self.len())
            .finish()
    }
}
