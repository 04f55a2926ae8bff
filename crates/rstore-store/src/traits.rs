use rstore_path::StoragePath;

use crate::entry::FolderContents;
use crate::error::ContentResult;

/// Hierarchical document storage.
///
/// All implementations must satisfy these invariants:
/// - No path prefix is simultaneously a document and a folder.
/// - Folders exist exactly while at least one document lives beneath them.
/// - Folder creation is idempotent and tolerates concurrent creators.
/// - All I/O errors are propagated, never silently ignored.
pub trait ContentStore: Send + Sync {
    /// Write `data` at a document path, creating any missing ancestor
    /// folders first.
    ///
    /// Returns the path's full ancestor folder chain, whether or not the
    /// folders already existed. Fails with a conflict, before mutating
    /// anything, if the leaf is a folder or an ancestor is a document.
    fn put(&self, path: &StoragePath, data: &[u8]) -> ContentResult<Vec<String>>;

    /// Read the document at `path`.
    ///
    /// Fails with `NotFound` if no document exists there, including when
    /// the path names a folder.
    fn get(&self, path: &StoragePath) -> ContentResult<Vec<u8>>;

    /// Delete the document at `path` and prune the folders it leaves empty.
    ///
    /// Returns the deleted document path followed by every removed folder,
    /// deepest first.
    fn delete(&self, path: &StoragePath) -> ContentResult<Vec<String>>;

    /// List the direct children of a folder.
    ///
    /// An absent folder is indistinguishable from an empty one.
    fn list_folder(&self, path: &StoragePath) -> ContentResult<FolderContents>;

    /// Check whether a document exists at `path`.
    fn document_exists(&self, path: &StoragePath) -> ContentResult<bool>;

    /// Check whether the folder at `path` currently exists.
    fn folder_exists(&self, path: &StoragePath) -> ContentResult<bool> {
        Ok(!self.list_folder(path)?.is_empty())
    }
}

impl<S: ContentStore + ?Sized> ContentStore for std::sync::Arc<S> {
    fn put(&self, path: &StoragePath, data: &[u8]) -> ContentResult<Vec<String>> {
        (**self).put(path, data)
    }

    fn get(&self, path: &StoragePath) -> ContentResult<Vec<u8>> {
        (**self).get(path)
    }

    fn delete(&self, path: &StoragePath) -> ContentResult<Vec<String>> {
        (**self).delete(path)
    }

    fn list_folder(&self, path: &StoragePath) -> ContentResult<FolderContents> {
        (**self).list_folder(path)
    }

    fn document_exists(&self, path: &StoragePath) -> ContentResult<bool> {
        (**self).document_exists(path)
    }

    fn folder_exists(&self, path: &StoragePath) -> ContentResult<bool> {
        (**self).folder_exists(path)
    }
}
