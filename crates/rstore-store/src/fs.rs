use std::fs::{self, Metadata};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use rstore_path::StoragePath;
use tracing::{debug, info, warn};

use crate::entry::{FolderContents, FolderEntry};
use crate::error::{ContentConflict, ContentError, ContentResult};
use crate::traits::ContentStore;

/// Prefix and suffix of in-flight write files, which listings skip.
///
/// Decoded path segments never contain `%`, so no document can be named
/// like this.
const TEMP_PREFIX: &str = "%rstore-";
const TEMP_SUFFIX: &str = ".tmp";

/// Filesystem-backed content store.
///
/// Documents are regular files and folders are directories under `root`,
/// at locations mirroring their storage path: `/alice/notes/todo.txt`
/// lives at `<root>/alice/notes/todo.txt`.
///
/// Documents are written to a temporary file in the target folder and
/// renamed over the leaf, so readers see either the old or the new bytes.
#[derive(Clone, Debug)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> ContentResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        info!(root = %root.display(), "content store opened");
        Ok(Self { root })
    }

    /// The directory all documents live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the document at `path` lives on disk, so a caller can stream
    /// it instead of reading it into memory.
    pub fn document_location(&self, path: &StoragePath) -> PathBuf {
        self.locate(path.segments())
    }

    fn locate<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> PathBuf {
        let mut location = self.root.clone();
        location.extend(segments);
        location
    }

    /// Location of a folder given as its canonical string.
    fn resolve(&self, path: &str) -> PathBuf {
        self.locate(path.split('/').filter(|s| !s.is_empty()))
    }

    fn create_folder(&self, folder: &str) -> ContentResult<()> {
        let dir = self.resolve(folder);
        match fs::create_dir(&dir) {
            Ok(()) => {
                debug!(folder, "folder created");
                Ok(())
            }
            // Another writer may have created it between our check and now.
            Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(ContentError::conflict(
                folder,
                ContentConflict::DocumentBlocksFolder,
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn write_atomically(&self, leaf: &Path, data: &[u8]) -> io::Result<()> {
        let parent = leaf.parent().unwrap_or(&self.root);
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(parent)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(leaf).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Metadata for `location`, or `None` when nothing exists there.
fn stat(location: &Path) -> io::Result<Option<Metadata>> {
    match fs::metadata(location) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if is_absent(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// A missing entry, or a document standing where a folder was expected.
fn is_absent(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

fn is_temp_file(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

impl ContentStore for FsContentStore {
    fn put(&self, path: &StoragePath, data: &[u8]) -> ContentResult<Vec<String>> {
        if path.is_folder() {
            return Err(ContentError::conflict(
                path.as_str(),
                ContentConflict::PathIsFolder,
            ));
        }

        let ancestors = path.ancestor_folders();
        for folder in ancestors {
            if stat(&self.resolve(folder))?.is_some_and(|m| !m.is_dir()) {
                return Err(ContentError::conflict(
                    folder,
                    ContentConflict::DocumentBlocksFolder,
                ));
            }
        }

        let leaf = self.document_location(path);
        if stat(&leaf)?.is_some_and(|m| m.is_dir()) {
            return Err(ContentError::conflict(
                path.as_str(),
                ContentConflict::PathIsFolder,
            ));
        }

        for folder in ancestors {
            self.create_folder(folder)?;
        }
        self.write_atomically(&leaf, data)?;

        debug!(path = %path, bytes = data.len(), "document written");
        Ok(ancestors.to_vec())
    }

    fn get(&self, path: &StoragePath) -> ContentResult<Vec<u8>> {
        let location = self.document_location(path);
        match stat(&location)? {
            Some(meta) if meta.is_file() => match fs::read(&location) {
                Ok(data) => Ok(data),
                Err(e) if is_absent(&e) => Err(ContentError::NotFound(path.to_string())),
                Err(e) => Err(e.into()),
            },
            _ => Err(ContentError::NotFound(path.to_string())),
        }
    }

    fn delete(&self, path: &StoragePath) -> ContentResult<Vec<String>> {
        let location = self.document_location(path);
        if !stat(&location)?.is_some_and(|m| m.is_file()) {
            return Err(ContentError::NotFound(path.to_string()));
        }
        match fs::remove_file(&location) {
            Ok(()) => {}
            Err(e) if is_absent(&e) => return Err(ContentError::NotFound(path.to_string())),
            Err(e) => return Err(e.into()),
        }

        let mut removed = vec![path.to_string()];
        for folder in path.ancestor_folders().iter().rev() {
            match fs::remove_dir(self.resolve(folder)) {
                Ok(()) => removed.push(folder.clone()),
                Err(e)
                    if matches!(
                        e.kind(),
                        ErrorKind::DirectoryNotEmpty | ErrorKind::AlreadyExists
                    ) =>
                {
                    break
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!(folder, "folder vanished during pruning");
                }
                Err(e) => return Err(e.into()),
            }
        }

        debug!(path = %path, pruned = removed.len() - 1, "document deleted");
        Ok(removed)
    }

    fn list_folder(&self, path: &StoragePath) -> ContentResult<FolderContents> {
        let mut contents = FolderContents::new();
        if path.is_document() {
            return Ok(contents);
        }

        let entries = match fs::read_dir(self.locate(path.segments())) {
            Ok(entries) => entries,
            Err(e) if is_absent(&e) => return Ok(contents),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                warn!(folder = %path, "skipping entry with non UTF-8 name");
                continue;
            };
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                contents.insert(format!("{name}/"), FolderEntry::Folder);
            } else if file_type.is_file() && !is_temp_file(&name) {
                let size = match entry.metadata() {
                    Ok(meta) => meta.len(),
                    // Deleted since the directory was read.
                    Err(e) if is_absent(&e) => continue,
                    Err(e) => return Err(e.into()),
                };
                contents.insert(name, FolderEntry::Document { size });
            }
        }
        Ok(contents)
    }

    fn document_exists(&self, path: &StoragePath) -> ContentResult<bool> {
        if path.is_folder() {
            return Ok(false);
        }
        Ok(stat(&self.document_location(path))?.is_some_and(|m| m.is_file()))
    }

    fn folder_exists(&self, path: &StoragePath) -> ContentResult<bool> {
        if path.is_document() {
            return Ok(false);
        }
        Ok(stat(&self.locate(path.segments()))?.is_some_and(|m| m.is_dir()))
    }
}
