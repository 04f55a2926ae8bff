//! Folder listing entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One direct child of a folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FolderEntry {
    /// A document and its size in bytes.
    Document { size: u64 },
    /// A subfolder.
    Folder,
}

impl FolderEntry {
    pub fn is_document(&self) -> bool {
        matches!(self, FolderEntry::Document { .. })
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, FolderEntry::Folder)
    }
}

/// The direct children of a folder, keyed by entry name.
///
/// Document names are bare (`bar.txt`); folder names carry a trailing `/`
/// (`photos/`), so a name alone identifies the entry kind.
pub type FolderContents = BTreeMap<String, FolderEntry>;
