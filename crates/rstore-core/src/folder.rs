//! remoteStorage folder description documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The `@context` every folder description carries.
pub const FOLDER_CONTEXT: &str = "http://remotestorage.io/spec/folder-description";

/// One child entry of a folder description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FolderItem {
    Document {
        #[serde(rename = "ETag")]
        etag: String,
        #[serde(rename = "Content-Type")]
        content_type: String,
        #[serde(rename = "Content-Length")]
        content_length: u64,
    },
    Folder {
        #[serde(rename = "ETag")]
        etag: String,
    },
}

impl FolderItem {
    pub fn etag(&self) -> &str {
        match self {
            Self::Document { etag, .. } | Self::Folder { etag } => etag,
        }
    }
}

/// A folder listing as served to clients.
///
/// Item names are bare: documents by name, folders by name with a trailing
/// `/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderDescription {
    #[serde(rename = "@context")]
    pub context: String,
    pub items: BTreeMap<String, FolderItem>,
}

impl FolderDescription {
    pub fn new(items: BTreeMap<String, FolderItem>) -> Self {
        Self {
            context: FOLDER_CONTEXT.to_string(),
            items,
        }
    }

    /// An empty description, as served for absent folders.
    pub fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "@context": self.context,
            "items": self.items,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Default for FolderDescription {
    fn default() -> Self {
        Self::empty()
    }
}
