use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// The version of one path: its own counter plus the stamp of the
/// operation that last touched it.
///
/// Rendered as `"<counter>:<stamp>"`. Two versions with equal counters are
/// told apart by their stamps.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub counter: u64,
    pub stamp: String,
}

impl Version {
    pub fn new(counter: u64, stamp: impl Into<String>) -> Self {
        Self {
            counter,
            stamp: stamp.into(),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.counter, self.stamp)
    }
}

impl FromStr for Version {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::InvalidVersion(s.to_string());
        let (counter, stamp) = s.split_once(':').ok_or_else(invalid)?;
        let counter: u64 = counter.parse().map_err(|_| invalid())?;
        if counter == 0 || stamp.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(counter, stamp))
    }
}

/// Content metadata recorded alongside a document's version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub content_type: String,
    pub content_length: u64,
}

impl DocumentMeta {
    pub fn new(content_type: impl Into<String>, content_length: u64) -> Self {
        Self {
            content_type: content_type.into(),
            content_length,
        }
    }
}

/// Everything the ledger knows about one path.
///
/// Folder records carry no content metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: Version,
    pub meta: Option<DocumentMeta>,
}
