//! Storage orchestrator for RStore, a per-user remoteStorage-style
//! document store.
//!
//! [`RemoteStorage`] is the public surface a protocol layer calls. It
//! combines a [`ContentStore`] (document bytes) with a [`VersionLedger`]
//! (per-path versions), evaluates If-Match / If-None-Match conditions, and
//! renders folder listings in the remoteStorage folder description format.
//!
//! Every operation runs as one sequence of precondition check, content
//! mutation, then ledger mutation, under a per-user lock. A ledger failure
//! after the content store has changed is reported as
//! [`StorageError::Inconsistent`], never swallowed.
//!
//! [`ContentStore`]: rstore_store::ContentStore
//! [`VersionLedger`]: rstore_ledger::VersionLedger

pub mod conditions;
pub mod config;
pub mod error;
pub mod folder;
mod locks;
pub mod storage;

pub use conditions::{Conditions, VersionTokens, WILDCARD};
pub use config::{LedgerConfig, StorageConfig};
pub use error::{ConflictReason, NotModifiedReason, StorageError, StorageResult};
pub use folder::{FolderDescription, FolderItem, FOLDER_CONTEXT};
pub use storage::{Document, FolderListing, RemoteStorage, DEFAULT_CONTENT_TYPE};

// Re-export key types
pub use rstore_ledger::{InMemoryVersionLedger, SqliteVersionLedger, Version, VersionLedger};
pub use rstore_path::{PathError, StoragePath};
pub use rstore_store::{ContentStore, FsContentStore, InMemoryContentStore};
