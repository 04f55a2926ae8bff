//! Document content storage for RStore.
//!
//! This crate stores document bytes at locations that mirror their
//! [`StoragePath`]. Folders are never created explicitly: they appear as a
//! side effect of writing a document beneath them and disappear when the
//! last document beneath them is deleted.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`FsContentStore`] -- documents as files under a root directory
//! - [`InMemoryContentStore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. A path prefix is either a folder or a document, never both. Writes
//!    that would violate this are rejected before anything is mutated.
//! 2. Creating a folder that already exists is a success, including when a
//!    concurrent writer created it first.
//! 3. Deleting a document prunes every ancestor folder it leaves empty,
//!    deepest first, and stops at the first non-empty one.
//! 4. Listing a folder that does not exist yields an empty listing.
//! 5. All I/O errors are propagated, never silently ignored.
//!
//! [`StoragePath`]: rstore_path::StoragePath

pub mod entry;
pub mod error;
pub mod fs;
pub mod memory;
pub mod traits;

pub use entry::{FolderContents, FolderEntry};
pub use error::{ContentConflict, ContentError, ContentResult};
pub use fs::FsContentStore;
pub use memory::InMemoryContentStore;
pub use traits::ContentStore;
