//! Version ledger for the RStore document store.
//!
//! The ledger maps every existing document and folder path to a
//! [`Version`]: a per-path counter paired with an opaque stamp. Each
//! mutating operation draws one fresh stamp and gives it to every path it
//! touches (the document and its whole ancestor chain), while each path
//! keeps its own counter lineage. Clients see the rendered form
//! `"<counter>:<stamp>"` as an ETag.
//!
//! This crate provides:
//! - [`Version`], [`VersionRecord`] and [`DocumentMeta`] record types
//! - the [`VersionLedger`] trait and the [`ChangeSet`] it applies atomically
//! - [`StampSource`] for injecting randomness ([`RandomStamp`], [`FixedStamp`])
//! - [`InMemoryVersionLedger`] for tests and embedding
//! - [`SqliteVersionLedger`], a transactional SQLite-backed ledger

pub mod changes;
pub mod error;
pub mod memory;
pub mod sqlite;
pub mod stamp;
pub mod traits;
pub mod version;

pub use changes::ChangeSet;
pub use error::{LedgerError, LedgerResult};
pub use memory::InMemoryVersionLedger;
pub use sqlite::SqliteVersionLedger;
pub use stamp::{FixedStamp, RandomStamp, StampSource};
pub use traits::VersionLedger;
pub use version::{DocumentMeta, Version, VersionRecord};
