use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};

use crate::changes::ChangeSet;
use crate::error::{LedgerError, LedgerResult};
use crate::stamp::{RandomStamp, StampSource};
use crate::traits::VersionLedger;
use crate::version::{DocumentMeta, Version, VersionRecord};

const CREATE_VERSIONS: &str = "CREATE TABLE IF NOT EXISTS versions (
    path TEXT PRIMARY KEY NOT NULL,
    counter INTEGER NOT NULL,
    stamp TEXT NOT NULL,
    content_type TEXT,
    content_length INTEGER
)";

/// Insert at counter 1, or increment in place. The increment happens inside
/// SQLite, so there is no read-modify-write window.
const UPSERT_VERSION: &str = "INSERT INTO versions (path, counter, stamp) VALUES (?1, 1, ?2)
    ON CONFLICT(path) DO UPDATE SET counter = counter + 1, stamp = excluded.stamp";

const SET_META: &str =
    "UPDATE versions SET content_type = ?2, content_length = ?3 WHERE path = ?1";

const DELETE_VERSION: &str = "DELETE FROM versions WHERE path = ?1";

const SELECT_RECORD: &str =
    "SELECT counter, stamp, content_type, content_length FROM versions WHERE path = ?1";

/// SQLite-backed version ledger.
///
/// Schema:
/// - versions: (path TEXT PRIMARY KEY, counter INTEGER, stamp TEXT,
///   content_type TEXT NULL, content_length INTEGER NULL)
///
/// Every [`ChangeSet`] runs in one `BEGIN IMMEDIATE` transaction, which takes
/// the database write lock up front. Other processes sharing the file are
/// serialized by SQLite; threads in this process by the connection mutex.
pub struct SqliteVersionLedger {
    conn: Mutex<Connection>,
    /// Database file, `None` for in-memory databases.
    path: Option<PathBuf>,
    stamps: Box<dyn StampSource>,
}

impl SqliteVersionLedger {
    /// Open (or create) a ledger database at `path`.
    ///
    /// Configures WAL journaling and creates the schema if missing.
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        info!(path = %path.display(), "version ledger opened");
        let ledger = Self {
            conn: Mutex::new(conn),
            path: Some(path),
            stamps: Box::new(RandomStamp),
        };
        ledger.init_schema()?;
        Ok(ledger)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> LedgerResult<Self> {
        let ledger = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
            stamps: Box::new(RandomStamp),
        };
        ledger.init_schema()?;
        Ok(ledger)
    }

    /// Replace the stamp source.
    pub fn with_stamp_source(mut self, stamps: impl StampSource + 'static) -> Self {
        self.stamps = Box::new(stamps);
        self
    }

    /// The database file, if this ledger is file-backed.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create the schema. Safe to call on an initialized database.
    pub fn init_schema(&self) -> LedgerResult<()> {
        self.lock()?.execute(CREATE_VERSIONS, [])?;
        Ok(())
    }

    fn lock(&self) -> LedgerResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| LedgerError::Unavailable(format!("connection lock poisoned: {e}")))
    }
}

fn to_sql_length(path: &str, meta: &DocumentMeta) -> LedgerResult<i64> {
    i64::try_from(meta.content_length).map_err(|_| LedgerError::OutOfRange {
        path: path.to_string(),
        reason: format!("content length {} exceeds i64", meta.content_length),
    })
}

fn corrupt(path: &str, reason: impl Into<String>) -> LedgerError {
    LedgerError::CorruptRecord {
        path: path.to_string(),
        reason: reason.into(),
    }
}

impl VersionLedger for SqliteVersionLedger {
    fn apply(&self, changes: &ChangeSet) -> LedgerResult<String> {
        let stamp = self.stamps.next_stamp();
        let mut conn = self.lock()?;

        // Dropping the transaction on any error path rolls it back.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for path in changes.removed() {
            tx.execute(DELETE_VERSION, params![path])?;
        }
        for path in changes.bumped() {
            tx.execute(UPSERT_VERSION, params![path, stamp])?;
        }
        if let Some((path, meta)) = changes.document_meta() {
            let length = to_sql_length(path, meta)?;
            tx.execute(SET_META, params![path, meta.content_type, length])?;
        }
        tx.commit()?;

        debug!(
            bumped = changes.bumped().len(),
            removed = changes.removed().len(),
            %stamp,
            "ledger change set committed"
        );
        Ok(stamp)
    }

    fn record(&self, path: &str) -> LedgerResult<Option<VersionRecord>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(SELECT_RECORD, params![path], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            })
            .optional()?;

        let Some((counter, stamp, content_type, content_length)) = row else {
            return Ok(None);
        };

        let counter = u64::try_from(counter)
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| corrupt(path, format!("non-positive counter {counter}")))?;
        let meta = match (content_type, content_length) {
            (Some(content_type), Some(length)) => {
                let content_length = u64::try_from(length)
                    .map_err(|_| corrupt(path, format!("negative content length {length}")))?;
                Some(DocumentMeta {
                    content_type,
                    content_length,
                })
            }
            (None, None) => None,
            _ => return Err(corrupt(path, "partial content metadata")),
        };

        Ok(Some(VersionRecord {
            version: Version::new(counter, stamp),
            meta,
        }))
    }
}

impl std::fmt::Debug for SqliteVersionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteVersionLedger")
            .field("path", &self.path)
            .finish()
    }
}
