use crate::changes::ChangeSet;
use crate::error::LedgerResult;
use crate::version::{DocumentMeta, Version, VersionRecord};

/// Transactional path → version mapping.
///
/// Implementations must be thread-safe (`Send + Sync`) and must apply each
/// [`ChangeSet`] atomically: concurrent readers observe either none or all
/// of its updates, and concurrent change sets touching the same path never
/// lose an increment.
pub trait VersionLedger: Send + Sync {
    /// Apply `changes` atomically and return the stamp given to every
    /// bumped path.
    fn apply(&self, changes: &ChangeSet) -> LedgerResult<String>;

    /// Read the full record for `path`.
    ///
    /// Returns `Ok(None)` if the path does not currently exist.
    fn record(&self, path: &str) -> LedgerResult<Option<VersionRecord>>;

    /// Point lookup of the current version of `path`.
    fn version_of(&self, path: &str) -> LedgerResult<Option<Version>> {
        Ok(self.record(path)?.map(|record| record.version))
    }

    /// Bump every path in `touched` under one fresh stamp, recording `meta`
    /// for `path` when given.
    fn bump(
        &self,
        path: &str,
        touched: &[String],
        meta: Option<DocumentMeta>,
    ) -> LedgerResult<String> {
        let mut changes = ChangeSet::new().bump(touched.iter().map(String::as_str));
        if let Some(meta) = meta {
            changes = changes.document(path, meta);
        }
        self.apply(&changes)
    }

    /// Delete the record for `path`.
    fn remove(&self, path: &str) -> LedgerResult<()> {
        self.apply(&ChangeSet::new().remove([path]))?;
        Ok(())
    }
}

impl<L: VersionLedger + ?Sized> VersionLedger for Box<L> {
    fn apply(&self, changes: &ChangeSet) -> LedgerResult<String> {
        (**self).apply(changes)
    }

    fn record(&self, path: &str) -> LedgerResult<Option<VersionRecord>> {
        (**self).record(path)
    }
}

impl<L: VersionLedger + ?Sized> VersionLedger for std::sync::Arc<L> {
    fn apply(&self, changes: &ChangeSet) -> LedgerResult<String> {
        (**self).apply(changes)
    }

    fn record(&self, path: &str) -> LedgerResult<Option<VersionRecord>> {
        (**self).record(path)
    }
}
