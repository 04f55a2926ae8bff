use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::changes::ChangeSet;
use crate::error::{LedgerError, LedgerResult};
use crate::stamp::{RandomStamp, StampSource};
use crate::traits::VersionLedger;
use crate::version::{Version, VersionRecord};

/// In-memory version ledger for tests and embedding.
///
/// All records live in one `HashMap` behind a `RwLock`; a change set is
/// applied under a single write guard, so readers never see it half done.
pub struct InMemoryVersionLedger {
    records: RwLock<HashMap<String, VersionRecord>>,
    stamps: Box<dyn StampSource>,
}

impl InMemoryVersionLedger {
    /// Create an empty ledger drawing random stamps.
    pub fn new() -> Self {
        Self::with_stamp_source(RandomStamp)
    }

    /// Create an empty ledger with an injected stamp source.
    pub fn with_stamp_source(stamps: impl StampSource + 'static) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            stamps: Box::new(stamps),
        }
    }

    /// Number of paths with a version record.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All recorded paths, sorted.
    pub fn paths(&self) -> LedgerResult<Vec<String>> {
        let records = self.records.read().map_err(poisoned)?;
        let mut paths: Vec<String> = records.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> LedgerError {
    LedgerError::Unavailable(format!("lock poisoned: {e}"))
}

impl Default for InMemoryVersionLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionLedger for InMemoryVersionLedger {
    fn apply(&self, changes: &ChangeSet) -> LedgerResult<String> {
        let stamp = self.stamps.next_stamp();
        let mut records = self.records.write().map_err(poisoned)?;

        // Compute every new record before touching the map so a failure
        // leaves the ledger unchanged.
        let mut updates = Vec::with_capacity(changes.bumped().len());
        for path in changes.bumped() {
            let removed = changes.removed().contains(path);
            let previous = records.get(path).filter(|_| !removed);
            let counter = match previous {
                Some(record) => record
                    .version
                    .counter
                    .checked_add(1)
                    .ok_or_else(|| LedgerError::CounterOverflow(path.clone()))?,
                None => 1,
            };
            let mut meta = previous.and_then(|record| record.meta.clone());
            if let Some((doc, doc_meta)) = changes.document_meta() {
                if doc == path {
                    meta = Some(doc_meta.clone());
                }
            }
            updates.push((
                path.clone(),
                VersionRecord {
                    version: Version::new(counter, stamp.clone()),
                    meta,
                },
            ));
        }

        for path in changes.removed() {
            records.remove(path);
        }
        records.extend(updates);

        debug!(
            bumped = changes.bumped().len(),
            removed = changes.removed().len(),
            %stamp,
            "ledger change set applied"
        );
        Ok(stamp)
    }

    fn record(&self, path: &str) -> LedgerResult<Option<VersionRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(path).cloned())
    }
}

impl std::fmt::Debug for InMemoryVersionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryVersionLedger")
            .field("record_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stamp::FixedStamp;
    use crate::version::DocumentMeta;
    use std::sync::Arc;
    use std::thread;

    fn chain(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn first_bump_starts_at_one() {
        let ledger = InMemoryVersionLedger::with_stamp_source(FixedStamp::new("abcd1234"));
        let stamp = ledger
            .bump("/a/b", &chain(&["/a/b", "/a/"]), None)
            .unwrap();
        assert_eq!(stamp, "abcd1234");
        assert_eq!(
            ledger.version_of("/a/b").unwrap(),
            Some(Version::new(1, "abcd1234"))
        );
        assert_eq!(ledger.version_of("/a/").unwrap().unwrap().to_string(), "1:abcd1234");
    }

    #[test]
    fn touched_paths_share_stamp_but_keep_own_counters() {
        let ledger = InMemoryVersionLedger::new();
        ledger.bump("/a/x", &chain(&["/a/x", "/a/"]), None).unwrap();
        let stamp = ledger.bump("/a/y", &chain(&["/a/y", "/a/"]), None).unwrap();

        let x = ledger.version_of("/a/x").unwrap().unwrap();
        let y = ledger.version_of("/a/y").unwrap().unwrap();
        let folder = ledger.version_of("/a/").unwrap().unwrap();
        assert_eq!(x.counter, 1);
        assert_eq!(y.counter, 1);
        assert_eq!(folder.counter, 2);
        assert_eq!(y.stamp, stamp);
        assert_eq!(folder.stamp, stamp);
        assert_ne!(x.stamp, stamp);
    }

    #[test]
    fn document_meta_is_recorded_and_kept() {
        let ledger = InMemoryVersionLedger::new();
        ledger
            .bump(
                "/a/doc",
                &chain(&["/a/doc", "/a/"]),
                Some(DocumentMeta::new("text/plain", 12)),
            )
            .unwrap();
        // A later bump without metadata keeps the recorded metadata.
        ledger.bump("/a/doc", &chain(&["/a/doc"]), None).unwrap();

        let record = ledger.record("/a/doc").unwrap().unwrap();
        assert_eq!(record.version.counter, 2);
        assert_eq!(record.meta, Some(DocumentMeta::new("text/plain", 12)));
        assert_eq!(ledger.record("/a/").unwrap().unwrap().meta, None);
    }

    #[test]
    fn remove_then_bump_restarts_lineage() {
        let ledger = InMemoryVersionLedger::new();
        ledger.bump("/a/", &chain(&["/a/"]), None).unwrap();
        ledger.bump("/a/", &chain(&["/a/"]), None).unwrap();
        ledger.remove("/a/").unwrap();
        assert_eq!(ledger.version_of("/a/").unwrap(), None);

        ledger.bump("/a/", &chain(&["/a/"]), None).unwrap();
        assert_eq!(ledger.version_of("/a/").unwrap().unwrap().counter, 1);
    }

    #[test]
    fn change_set_removes_and_bumps_together() {
        let ledger = InMemoryVersionLedger::new();
        ledger
            .bump("/a/b/c", &chain(&["/a/b/c", "/a/b/", "/a/"]), None)
            .unwrap();
        ledger.bump("/a/d", &chain(&["/a/d", "/a/"]), None).unwrap();

        ledger
            .apply(&ChangeSet::new().remove(["/a/b/c", "/a/b/"]).bump(["/a/"]))
            .unwrap();
        assert_eq!(ledger.paths().unwrap(), ["/a/", "/a/d"]);
        assert_eq!(ledger.version_of("/a/").unwrap().unwrap().counter, 3);
    }

    #[test]
    fn overflow_leaves_ledger_untouched() {
        let ledger = InMemoryVersionLedger::new();
        ledger.bump("/a/", &chain(&["/a/"]), None).unwrap();
        ledger.records.write().unwrap().insert(
            "/a/b".into(),
            VersionRecord {
                version: Version::new(u64::MAX, "x"),
                meta: None,
            },
        );

        let err = ledger.bump("/a/b", &chain(&["/a/", "/a/b"]), None).unwrap_err();
        assert!(matches!(err, LedgerError::CounterOverflow(_)));
        assert_eq!(ledger.version_of("/a/").unwrap().unwrap().counter, 1);
    }

    #[test]
    fn concurrent_bumps_never_lose_increments() {
        let ledger = Arc::new(InMemoryVersionLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for j in 0..25 {
                        let doc = format!("/u/f/doc-{i}-{j}");
                        ledger
                            .bump(&doc, &[doc.clone(), "/u/f/".into(), "/u/".into()], None)
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(ledger.version_of("/u/").unwrap().unwrap().counter, 200);
        assert_eq!(ledger.version_of("/u/f/").unwrap().unwrap().counter, 200);
    }

    #[test]
    fn debug_format() {
        let ledger = InMemoryVersionLedger::default();
        assert!(ledger.is_empty());
        let debug = format!("{ledger:?}");
        assert!(debug.contains("record_count"));
    }
}
