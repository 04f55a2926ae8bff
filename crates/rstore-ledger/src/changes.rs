//! Batched ledger mutations.

use crate::version::DocumentMeta;

/// A set of ledger mutations applied as one atomic unit.
///
/// Removals are applied before bumps. Every bumped path receives the same
/// fresh stamp and its own counter incremented by one (starting at 1 for a
/// path with no record). Paths are deduplicated, so a path listed twice is
/// still bumped once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    bumped: Vec<String>,
    removed: Vec<String>,
    document: Option<(String, DocumentMeta)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump `paths` to a new version.
    pub fn bump<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            push_unique(&mut self.bumped, path.into());
        }
        self
    }

    /// Remove the records for `paths`.
    pub fn remove<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            push_unique(&mut self.removed, path.into());
        }
        self
    }

    /// Bump the document at `path` and record its content metadata.
    pub fn document(mut self, path: impl Into<String>, meta: DocumentMeta) -> Self {
        let path = path.into();
        push_unique(&mut self.bumped, path.clone());
        self.document = Some((path, meta));
        self
    }

    pub fn bumped(&self) -> &[String] {
        &self.bumped
    }

    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    /// The document whose metadata this change set records, if any.
    pub fn document_meta(&self) -> Option<(&str, &DocumentMeta)> {
        self.document
            .as_ref()
            .map(|(path, meta)| (path.as_str(), meta))
    }

    pub fn is_empty(&self) -> bool {
        self.bumped.is_empty() && self.removed.is_empty()
    }
}

fn push_unique(paths: &mut Vec<String>, path: String) {
    if !paths.contains(&path) {
        paths.push(path);
    }
}
