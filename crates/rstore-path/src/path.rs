//! The [`StoragePath`] value object.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidReason, PathError, Result};

/// Segment that marks the world-readable half of a user's namespace.
const PUBLIC_SEGMENT: &str = "public";

/// A validated, decoded path into a user's document namespace.
///
/// Constructed only through [`StoragePath::parse`], so every instance obeys
/// the path invariants: it starts with `/`, names a user, has no empty or
/// dot segments, and its canonical form re-parses to an equal value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoragePath {
    raw: String,
    /// Decoded segments, without the empty segment a trailing `/` produces.
    segments: Vec<String>,
    is_folder: bool,
    /// Every folder that must exist for this path to be writable, root first.
    ancestors: Vec<String>,
}

impl StoragePath {
    /// Parse and validate a path string.
    ///
    /// Each segment is percent-decoded before it is validated, so encoded
    /// traversal attempts (`%2e%2e`, `%2f`) are caught.
    ///
    /// # Examples
    ///
    /// ```
    /// use rstore_path::StoragePath;
    ///
    /// let p = StoragePath::parse("/admin/contacts/work/colleagues.vcf").unwrap();
    /// assert_eq!(p.user_id(), "admin");
    /// assert_eq!(p.module_name(), Some("contacts"));
    /// assert!(StoragePath::parse("/admin").is_err());
    /// assert!(StoragePath::parse("/foo/%2e%2e/bar").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let rest = input
            .strip_prefix('/')
            .ok_or_else(|| PathError::invalid(input, InvalidReason::NotAbsolute))?;

        let parts: Vec<&str> = rest.split('/').collect();
        let Some((leaf, inner)) = parts.split_last().filter(|(_, inner)| !inner.is_empty())
        else {
            return Err(PathError::invalid(input, InvalidReason::MissingUser));
        };
        let is_folder = leaf.is_empty();

        let mut segments = Vec::with_capacity(parts.len());
        for part in inner.iter().chain((!is_folder).then_some(leaf)) {
            segments.push(decode_segment(input, part)?);
        }

        let depth = if is_folder {
            segments.len()
        } else {
            segments.len() - 1
        };
        let mut ancestors = Vec::with_capacity(depth);
        let mut prefix = String::from("/");
        for segment in &segments[..depth] {
            prefix.push_str(segment);
            prefix.push('/');
            ancestors.push(prefix.clone());
        }

        let raw = if is_folder {
            prefix
        } else {
            format!("{prefix}{}", segments[depth])
        };

        Ok(Self {
            raw,
            segments,
            is_folder,
            ancestors,
        })
    }

    /// The canonical (decoded) path string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The owning user: the first path segment.
    pub fn user_id(&self) -> &str {
        &self.segments[0]
    }

    /// `true` when the second segment is `public`.
    pub fn is_public(&self) -> bool {
        self.segments.get(1).is_some_and(|s| s == PUBLIC_SEGMENT)
    }

    pub fn is_folder(&self) -> bool {
        self.is_folder
    }

    pub fn is_document(&self) -> bool {
        !self.is_folder
    }

    /// The module (application category) this path belongs to.
    ///
    /// This is the segment after the user id, or after `public` for public
    /// paths, and only exists when something is addressed *inside* it:
    /// `/admin/foo/` and `/admin/foo/bar` name module `foo`, while
    /// `/admin/foo` (a document at the user root) has none.
    pub fn module_name(&self) -> Option<&str> {
        let offset = if self.is_public() { 2 } else { 1 };
        // A trailing slash counts as one more (empty) segment.
        let count = self.segments.len() + usize::from(self.is_folder);
        if count < offset + 2 {
            return None;
        }
        self.segments.get(offset).map(String::as_str)
    }

    /// Folder paths from the user root down to this folder (inclusive) or to
    /// this document's parent folder.
    ///
    /// ```
    /// use rstore_path::StoragePath;
    ///
    /// let p = StoragePath::parse("/admin/contacts/work/colleagues.vcf").unwrap();
    /// assert_eq!(
    ///     p.ancestor_folders(),
    ///     ["/admin/", "/admin/contacts/", "/admin/contacts/work/"]
    /// );
    /// ```
    pub fn ancestor_folders(&self) -> &[String] {
        &self.ancestors
    }

    /// The immediate containing folder, or `None` for a user root folder.
    pub fn parent(&self) -> Option<&str> {
        // A folder is the last entry of its own ancestor chain.
        let own = usize::from(self.is_folder);
        self.ancestors
            .len()
            .checked_sub(own + 1)
            .map(|index| self.ancestors[index].as_str())
    }

    /// The entry name this path has inside its parent's listing: the last
    /// segment, with a trailing `/` for folders.
    pub fn name(&self) -> String {
        let last = self.segments.last().map(String::as_str).unwrap_or_default();
        if self.is_folder {
            format!("{last}/")
        } else {
            last.to_string()
        }
    }

    /// Decoded segments, user id first, for mapping onto a medium.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Fail with [`PathError::NotADocument`] unless this is a document path.
    pub fn require_document(&self) -> Result<&Self> {
        if self.is_folder {
            return Err(PathError::NotADocument(self.raw.clone()));
        }
        Ok(self)
    }

    /// Fail with [`PathError::NotAFolder`] unless this is a folder path.
    pub fn require_folder(&self) -> Result<&Self> {
        if !self.is_folder {
            return Err(PathError::NotAFolder(self.raw.clone()));
        }
        Ok(self)
    }
}

fn decode_segment(input: &str, part: &str) -> Result<String> {
    if part.is_empty() {
        return Err(PathError::invalid(input, InvalidReason::EmptySegment));
    }
    if is_dot_segment(part) {
        return Err(PathError::invalid(input, InvalidReason::DotSegment));
    }

    let decoded = urlencoding::decode(part)
        .map_err(|_| PathError::invalid(input, InvalidReason::InvalidEncoding))?;

    if decoded.contains('/') {
        return Err(PathError::invalid(input, InvalidReason::EncodedSeparator));
    }
    if is_dot_segment(&decoded) {
        return Err(PathError::invalid(input, InvalidReason::DotSegment));
    }
    if decoded.contains('\0') {
        return Err(PathError::invalid(input, InvalidReason::NulCharacter));
    }
    if decoded.contains('%') {
        return Err(PathError::invalid(input, InvalidReason::PercentSign));
    }
    Ok(decoded.into_owned())
}

fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl FromStr for StoragePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for StoragePath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for StoragePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<StoragePath> for String {
    fn from(path: StoragePath) -> Self {
        path.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(s: &str) -> StoragePath {
        StoragePath::parse(s).unwrap()
    }

    #[test]
    fn private_document() {
        let path = p("/admin/path/to/Document.txt");
        assert_eq!(path.user_id(), "admin");
        assert!(!path.is_public());
        assert!(!path.is_folder());
        assert!(path.is_document());
        assert_eq!(path.as_str(), "/admin/path/to/Document.txt");
    }

    #[test]
    fn private_folder() {
        let path = p("/admin/path/to/Folder/");
        assert_eq!(path.user_id(), "admin");
        assert!(!path.is_public());
        assert!(path.is_folder());
        assert_eq!(path.as_str(), "/admin/path/to/Folder/");
        assert_eq!(path.module_name(), Some("path"));
    }

    #[test]
    fn public_paths() {
        let doc = p("/admin/public/path/to/Document.txt");
        assert!(doc.is_public());
        assert!(doc.is_document());

        let folder = p("/admin/public/path/to/Folder/");
        assert!(folder.is_public());
        assert!(folder.is_folder());
        assert!(!folder.is_document());
        assert_eq!(folder.module_name(), Some("path"));
    }

    #[test]
    fn percent_decoding() {
        assert_eq!(p("/Fran%C3%A7ois/foo/").as_str(), "/François/foo/");
        assert_eq!(p("/Fran%C3%A7ois/foo/").user_id(), "François");
        assert_eq!(p("/admin/a+b%20c").name(), "a+b c");
    }

    #[test]
    fn module_names() {
        assert_eq!(p("/admin/public/foo/bar/baz.txt").module_name(), Some("foo"));
        assert_eq!(p("/admin/public/foo/").module_name(), Some("foo"));
        assert_eq!(p("/admin/foo/bar/baz.txt").module_name(), Some("foo"));
        assert_eq!(p("/admin/foo/").module_name(), Some("foo"));
    }

    #[test]
    fn no_module_names() {
        assert_eq!(p("/admin/public/foo").module_name(), None);
        assert_eq!(p("/admin/public/").module_name(), None);
        assert_eq!(p("/admin/foo").module_name(), None);
        assert_eq!(p("/admin/").module_name(), None);
    }

    #[test]
    fn valid_paths() {
        for input in [
            "/admin/public/foo/",
            "/admin/foo/",
            "/admin/public/foo/bar.txt",
            "/admin/public/foo/bar/very/long/path/with/Document",
            "/foo/bar",
            "/admin/",
        ] {
            assert!(StoragePath::parse(input).is_ok(), "{input}");
        }
    }

    #[test]
    fn invalid_paths() {
        let cases = [
            ("/", InvalidReason::MissingUser),
            ("/admin", InvalidReason::MissingUser),
            ("///", InvalidReason::EmptySegment),
            ("/admin/foo//bar/", InvalidReason::EmptySegment),
            ("admin/public/foo.txt", InvalidReason::NotAbsolute),
            ("", InvalidReason::NotAbsolute),
            ("/admin/foo/../../", InvalidReason::DotSegment),
            ("/admin/./foo", InvalidReason::DotSegment),
            ("/foo%2fbar", InvalidReason::MissingUser),
            ("/foo%2fbar/baz", InvalidReason::EncodedSeparator),
            ("/foo/%2e%2e/bar", InvalidReason::DotSegment),
            ("/foo/%2E/bar", InvalidReason::DotSegment),
            ("/foo/%FF/bar", InvalidReason::InvalidEncoding),
            ("/foo/a%00b", InvalidReason::NulCharacter),
            ("/a/%2541", InvalidReason::PercentSign),
            ("/a/%252e%252e/", InvalidReason::PercentSign),
            ("/a/50%", InvalidReason::PercentSign),
        ];
        for (input, reason) in cases {
            let err = StoragePath::parse(input).unwrap_err();
            assert_eq!(err.reason(), Some(reason), "{input}");
        }
    }

    #[test]
    fn non_string_input_is_rejected() {
        assert!(serde_json::from_value::<StoragePath>(serde_json::json!(123)).is_err());
        assert!(serde_json::from_value::<StoragePath>(serde_json::json!("/a")).is_err());

        let path: StoragePath = serde_json::from_value(serde_json::json!("/a/b/")).unwrap();
        assert_eq!(path, p("/a/b/"));
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"/a/b/\"");
    }

    #[test]
    fn document_folder_tree() {
        assert_eq!(
            p("/admin/contacts/work/colleagues.vcf").ancestor_folders(),
            ["/admin/", "/admin/contacts/", "/admin/contacts/work/"]
        );
    }

    #[test]
    fn folder_folder_tree() {
        assert_eq!(
            p("/admin/contacts/work/").ancestor_folders(),
            ["/admin/", "/admin/contacts/", "/admin/contacts/work/"]
        );
    }

    #[test]
    fn short_folder_tree() {
        assert_eq!(p("/foo/bar").ancestor_folders(), ["/foo/"]);
        assert_eq!(p("/foo/").ancestor_folders(), ["/foo/"]);
    }

    #[test]
    fn parent_and_name() {
        let doc = p("/admin/messages/hello.txt");
        assert_eq!(doc.parent(), Some("/admin/messages/"));
        assert_eq!(doc.name(), "hello.txt");

        let folder = p("/admin/messages/");
        assert_eq!(folder.parent(), Some("/admin/"));
        assert_eq!(folder.name(), "messages/");

        assert_eq!(p("/admin/").parent(), None);
        assert_eq!(p("/admin/x").parent(), Some("/admin/"));
    }

    #[test]
    fn kind_guards() {
        assert!(p("/a/b").require_document().is_ok());
        assert_eq!(
            p("/a/b/").require_document().unwrap_err(),
            PathError::NotADocument("/a/b/".into())
        );
        assert!(p("/a/b/").require_folder().is_ok());
        assert_eq!(
            p("/a/b").require_folder().unwrap_err(),
            PathError::NotAFolder("/a/b".into())
        );
    }

    #[test]
    fn error_message_mentions_invalid_path() {
        let msg = StoragePath::parse("/admin").unwrap_err().to_string();
        assert!(msg.starts_with("invalid path"), "{msg}");
    }

    fn segment() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_-][A-Za-z0-9_.-]{0,8}"
    }

    /// Any text a client could put in one segment, percent-encoded.
    fn encoded_segment() -> impl Strategy<Value = (String, String)> {
        "[^/\\x00]{1,8}"
            .prop_filter("dot segments are rejected", |s| !is_dot_segment(s))
            .prop_map(|s| {
                let encoded = urlencoding::encode(&s).into_owned();
                (s, encoded)
            })
    }

    #[test]
    fn canonical_form_survives_serde() {
        for input in ["/a/b%20c/", "/Fran%C3%A7ois/x", "/a/%E2%9C%93"] {
            let path = p(input);
            let json = serde_json::to_string(&path).unwrap();
            let back: StoragePath = serde_json::from_str(&json).unwrap();
            assert_eq!(back, path, "{input}");
            assert_eq!(p(path.as_str()), path, "{input}");
        }
    }

    proptest! {
        #[test]
        fn canonical_form_round_trips(
            segs in prop::collection::vec(segment(), 2..7),
            folder in any::<bool>(),
        ) {
            let mut raw = format!("/{}", segs.join("/"));
            if folder {
                raw.push('/');
            }
            let path = StoragePath::parse(&raw).unwrap();
            prop_assert_eq!(path.as_str(), raw.as_str());
            prop_assert_eq!(&StoragePath::parse(path.as_str()).unwrap(), &path);

            let ancestors = path.ancestor_folders();
            prop_assert!(ancestors.iter().all(|a| a.ends_with('/')));
            prop_assert!(ancestors.iter().all(|a| raw.starts_with(a.as_str())));
            if folder {
                prop_assert_eq!(ancestors.len(), segs.len());
                prop_assert_eq!(ancestors.last().map(String::as_str), Some(raw.as_str()));
            } else {
                prop_assert_eq!(ancestors.len(), segs.len() - 1);
                prop_assert!(!ancestors.contains(&raw));
            }
        }

        #[test]
        fn encoded_input_round_trips(
            segs in prop::collection::vec(encoded_segment(), 2..5),
            folder in any::<bool>(),
        ) {
            let mut input = String::new();
            for (_, encoded) in &segs {
                input.push('/');
                input.push_str(encoded);
            }
            if folder {
                input.push('/');
            }

            match StoragePath::parse(&input) {
                Ok(path) => {
                    let decoded: Vec<&str> = segs.iter().map(|(s, _)| s.as_str()).collect();
                    prop_assert_eq!(path.segments().collect::<Vec<_>>(), decoded);
                    prop_assert_eq!(&StoragePath::parse(path.as_str()).unwrap(), &path);

                    let json = serde_json::to_string(&path).unwrap();
                    let back: StoragePath = serde_json::from_str(&json).unwrap();
                    prop_assert_eq!(&back, &path);
                }
                Err(err) => {
                    prop_assert!(segs.iter().any(|(s, _)| s.contains('%')));
                    prop_assert_eq!(err.reason(), Some(InvalidReason::PercentSign));
                }
            }
        }
    }
}
