//! Path model for the RStore per-user document store.
//!
//! Every request into the store is addressed by a [`StoragePath`]: an
//! absolute, percent-decoded path whose first segment names the owning user.
//! A trailing `/` marks a folder; anything else is a document.
//!
//! ```text
//! /<user>/[public/]<module>/.../<name>     document
//! /<user>/[public/]<module>/.../           folder
//! ```
//!
//! Parsing rejects anything that could escape the user's namespace on the
//! storage medium: empty segments, `.`/`..` segments (before or after
//! decoding), and percent-encoded separators.
//!
//! # Modules
//!
//! - [`error`] -- [`PathError`] and the [`InvalidReason`] taxonomy
//! - [`path`] -- the [`StoragePath`] value object

pub mod error;
pub mod path;

pub use error::{InvalidReason, PathError, Result};
pub use path::StoragePath;
