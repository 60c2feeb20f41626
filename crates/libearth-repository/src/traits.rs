//! Repository abstraction.

use libearth_core::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::io;

/// Chunked contents of a stored object.
pub type Chunks = Box<dyn Iterator<Item = io::Result<Vec<u8>>>>;

/// A store of byte streams addressed by segmented keys.
pub trait Repository: fmt::Debug {
    /// Reads the object stored under `key` as a chunk iterator.
    ///
    /// # Errors
    ///
    /// [`Error::RepositoryKey`] when the key is invalid or names no object.
    fn read(&self, key: &[&str]) -> Result<Chunks>;

    /// Stores `chunks` under `key`, replacing any previous object.
    ///
    /// # Errors
    ///
    /// [`Error::RepositoryKey`] when the key is invalid or names a
    /// directory, and I/O errors.
    fn write(&self, key: &[&str], chunks: &mut dyn Iterator<Item = Vec<u8>>) -> Result<()>;

    /// Whether an object or directory exists under `key`.
    fn exists(&self, key: &[&str]) -> bool;

    /// Names directly under a directory key. The empty key is the root.
    ///
    /// # Errors
    ///
    /// [`Error::RepositoryKey`] when the key is not a directory.
    fn list(&self, key: &[&str]) -> Result<BTreeSet<String>>;

    /// URL that reopens this repository through the registry.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedScheme`] for schemes the repository cannot
    /// express.
    fn to_url(&self, scheme: &str) -> Result<String>;

    /// Stores a single buffer under `key`.
    ///
    /// # Errors
    ///
    /// Same as [`Repository::write`].
    fn write_bytes(&self, key: &[&str], data: &[u8]) -> Result<()> {
        self.write(key, &mut std::iter::once(data.to_vec()))
    }

    /// Reads the whole object under `key` into memory.
    ///
    /// # Errors
    ///
    /// Same as [`Repository::read`], plus I/O errors while reading.
    fn read_bytes(&self, key: &[&str]) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        for chunk in self.read(key)? {
            data.extend_from_slice(&chunk?);
        }
        Ok(data)
    }
}

/// Checks that every key segment is a plain name.
///
/// Segments must be non-empty, must not be `.` or `..`, and must not contain
/// path separators or NUL. An empty key is only accepted when `allow_root`
/// is set.
///
/// # Errors
///
/// [`Error::RepositoryKey`] describing the first offending segment.
///
/// # Example
///
/// ```rust
/// use libearth_repository::validate_key;
///
/// assert!(validate_key(&["feeds", "a.xml"], false).is_ok());
/// assert!(validate_key(&["feeds", ".."], false).is_err());
/// assert!(validate_key(&[], false).is_err());
/// assert!(validate_key(&[], true).is_ok());
/// ```
pub fn validate_key(key: &[&str], allow_root: bool) -> Result<()> {
    if key.is_empty() && !allow_root {
        return Err(Error::repository_key(
            key.iter().copied(),
            "key must have at least one segment",
        ));
    }
    for segment in key {
        let message = if segment.is_empty() {
            "empty segment"
        } else if *segment == "." || *segment == ".." {
            "relative segment"
        } else if segment.contains(['/', '\\', '\0']) {
            "segment contains a separator"
        } else {
            continue;
        };
        return Err(Error::repository_key(key.iter().copied(), message));
    }
    Ok(())
}
