//! Storage repositories for libearth documents.
//!
//! A repository stores byte streams under keys. A key is a sequence of
//! segments, much like a relative path, and data is read and written in
//! chunks so it can feed a lazily parsed
//! [`Document`](libearth_schema::Document) directly.
//!
//! # Modules
//!
//! - [`traits`]: The [`Repository`] trait and key validation
//! - [`filesystem`]: [`FileSystemRepository`], the `file` scheme
//! - [`registry`]: URL scheme → repository lookup
//!
//! # Example
//!
//! ```no_run
//! use libearth_repository::{from_url, Repository};
//!
//! let repo = from_url("file:///tmp/earth").unwrap();
//! repo.write_bytes(&["feeds", "example.xml"], b"<feed/>").unwrap();
//! assert!(repo.exists(&["feeds", "example.xml"]));
//! ```

pub mod filesystem;
pub mod registry;
pub mod traits;

pub use filesystem::{FileSystemRepository, DEFAULT_CHUNK_SIZE};
pub use registry::{from_url, RepositoryFactory, RepositoryRegistry};
pub use traits::{validate_key, Chunks, Repository};

use libearth_core::Result;
use libearth_schema::{Document, DocumentType};

/// Opens a stored document for lazy reading.
///
/// Chunks are read from the repository only as the document is accessed.
///
/// # Errors
///
/// Returns [`libearth_core::Error::RepositoryKey`] when the key names no
/// object, and any error from starting the parse.
pub fn read_document(
    repository: &dyn Repository,
    key: &[&str],
    doc_type: &DocumentType,
) -> Result<Document<'static>> {
    let chunks = repository.read(key)?;
    log::debug!("reading <{}> document from {key:?}", doc_type.tag());
    Document::parse_fallible(doc_type, chunks)
}
