//! File-system repository, the `file` URL scheme.

use crate::traits::{validate_key, Chunks, Repository};
use libearth_core::{Error, Result};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Default size of the chunks [`FileSystemRepository::read`] yields.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Repository that stores objects as files under a root directory.
///
/// Key segments map to path components: `["feeds", "a.xml"]` is stored at
/// `<root>/feeds/a.xml`.
#[derive(Debug, Clone)]
pub struct FileSystemRepository {
    path: PathBuf,
    chunk_size: usize,
}

impl FileSystemRepository {
    /// Opens the repository rooted at `path`.
    ///
    /// When `mkdir` is set a missing root is created along with its parents.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the root does not exist and `mkdir` is not
    /// set, [`Error::NotADirectory`] when it is not a directory.
    pub fn new(path: impl Into<PathBuf>, mkdir: bool) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            if !mkdir {
                return Err(Error::NotFound { path });
            }
            log::debug!("creating repository directory {}", path.display());
            fs::create_dir_all(&path)?;
        }
        if !path.is_dir() {
            return Err(Error::NotADirectory { path });
        }
        Ok(Self {
            path,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Opens the repository a `file://` URL points to, creating it when
    /// missing.
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedScheme`] for other schemes and
    /// [`Error::InvalidUrl`] when the URL has no local path.
    pub fn from_url(url: &Url) -> Result<Self> {
        if url.scheme() != "file" {
            return Err(Error::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }
        let path = url.to_file_path().map_err(|()| Error::InvalidUrl {
            url: url.to_string(),
            message: "not a local path".to_string(),
        })?;
        Self::new(path, true)
    }

    /// Sets the read chunk size. Zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn resolve(&self, key: &[&str]) -> PathBuf {
        key.iter().fold(self.path.clone(), |path, segment| path.join(segment))
    }
}

impl Repository for FileSystemRepository {
    fn read(&self, key: &[&str]) -> Result<Chunks> {
        validate_key(key, false)?;
        let path = self.resolve(key);
        if !path.is_file() {
            return Err(Error::repository_key(key.iter().copied(), "no such object"));
        }
        log::debug!("reading {} in {}-byte chunks", path.display(), self.chunk_size);
        let file = File::open(&path)?;
        Ok(Box::new(FileChunks {
            file: Some(file),
            chunk_size: self.chunk_size,
        }))
    }

    fn write(&self, key: &[&str], chunks: &mut dyn Iterator<Item = Vec<u8>>) -> Result<()> {
        validate_key(key, false)?;
        let path = self.resolve(key);
        if path.is_dir() {
            return Err(Error::repository_key(key.iter().copied(), "is a directory"));
        }
        if let Some(parent) = path.parent() {
            if parent.exists() && !parent.is_dir() {
                return Err(Error::repository_key(
                    key.iter().copied(),
                    "parent is not a directory",
                ));
            }
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&path)?;
        let mut written = 0usize;
        for chunk in chunks {
            file.write_all(&chunk)?;
            written += chunk.len();
        }
        file.flush()?;
        log::debug!("wrote {written} bytes to {}", path.display());
        Ok(())
    }

    fn exists(&self, key: &[&str]) -> bool {
        validate_key(key, true).is_ok() && self.resolve(key).exists()
    }

    fn list(&self, key: &[&str]) -> Result<BTreeSet<String>> {
        validate_key(key, true)?;
        let path = self.resolve(key);
        if !path.is_dir() {
            return Err(Error::repository_key(key.iter().copied(), "not a directory"));
        }
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(&path)? {
            let name = entry?.file_name();
            match name.into_string() {
                Ok(name) => {
                    names.insert(name);
                }
                Err(name) => log::warn!("skipping non-UTF-8 entry {name:?} in {}", path.display()),
            }
        }
        Ok(names)
    }

    fn to_url(&self, scheme: &str) -> Result<String> {
        if scheme != "file" {
            return Err(Error::UnsupportedScheme {
                scheme: scheme.to_string(),
            });
        }
        let absolute = if self.path.is_absolute() {
            self.path.clone()
        } else {
            std::env::current_dir()?.join(&self.path)
        };
        Url::from_directory_path(&absolute)
            .map(String::from)
            .map_err(|()| Error::InvalidUrl {
                url: absolute.display().to_string(),
                message: "cannot be expressed as a file URL".to_string(),
            })
    }
}

/// Reads a file lazily in fixed-size chunks.
struct FileChunks {
    file: Option<File>,
    chunk_size: usize,
}

impl Iterator for FileChunks {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let file = self.file.as_mut()?;
        let mut chunk = Vec::with_capacity(self.chunk_size);
        match Read::by_ref(file)
            .take(self.chunk_size as u64)
            .read_to_end(&mut chunk)
        {
            Ok(0) => {
                self.file = None;
                None
            }
            Ok(_) => Some(Ok(chunk)),
            Err(e) => {
                self.file = None;
                Some(Err(e))
            }
        }
    }
}
