//! URL scheme → repository lookup.

use crate::filesystem::FileSystemRepository;
use crate::traits::Repository;
use libearth_core::{Error, Result};
use std::collections::BTreeMap;
use url::Url;

/// Builds a repository from a parsed URL.
pub type RepositoryFactory = fn(&Url) -> Result<Box<dyn Repository>>;

/// Maps URL schemes to repository constructors.
///
/// The default registry knows the `file` scheme.
///
/// # Example
///
/// ```rust
/// use libearth_repository::RepositoryRegistry;
///
/// let registry = RepositoryRegistry::default();
/// assert_eq!(registry.schemes().collect::<Vec<_>>(), vec!["file"]);
/// assert!(registry.from_url("ftp://example.com/").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RepositoryRegistry {
    factories: BTreeMap<String, RepositoryFactory>,
}

fn open_file(url: &Url) -> Result<Box<dyn Repository>> {
    Ok(Box::new(FileSystemRepository::from_url(url)?))
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("file", open_file);
        registry
    }
}

impl RepositoryRegistry {
    /// Creates a registry with no schemes.
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registers `factory` for `scheme`, replacing any previous one.
    pub fn register(&mut self, scheme: impl Into<String>, factory: RepositoryFactory) {
        let scheme = scheme.into().to_ascii_lowercase();
        log::debug!("registering repository scheme {scheme:?}");
        self.factories.insert(scheme, factory);
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Opens the repository `url` points to.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidUrl`] when `url` does not parse and
    /// [`Error::UnsupportedScheme`] when no factory handles its scheme,
    /// plus whatever the factory reports.
    pub fn from_url(&self, url: &str) -> Result<Box<dyn Repository>> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let factory = self
            .factories
            .get(parsed.scheme())
            .ok_or_else(|| Error::UnsupportedScheme {
                scheme: parsed.scheme().to_string(),
            })?;
        factory(&parsed)
    }
}

/// Opens a repository through the default registry.
///
/// # Errors
///
/// Same as [`RepositoryRegistry::from_url`].
pub fn from_url(url: &str) -> Result<Box<dyn Repository>> {
    RepositoryRegistry::default().from_url(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn refuse(url: &Url) -> Result<Box<dyn Repository>> {
        Err(Error::InvalidUrl {
            url: url.to_string(),
            message: "refused".to_string(),
        })
    }

    #[test]
    fn test_default_registry_opens_file_urls() {
        let dir = TempDir::new().unwrap();
        let url = Url::from_directory_path(dir.path()).unwrap();
        let repo = from_url(url.as_str()).unwrap();
        repo.write_bytes(&["a"], b"x").unwrap();
        assert!(dir.path().join("a").is_file());
    }

    #[test]
    fn test_unparseable_url() {
        let err = from_url("not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_unknown_scheme() {
        let err = RepositoryRegistry::empty()
            .from_url("file:///tmp/x")
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedScheme { ref scheme } if scheme == "file"));
    }

    #[test]
    fn test_register_custom_scheme() {
        let mut registry = RepositoryRegistry::default();
        registry.register("S3", refuse);
        assert_eq!(registry.schemes().collect::<Vec<_>>(), vec!["file", "s3"]);
        let err = registry.from_url("s3://bucket/prefix").unwrap_err();
        assert!(err.to_string().contains("refused"));
    }
}
