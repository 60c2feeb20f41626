//! Error types for libearth.

use std::path::PathBuf;

/// Errors that can occur while declaring schemas, reading documents, or
/// accessing repositories.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid schema declaration.
    #[error("Schema error: {message}")]
    Schema {
        /// What is wrong with the declaration
        message: String,
    },

    /// The document does not match its schema or is not well-formed.
    #[error("Syntax error: {message}")]
    Syntax {
        /// What was found in the stream
        message: String,
    },

    /// Low-level XML tokenizer failure.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A value or accessor does not match the descriptor it is used with.
    #[error("Type error: expected {expected}, not {found}")]
    Type {
        /// What the descriptor accepts
        expected: String,
        /// What was supplied
        found: String,
    },

    /// The element type declares no descriptor with this attribute name.
    #[error("{element} has no attribute {attribute:?}")]
    UnknownAttribute {
        /// Element type name
        element: String,
        /// Requested attribute
        attribute: String,
    },

    /// A required child is absent from a completely read element.
    #[error("{element} requires <{tag}> but it is missing")]
    MissingRequired {
        /// Element type name
        element: String,
        /// Tag of the missing child
        tag: String,
    },

    /// The document stream failed earlier; no further data can be read.
    #[error("Document halted after an earlier failure: {message}")]
    Halted {
        /// The first failure
        message: String,
    },

    /// Invalid or nonexistent repository key.
    #[error("Repository key error {key:?}: {message}")]
    RepositoryKey {
        /// The offending key
        key: Vec<String>,
        /// Why the key was rejected
        message: String,
    },

    /// A path that must exist does not.
    #[error("No such file or directory: {}", path.display())]
    NotFound {
        /// The missing path
        path: PathBuf,
    },

    /// A path that must be a directory is not.
    #[error("Not a directory: {}", path.display())]
    NotADirectory {
        /// The offending path
        path: PathBuf,
    },

    /// No repository is registered for the URL scheme.
    #[error("Unsupported repository scheme: {scheme}")]
    UnsupportedScheme {
        /// The URL scheme
        scheme: String,
    },

    /// The URL cannot be turned into a repository.
    #[error("Invalid repository URL {url}: {message}")]
    InvalidUrl {
        /// The URL as given
        url: String,
        /// Why it was rejected
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },
}

/// Convenience `Result` type alias for libearth operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error comes from the data being read rather
    /// than from a mistake in the calling code.
    ///
    /// Stream, document, and storage failures are recoverable: a caller can
    /// skip the document or retry with another source. Schema declaration
    /// mistakes and accessor misuse are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Syntax { .. } => true,
            Error::Xml(_) => true,
            Error::MissingRequired { .. } => true,
            Error::Halted { .. } => true,
            Error::RepositoryKey { .. } => true,
            Error::NotFound { .. } => true,
            Error::NotADirectory { .. } => true,
            Error::Io(_) => true,
            Error::Schema { .. } => false,
            Error::Type { .. } => false,
            Error::UnknownAttribute { .. } => false,
            Error::UnsupportedScheme { .. } => false,
            Error::InvalidUrl { .. } => false,
            Error::Config { .. } => false,
        }
    }

    /// Creates a new schema declaration error.
    pub fn schema<S: Into<String>>(message: S) -> Self {
        Error::Schema {
            message: message.into(),
        }
    }

    /// Creates a new document syntax error.
    pub fn syntax<S: Into<String>>(message: S) -> Self {
        Error::Syntax {
            message: message.into(),
        }
    }

    /// Creates a new type mismatch error.
    pub fn type_mismatch<E, F>(expected: E, found: F) -> Self
    where
        E: Into<String>,
        F: Into<String>,
    {
        Error::Type {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a new repository key error.
    pub fn repository_key<K, S>(key: K, message: S) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        S: Into<String>,
    {
        Error::RepositoryKey {
            key: key.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_error_display() {
        let err = Error::syntax("unexpected element: foo");
        assert_eq!(err.to_string(), "Syntax error: unexpected element: foo");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_schema_error_not_recoverable() {
        let err = Error::schema("required and multiple are exclusive");
        assert_eq!(
            err.to_string(),
            "Schema error: required and multiple are exclusive"
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = Error::type_mismatch("Url", "Date");
        assert_eq!(err.to_string(), "Type error: expected Url, not Date");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_repository_key_error() {
        let err = Error::repository_key(["feeds", ".."], "invalid segment");
        let Error::RepositoryKey { key, message } = &err else {
            unreachable!("Expected RepositoryKey error variant");
        };
        assert_eq!(key, &vec!["feeds".to_string(), "..".to_string()]);
        assert_eq!(message, "invalid segment");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_missing_required_display() {
        let err = Error::MissingRequired {
            element: "Person".to_string(),
            tag: "name".to_string(),
        };
        assert_eq!(err.to_string(), "Person requires <name> but it is missing");
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound {
            path: PathBuf::from("/nonexistent"),
        };
        assert_eq!(err.to_string(), "No such file or directory: /nonexistent");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_error.into();
        assert!(err.to_string().contains("file not found"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("chunk_size must be positive");
        assert_eq!(
            err.to_string(),
            "Configuration error: chunk_size must be positive"
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
