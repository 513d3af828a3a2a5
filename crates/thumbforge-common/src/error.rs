//! Common error types used throughout thumbforge.
//!
//! This module provides a unified error type that covers the failure cases of
//! the derivation cache: spec module loading, record identity, image decoding
//! and encoding, storage I/O, and database access.

/// Common error type for thumbforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested record, spec, or stored file was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The spec module could not be loaded or contains invalid definitions.
    #[error("Unable to load spec module: {0}")]
    SpecModule(String),

    /// The record has no identity and cannot be deleted.
    #[error("{0} can't be deleted because it has no identity")]
    MissingIdentity(String),

    /// Decoding, processing, or encoding an image failed.
    #[error("Image error: {0}")]
    Image(String),

    /// A database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new SpecModule error.
    pub fn spec_module<S: Into<String>>(msg: S) -> Self {
        Self::SpecModule(msg.into())
    }

    /// Create a new MissingIdentity error for the named record type.
    pub fn missing_identity<S: Into<String>>(what: S) -> Self {
        Self::MissingIdentity(what.into())
    }

    /// Create a new Image error.
    pub fn image<S: Into<String>>(msg: S) -> Self {
        Self::Image(msg.into())
    }

    /// Create a new Database error.
    pub fn database<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("record 42");
        assert_eq!(err.to_string(), "Not found: record 42");

        let err = Error::spec_module("specs.toml");
        assert_eq!(err.to_string(), "Unable to load spec module: specs.toml");

        let err = Error::missing_identity("Record");
        assert_eq!(
            err.to_string(),
            "Record can't be deleted because it has no identity"
        );

        let err = Error::image("truncated PNG");
        assert_eq!(err.to_string(), "Image error: truncated PNG");

        let err = Error::database("connection failed");
        assert_eq!(err.to_string(), "Database error: connection failed");

        let err = Error::invalid_input("bad name");
        assert_eq!(err.to_string(), "Invalid input: bad name");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(Error::not_found("x"), Error::NotFound(_)));
        assert!(matches!(Error::spec_module("x"), Error::SpecModule(_)));
        assert!(matches!(
            Error::missing_identity("x"),
            Error::MissingIdentity(_)
        ));
        assert!(matches!(Error::image("x"), Error::Image(_)));
    }
}
