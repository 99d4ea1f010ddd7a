//! Error types for the chat protocol library.
//!
//! Nothing in here is fatal. Decoding never fails on untrusted input
//! (malformed pieces are skipped or classified as unexpected), transport
//! errors trigger a reconnect and catalog errors disable catalog emotes
//! for the session.

use thiserror::Error;

/// Errors raised while framing lines on a transport.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// Line exceeded maximum allowed length.
    #[error("line too long: {0} bytes")]
    LineTooLong(usize),
}

/// Errors produced while decoding a single tag pair.
///
/// These never abort decoding of a line; the offending pair is skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TagError {
    /// The pair had no `=` separator.
    #[error("malformed tag: {0:?}")]
    Malformed(String),
}

/// Errors encountered while loading the external emote catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// The HTTP request itself failed.
    #[cfg(feature = "catalog-fetch")]
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("catalog request returned status {0}")]
    Status(u16),

    /// The document did not have the expected shape.
    #[error("catalog document has unexpected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Errors encountered while loading a session configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration was not valid JSON for [`SessionConfig`](crate::config::SessionConfig).
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field was empty.
    #[error("missing required field: {0}")]
    Missing(&'static str),
}

/// Errors returned by the session command surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    /// The session has been closed; nothing more will be sent.
    #[error("session is closed")]
    Closed,

    /// `start` was called on a session that is already running.
    #[error("session already started")]
    AlreadyStarted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProtocolError::LineTooLong(1024);
        assert_eq!(format!("{}", err), "line too long: 1024 bytes");

        let err = TagError::Malformed("oops".to_string());
        assert_eq!(format!("{}", err), "malformed tag: \"oops\"");

        assert_eq!(SessionError::Closed.to_string(), "session is closed");
    }

    #[test]
    fn test_error_conversion() {
        let io_err =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let protocol_err: ProtocolError = io_err.into();
        match protocol_err {
            ProtocolError::Io(_) => {}
            _ => panic!("Expected Io variant"),
        }

        let utf8_err = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let protocol_err: ProtocolError = utf8_err.into();
        match protocol_err {
            ProtocolError::Decode(_) => {}
            _ => panic!("Expected Decode variant"),
        }
    }

    #[test]
    fn test_catalog_shape_error_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CatalogError = json_err.into();
        assert!(matches!(err, CatalogError::Shape(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
