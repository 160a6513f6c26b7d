//! Server errors.

use std::net::{AddrParseError, SocketAddr};

/// Failures starting or running the server.
///
/// Errors inside a single request never surface here; they are rendered as
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured address does not parse.
    #[error("invalid address {addr:?}: {source}")]
    InvalidAddress {
        /// The configured address.
        addr: String,
        /// Parse failure.
        #[source]
        source: AddrParseError,
    },

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The address.
        addr: SocketAddr,
        /// Bind failure.
        #[source]
        source: std::io::Error,
    },

    /// Other listener I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let source = "nope".parse::<SocketAddr>().unwrap_err();
        let err = ServerError::InvalidAddress {
            addr: "nope".into(),
            source,
        };
        assert!(err.to_string().starts_with("invalid address \"nope\""));

        let err = ServerError::from(std::io::Error::other("reset"));
        assert_eq!(err.to_string(), "I/O error: reset");
    }
}
