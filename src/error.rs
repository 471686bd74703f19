//! Crate-wide error type
//!
//! Only the boundary produces these: loading configuration, binding the
//! listener, writing to a viewer's transport. Catching and fan-out never fail.

use thiserror::Error;

/// Errors raised by the server boundary
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration value is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A viewer transport rejected a write
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        fn open() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy"))?;
            Ok(())
        }

        let err = open().unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: busy");
    }

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("http_port out of range".into());
        assert_eq!(err.to_string(), "Configuration error: http_port out of range");
    }
}
