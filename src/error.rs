//! Error types
//!
//! Setup-time failures: bad roots, bad configuration values, and mime
//! table loading problems. Request-time I/O errors never surface here;
//! they become 500 responses inside the handler.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocRootError {
    #[error("document root requires a readable directory: '{0}'")]
    InvalidRoot(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read mime file '{path}': {source}")]
    MimeFileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no mime associations found in '{0}'")]
    MimeFileEmpty(String),

    #[error("handler already started")]
    AlreadyStarted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = DocRootError::InvalidRoot("/no/such/dir".to_string());
        assert!(err.to_string().contains("/no/such/dir"));

        let err = DocRootError::MimeFileEmpty("empty.types".to_string());
        assert!(err.to_string().contains("empty.types"));
    }
}
