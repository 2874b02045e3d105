//! Backend Error Taxonomy
//!
//! Errors raised while talking to the Ollama daemon. These never cross
//! the [`ChatBackend`](crate::backend::ChatBackend) boundary as `Err`
//! values; the client converts them into `Failure` outcomes whose
//! message names the model and the proximate cause.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during a chat request
#[derive(Debug, Error)]
pub enum ChatError {
    /// The backend could not be reached at all
    #[error("backend unreachable at {endpoint}: {reason}")]
    TransportUnavailable {
        /// The host:port that was attempted
        endpoint: String,
        /// The underlying transport failure
        reason: String,
    },

    /// The backend was reachable but returned an error or malformed reply
    #[error("backend error: {reason}")]
    Service {
        /// What the backend said, or why its reply could not be parsed
        reason: String,
    },

    /// An image attachment could not be read from disk
    #[error("could not read image {path}: {source}")]
    Attachment {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_names_endpoint() {
        let err = ChatError::TransportUnavailable {
            endpoint: "localhost:11434".to_string(),
            reason: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("localhost:11434"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_service_error_carries_reason() {
        let err = ChatError::Service {
            reason: "model 'llava' not found".to_string(),
        };
        assert!(err.to_string().contains("model 'llava' not found"));
    }
}
