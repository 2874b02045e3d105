//! Chat Request Model
//!
//! A [`ChatRequest`] is created per user action, consumed by exactly one
//! runner invocation, and discarded once its terminal outcome has been
//! delivered. Validation happens at construction: an empty message or a
//! missing model identifier is rejected before any request object
//! exists, so no worker ever starts for invalid input.

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Input validation errors, caught before any worker starts
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// The user message was empty or whitespace-only
    #[error("please enter a message")]
    EmptyMessage,

    /// No model identifier was supplied
    #[error("please select a model")]
    MissingModel,
}

/// An image payload attached to a chat request
///
/// Either a path resolved at send time or bytes already in memory
/// (e.g. pasted from a clipboard by the surface).
#[derive(Clone, Debug)]
pub enum ImageAttachment {
    /// Image on disk, read when the request is sent
    Path(PathBuf),
    /// Image already in memory
    Bytes(Vec<u8>),
}

impl ImageAttachment {
    /// Encode the attachment as base64 for the Ollama chat API
    pub fn encode(&self) -> std::io::Result<String> {
        match self {
            Self::Path(path) => {
                let bytes = std::fs::read(path)?;
                Ok(STANDARD.encode(bytes))
            }
            Self::Bytes(bytes) => Ok(STANDARD.encode(bytes)),
        }
    }

    /// A short description for error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

/// One chat request, immutable once built
#[derive(Clone, Debug)]
pub struct ChatRequest {
    /// User message
    pub message: String,
    /// Target model identifier
    pub model: String,
    /// Optional system instruction, prepended to the message list
    pub system: Option<String>,
    /// Zero or more image attachments
    pub images: Vec<ImageAttachment>,
}

impl ChatRequest {
    /// Create a validated request
    ///
    /// Returns [`RequestError`] if the message is empty or no model is
    /// given; in that case no request is constructed.
    pub fn new(
        message: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let message = message.into();
        let model = model.into();

        if model.trim().is_empty() {
            return Err(RequestError::MissingModel);
        }
        if message.trim().is_empty() {
            return Err(RequestError::EmptyMessage);
        }

        Ok(Self {
            message,
            model,
            system: None,
            images: Vec::new(),
        })
    }

    /// Set the system instruction
    ///
    /// An empty or whitespace-only instruction is treated as absent.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        self.system = if system.trim().is_empty() {
            None
        } else {
            Some(system)
        };
        self
    }

    /// Attach an image
    #[must_use]
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.images.push(image);
        self
    }

    /// Whether the request carries image attachments
    #[must_use]
    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new("Hello", "llama3.2")
            .unwrap()
            .with_system("Be helpful")
            .with_image(ImageAttachment::Bytes(vec![1, 2, 3]));

        assert_eq!(request.message, "Hello");
        assert_eq!(request.model, "llama3.2");
        assert_eq!(request.system, Some("Be helpful".to_string()));
        assert!(request.has_images());
    }

    #[test]
    fn test_empty_message_rejected() {
        assert_eq!(
            ChatRequest::new("", "llama3.2").unwrap_err(),
            RequestError::EmptyMessage
        );
        assert_eq!(
            ChatRequest::new("   \n", "llama3.2").unwrap_err(),
            RequestError::EmptyMessage
        );
    }

    #[test]
    fn test_missing_model_rejected() {
        // Model selection is checked before the message
        assert_eq!(
            ChatRequest::new("Hello", "").unwrap_err(),
            RequestError::MissingModel
        );
        assert_eq!(
            ChatRequest::new("", "").unwrap_err(),
            RequestError::MissingModel
        );
    }

    #[test]
    fn test_blank_system_is_absent() {
        let request = ChatRequest::new("Hello", "llama3.2")
            .unwrap()
            .with_system("  ");
        assert_eq!(request.system, None);
    }

    #[test]
    fn test_image_encoding() {
        let image = ImageAttachment::Bytes(vec![0xFF, 0xD8, 0xFF]);
        // JPEG magic bytes in base64
        assert_eq!(image.encode().unwrap(), "/9j/");
    }

    #[test]
    fn test_missing_image_file() {
        let image = ImageAttachment::Path(PathBuf::from("/nonexistent/cat.jpg"));
        assert!(image.encode().is_err());
    }
}
