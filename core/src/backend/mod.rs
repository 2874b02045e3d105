//! Chat Backend
//!
//! Trait definitions for the inference backend. The abstraction keeps
//! the runner and the surfaces independent of the concrete provider:
//! production uses [`OllamaChat`], tests use mock implementations.
//!
//! # Contract
//!
//! - [`ChatBackend::send`] is infallible at the signature level: every
//!   transport, protocol, or service error is folded into a
//!   [`ChatOutcome::Failure`] value. Exactly one outcome per request.
//! - [`ChatBackend::list_models`] returns an empty list when the
//!   backend is unreachable or replies with garbage. Callers treat
//!   empty as "show a placeholder", never as fatal.
//! - [`ChatBackend::probe`] is a cheap reachability check (TCP connect
//!   with a short timeout), used once at startup for a non-fatal
//!   warning.

mod ollama;

pub use ollama::OllamaChat;

use async_trait::async_trait;

use crate::request::ChatRequest;

/// The terminal result of one chat request
///
/// Exactly one of these is produced per request, never both, never
/// neither.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The backend replied with text
    Success {
        /// The reply body
        text: String,
    },
    /// The request failed; the message is ready for display
    Failure {
        /// Human-readable failure description naming the model and cause
        message: String,
    },
}

impl ChatOutcome {
    /// Whether this outcome is a success
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The text to present to the user, success or failure
    #[must_use]
    pub fn display_text(&self) -> &str {
        match self {
            Self::Success { text } => text,
            Self::Failure { message } => message,
        }
    }
}

/// Information about an available model
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model identifier (e.g. "llava:latest")
    pub name: String,
    /// Model size in bytes, if reported
    pub size: Option<u64>,
    /// Parameter count (e.g. "7B"), if reported
    pub parameter_size: Option<String>,
}

/// Inference backend trait
///
/// Implementations handle provider-specific wire details; the rest of
/// the crate only sees requests and outcomes.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name for logs and status lines (e.g. "Ollama")
    fn name(&self) -> &str;

    /// Check whether the backend is reachable at all
    ///
    /// A plain TCP connect with a short timeout. Intended as a one-shot
    /// startup check; an unreachable backend is a warning, not an error.
    async fn probe(&self) -> bool;

    /// Send a chat request and wait for its single terminal outcome
    ///
    /// Never returns an error: failures arrive as
    /// [`ChatOutcome::Failure`] values.
    async fn send(&self, request: &ChatRequest) -> ChatOutcome;

    /// List available models
    ///
    /// Returns an empty list (not an error) when the backend is
    /// unreachable or the reply cannot be parsed.
    async fn list_models(&self) -> Vec<ModelInfo>;
}
