//! Headless core for ollama-vision
//!
//! Everything a surface needs to talk to a locally hosted Ollama daemon:
//! - **Backend**: chat requests (optionally with image attachments),
//!   model listing, availability probing
//! - **Runner**: one worker task per request, reporting ordered progress
//!   ticks and exactly one terminal outcome over a channel
//! - **Catalog**: the ordered set of available model identifiers
//! - **Sink**: where a successful response body is written
//!
//! The core is UI-agnostic. A surface (TUI, headless test harness)
//! submits a [`ChatRequest`] through a [`RunnerSlot`] and drains
//! [`RunnerEvent`]s on its own schedule; nothing in here ever blocks
//! the caller's thread on the network.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod request;
pub mod runner;
pub mod sink;

pub use backend::{ChatBackend, ChatOutcome, ModelInfo, OllamaChat};
pub use catalog::ModelCatalog;
pub use config::{AppConfig, BackendSettings, ConfigError};
pub use error::ChatError;
pub use request::{ChatRequest, ImageAttachment, RequestError};
pub use runner::{RequestRunner, RunnerEvent, RunnerSlot, RunnerState, SlotBusy};
pub use sink::{FileSink, ResponseSink, DEFAULT_OUTPUT_FILE};
