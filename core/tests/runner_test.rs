//! Integration Tests for the Request Lifecycle
//!
//! Drives the runner the way a surface does: validate input, start a
//! request in a slot, drain events once per "frame", re-enable on the
//! terminal outcome. Uses a configurable mock backend so failure paths
//! are exercised without a live Ollama daemon.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vision_core::{
    ChatBackend, ChatOutcome, ChatRequest, ModelInfo, RequestError, ResponseSink, RunnerEvent,
    RunnerSlot, RunnerState,
};

/// Configuration for error injection in the mock backend
#[derive(Clone, Debug, Default)]
struct ErrorInjectionConfig {
    /// If true, all requests fail with `error_message`
    fail_all_requests: bool,
    /// Failure message to return
    error_message: String,
    /// If true, the probe reports the backend as unreachable
    probe_fails: bool,
}

/// A configurable mock backend
struct MockBackend {
    /// Count of chat requests made
    request_count: AtomicUsize,
    /// Simulated backend latency
    latency: Duration,
    /// Reply text on success
    reply: String,
    /// Error injection configuration
    errors: ErrorInjectionConfig,
    /// Models the backend reports
    models: Vec<String>,
}

impl MockBackend {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            request_count: AtomicUsize::new(0),
            latency: Duration::from_millis(20),
            reply: reply.to_string(),
            errors: ErrorInjectionConfig::default(),
            models: vec!["llama3.2".to_string(), "llava".to_string()],
        })
    }

    fn with_errors(errors: ErrorInjectionConfig) -> Arc<Self> {
        Arc::new(Self {
            request_count: AtomicUsize::new(0),
            latency: Duration::from_millis(20),
            reply: String::new(),
            errors,
            models: Vec::new(),
        })
    }

    fn requests(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn probe(&self) -> bool {
        !self.errors.probe_fails
    }

    async fn send(&self, request: &ChatRequest) -> ChatOutcome {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;

        if self.errors.fail_all_requests {
            ChatOutcome::Failure {
                message: format!(
                    "Could not get response from {}: {}",
                    request.model, self.errors.error_message
                ),
            }
        } else {
            ChatOutcome::Success {
                text: self.reply.clone(),
            }
        }
    }

    async fn list_models(&self) -> Vec<ModelInfo> {
        self.models
            .iter()
            .map(|name| ModelInfo {
                name: name.clone(),
                size: None,
                parameter_size: None,
            })
            .collect()
    }
}

/// Sink capturing writes in memory
#[derive(Default)]
struct MemorySink(Mutex<Vec<String>>);

impl ResponseSink for MemorySink {
    fn write(&self, text: &str) -> std::io::Result<()> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Drive a slot to its terminal state the way the UI frame loop does,
/// collecting events in order
async fn run_to_terminal(slot: &mut RunnerSlot) -> Vec<RunnerEvent> {
    let mut events = Vec::new();
    while slot.is_active() {
        events.extend(slot.poll_events());
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    events.extend(slot.poll_events());
    events
}

#[tokio::test(start_paused = true)]
async fn full_prompt_flow_success() {
    let backend = MockBackend::replying("Hello there!");
    let sink = Arc::new(MemorySink::default());
    let mut slot = RunnerSlot::new();

    let request = ChatRequest::new("Say hi", "llama3.2")
        .unwrap()
        .with_system("Be brief");
    slot.start(backend.clone(), request, Some(sink.clone()))
        .unwrap();

    let events = run_to_terminal(&mut slot).await;

    assert_eq!(slot.state(), RunnerState::Completed);
    assert_eq!(slot.progress(), 100);
    assert_eq!(backend.requests(), 1);
    assert_eq!(*sink.0.lock().unwrap(), vec!["Hello there!".to_string()]);

    // Terminal event is last and unique
    let terminals: Vec<_> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, RunnerEvent::Finished(_)))
        .collect();
    assert_eq!(terminals.len(), 1);
    assert_eq!(terminals[0].0, events.len() - 1);
}

#[tokio::test(start_paused = true)]
async fn injected_failure_reaches_ui_as_failure_outcome() {
    let backend = MockBackend::with_errors(ErrorInjectionConfig {
        fail_all_requests: true,
        error_message: "model runner crashed".to_string(),
        probe_fails: false,
    });
    let sink = Arc::new(MemorySink::default());
    let mut slot = RunnerSlot::new();

    let request = ChatRequest::new("Say hi", "llama3.2").unwrap();
    slot.start(backend, request, Some(sink.clone())).unwrap();

    let events = run_to_terminal(&mut slot).await;

    assert_eq!(slot.state(), RunnerState::Failed);
    assert!(slot.progress() < 100);
    assert!(sink.0.lock().unwrap().is_empty(), "failures must not write");

    match events.last() {
        Some(RunnerEvent::Finished(ChatOutcome::Failure { message })) => {
            assert!(message.contains("llama3.2"));
            assert!(message.contains("model runner crashed"));
        }
        other => panic!("expected a failure outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_probe_and_empty_catalog() {
    let backend = MockBackend::with_errors(ErrorInjectionConfig {
        fail_all_requests: true,
        error_message: "connection refused".to_string(),
        probe_fails: true,
    });

    // Startup check: a warning, not an error
    assert!(!backend.probe().await);

    // Empty catalog is the placeholder signal
    assert!(backend.list_models().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn invalid_input_never_reaches_the_backend() {
    let backend = MockBackend::replying("unused");

    // Empty message with a model selected
    assert_eq!(
        ChatRequest::new("", "llama3.2").unwrap_err(),
        RequestError::EmptyMessage
    );
    // No model selected
    assert_eq!(
        ChatRequest::new("Say hi", "").unwrap_err(),
        RequestError::MissingModel
    );

    // No request was constructed, so no worker ran
    assert_eq!(backend.requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn two_slots_run_independently() {
    let backend = MockBackend::replying("done");
    let mut prompt_slot = RunnerSlot::new();
    let mut vision_slot = RunnerSlot::new();

    prompt_slot
        .start(
            backend.clone(),
            ChatRequest::new("Say hi", "llama3.2").unwrap(),
            None,
        )
        .unwrap();
    vision_slot
        .start(
            backend.clone(),
            ChatRequest::new("Extract text from this image:", "llava").unwrap(),
            None,
        )
        .unwrap();

    // One in-flight request per slot, concurrently
    assert!(prompt_slot.is_active());
    assert!(vision_slot.is_active());

    run_to_terminal(&mut prompt_slot).await;
    run_to_terminal(&mut vision_slot).await;

    assert_eq!(prompt_slot.state(), RunnerState::Completed);
    assert_eq!(vision_slot.state(), RunnerState::Completed);
    assert_eq!(backend.requests(), 2);
}
