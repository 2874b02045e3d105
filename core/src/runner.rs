//! Async Request Runner
//!
//! Executes one backend call per worker task, off the caller's thread,
//! and reports back over a channel:
//!
//! - zero or more `Progress` ticks, non-decreasing, in 0..=100
//! - exactly one `Finished` event carrying the terminal outcome,
//!   delivered strictly after all ticks
//!
//! True backend progress is unobservable, so the ticks are a
//! deterministic fixed-cadence ramp capped below 100 while the call is
//! in flight; 100 is emitted only on success. On failure the ramp
//! stops wherever it was.
//!
//! The worker never touches caller state. A surface drains events with
//! [`RequestRunner::poll_events`] on its own schedule (once per frame
//! in the TUI); headless callers can [`RequestRunner::wait`] for the
//! outcome instead. There is no cancellation: a started request always
//! runs to its terminal event.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::backend::{ChatBackend, ChatOutcome};
use crate::request::ChatRequest;
use crate::sink::ResponseSink;

/// Cadence of the simulated progress ramp
pub const PROGRESS_CADENCE: Duration = Duration::from_millis(250);

/// Ramp step per tick
const PROGRESS_STEP: u8 = 10;

/// The ramp never passes this while the call is in flight; only a
/// successful outcome reaches 100
const PROGRESS_CEILING: u8 = 90;

/// Lifecycle of one runner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerState {
    /// No request has been started in this slot
    Idle,
    /// The worker is executing the backend call
    Running,
    /// The terminal outcome was a success
    Completed,
    /// The terminal outcome was a failure
    Failed,
}

impl RunnerState {
    /// Whether the runner has delivered its terminal outcome
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Human-readable label for status lines
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Running => "Working...",
            Self::Completed => "Done",
            Self::Failed => "Failed",
        }
    }
}

/// Events delivered from the worker to the observing surface
#[derive(Clone, Debug)]
pub enum RunnerEvent {
    /// Progress tick in 0..=100, non-decreasing within one run
    Progress(u8),
    /// The single terminal outcome of this run
    Finished(ChatOutcome),
}

/// One in-flight (or finished) request
///
/// Created by [`RequestRunner::spawn`]; the worker task it owns runs to
/// completion regardless of whether anyone is still listening.
pub struct RequestRunner {
    rx: mpsc::Receiver<RunnerEvent>,
    state: RunnerState,
    progress: u8,
}

impl RequestRunner {
    /// Start a worker for the given request
    ///
    /// The request is consumed; it is never reused or retried. On
    /// success the response body is written through `sink` before the
    /// terminal event is sent; failures never write.
    pub fn spawn(
        backend: Arc<dyn ChatBackend>,
        request: ChatRequest,
        sink: Option<Arc<dyn ResponseSink>>,
    ) -> Self {
        Self::spawn_with_cadence(backend, request, sink, PROGRESS_CADENCE)
    }

    /// Start a worker with a custom progress cadence (tests use a fast one)
    pub fn spawn_with_cadence(
        backend: Arc<dyn ChatBackend>,
        request: ChatRequest,
        sink: Option<Arc<dyn ResponseSink>>,
        cadence: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(run_request(backend, request, sink, tx, cadence));

        Self {
            rx,
            state: RunnerState::Running,
            progress: 0,
        }
    }

    /// Drain all pending events without blocking
    ///
    /// Applies each event to the runner's observed state (progress
    /// high-water mark, terminal transition) and returns them in
    /// delivery order.
    pub fn poll_events(&mut self) -> Vec<RunnerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            self.apply(&event);
            events.push(event);
        }
        events
    }

    /// Block (asynchronously) until the terminal outcome arrives
    pub async fn wait(mut self) -> ChatOutcome {
        while let Some(event) = self.rx.recv().await {
            self.apply(&event);
            if let RunnerEvent::Finished(outcome) = event {
                return outcome;
            }
        }

        // Channel closed without a terminal event; only possible if the
        // worker was torn down with the runtime.
        ChatOutcome::Failure {
            message: "request worker exited before reporting a result".to_string(),
        }
    }

    fn apply(&mut self, event: &RunnerEvent) {
        match event {
            RunnerEvent::Progress(tick) => {
                self.progress = self.progress.max(*tick);
            }
            RunnerEvent::Finished(outcome) => {
                self.state = if outcome.is_success() {
                    RunnerState::Completed
                } else {
                    RunnerState::Failed
                };
            }
        }
    }

    /// Current lifecycle state as observed through `poll_events`
    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Latest observed progress tick
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Whether the run is still in flight
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == RunnerState::Running
    }
}

/// Error returned when starting a request in a busy slot
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("a request is already running")]
pub struct SlotBusy;

/// A logical request slot holding at most one runner
///
/// Each tab of the UI owns one slot. Starting a new request while one
/// is active is a caller error; the slot refuses it so the invariant
/// holds even if the surface forgets to disable its submit control.
#[derive(Default)]
pub struct RunnerSlot {
    runner: Option<RequestRunner>,
}

impl RunnerSlot {
    /// Create an idle slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request in this slot
    ///
    /// Fails with [`SlotBusy`] if a run is still in flight. A finished
    /// runner is replaced.
    pub fn start(
        &mut self,
        backend: Arc<dyn ChatBackend>,
        request: ChatRequest,
        sink: Option<Arc<dyn ResponseSink>>,
    ) -> Result<(), SlotBusy> {
        if self.is_active() {
            return Err(SlotBusy);
        }
        tracing::debug!(model = %request.model, images = request.images.len(), "starting request");
        self.runner = Some(RequestRunner::spawn(backend, request, sink));
        Ok(())
    }

    /// Drain pending events from the current runner, if any
    pub fn poll_events(&mut self) -> Vec<RunnerEvent> {
        self.runner
            .as_mut()
            .map(RequestRunner::poll_events)
            .unwrap_or_default()
    }

    /// State of the current runner, or `Idle` if none was ever started
    #[must_use]
    pub fn state(&self) -> RunnerState {
        self.runner
            .as_ref()
            .map_or(RunnerState::Idle, RequestRunner::state)
    }

    /// Latest observed progress of the current runner
    #[must_use]
    pub fn progress(&self) -> u8 {
        self.runner.as_ref().map_or(0, RequestRunner::progress)
    }

    /// Whether a run is in flight
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == RunnerState::Running
    }

    /// Drop a finished runner, returning the slot to `Idle`
    ///
    /// No-op while a run is active (there is no cancellation).
    pub fn reset(&mut self) {
        if !self.is_active() {
            self.runner = None;
        }
    }
}

/// Worker body: one backend call, a progress ramp beside it, one
/// terminal event after it
async fn run_request(
    backend: Arc<dyn ChatBackend>,
    request: ChatRequest,
    sink: Option<Arc<dyn ResponseSink>>,
    tx: mpsc::Sender<RunnerEvent>,
    cadence: Duration,
) {
    let send = backend.send(&request);
    tokio::pin!(send);

    let mut ticker = tokio::time::interval(cadence);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut progress: u8 = 0;

    let outcome = loop {
        tokio::select! {
            outcome = &mut send => break outcome,
            _ = ticker.tick() => {
                // Receiver gone means nobody is watching; finish anyway.
                let _ = tx.send(RunnerEvent::Progress(progress)).await;
                progress = (progress + PROGRESS_STEP).min(PROGRESS_CEILING);
            }
        }
    };

    if let ChatOutcome::Success { text } = &outcome {
        if let Some(sink) = &sink {
            if let Err(e) = sink.write(text) {
                tracing::warn!(error = %e, "failed to write response to output file");
            }
        }
        let _ = tx.send(RunnerEvent::Progress(100)).await;
    }

    let _ = tx.send(RunnerEvent::Finished(outcome)).await;
}
