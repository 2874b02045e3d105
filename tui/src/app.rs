//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize)
//! - Per-tab runner slots for in-flight requests
//! - Rendering via `ui::draw`
//!
//! # Concurrency
//!
//! The UI thread never performs a backend call. Submitting hands a
//! validated request to a `RunnerSlot`, which spawns one worker task;
//! each frame the app drains that slot's events and updates what it
//! shows. At most one request is in flight per tab: submission is
//! ignored while a slot is active, and the slot itself refuses a
//! second start.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use vision_core::{
    AppConfig, ChatBackend, ChatRequest, FileSink, ImageAttachment, ModelCatalog, OllamaChat,
    RunnerEvent, RunnerSlot, RunnerState,
};

/// Which tab is focused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    /// Free-form chat
    Prompt,
    /// Image-to-text
    Vision,
}

impl Tab {
    /// Tab titles in display order
    pub const TITLES: [&'static str; 2] = ["Prompt", "Vision"];

    /// Position in the tab bar
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Prompt => 0,
            Self::Vision => 1,
        }
    }

    /// The other tab
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Prompt => Self::Vision,
            Self::Vision => Self::Prompt,
        }
    }
}

/// Per-tab request state: one slot, one result pane, one model pick
pub(crate) struct SlotView {
    /// Index into the shared model catalog
    pub model_index: usize,
    /// The tab's single request slot
    pub slot: RunnerSlot,
    /// Latest terminal outcome text (success or failure message)
    pub result: String,
    /// Validation or status notice for this tab
    pub notice: Option<String>,
}

impl SlotView {
    fn new() -> Self {
        Self {
            model_index: 0,
            slot: RunnerSlot::new(),
            result: String::new(),
            notice: None,
        }
    }

    /// Drain pending runner events into the view
    fn absorb_events(&mut self) {
        for event in self.slot.poll_events() {
            if let RunnerEvent::Finished(outcome) = event {
                self.result = outcome.display_text().to_string();
            }
        }
    }
}

/// State of the Prompt tab
pub(crate) struct PromptTab {
    pub view: SlotView,
    /// Question input buffer
    pub question: String,
    /// System instruction buffer
    pub system: String,
    /// Whether the system instruction input is visible
    pub show_system: bool,
    /// Whether typing currently edits the system instruction
    pub editing_system: bool,
}

/// State of the Vision tab
pub(crate) struct VisionTab {
    pub view: SlotView,
    /// Path to the image on disk (the terminal stand-in for drag/drop)
    pub image_path: String,
}

/// Main application state
pub struct App {
    running: bool,
    pub(crate) config: AppConfig,
    backend: Arc<dyn ChatBackend>,
    sink: Arc<FileSink>,
    /// host:port for the startup warning
    endpoint: String,
    pub(crate) catalog: ModelCatalog,
    pub(crate) active_tab: Tab,
    pub(crate) prompt: PromptTab,
    pub(crate) vision: VisionTab,
    /// One-shot startup warning when the backend is unreachable
    pub(crate) backend_warning: Option<String>,
}

impl App {
    /// Create an App from the on-disk configuration
    #[must_use]
    pub fn new() -> Self {
        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            AppConfig::default()
        });
        let backend = Arc::new(OllamaChat::new(&config.backend));
        Self::assemble(config, backend)
    }

    /// Wire up an App around any backend (tests inject mocks here)
    pub(crate) fn assemble(config: AppConfig, backend: Arc<dyn ChatBackend>) -> Self {
        let endpoint = format!("{}:{}", config.backend.host, config.backend.port);
        let sink = Arc::new(FileSink::new(config.output_file.clone()));

        Self {
            running: true,
            config,
            backend,
            sink,
            endpoint,
            catalog: ModelCatalog::new(),
            active_tab: Tab::Prompt,
            prompt: PromptTab {
                view: SlotView::new(),
                question: String::new(),
                system: String::new(),
                show_system: false,
                editing_system: false,
            },
            vision: VisionTab {
                view: SlotView::new(),
                image_path: String::new(),
            },
            backend_warning: None,
        }
    }

    /// One-shot startup: probe availability, load the model catalog
    ///
    /// An unreachable backend is a warning, not an error; the user can
    /// still submit and will get a failure outcome.
    pub(crate) async fn startup(&mut self) {
        if !self.backend.probe().await {
            self.backend_warning = Some(format!(
                "Ollama does not seem to be running at {}. Start it and press F5 to reload models.",
                self.endpoint
            ));
        }
        self.reload_models().await;
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        let frame_duration = Duration::from_millis(100);
        let mut event_stream = EventStream::new();

        self.startup().await;
        self.render(terminal)?;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        match event {
                            // Only handle Press events (not Release or Repeat)
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key(key).await;
                            }
                            _ => {}
                        }
                    }
                }

                _ = tokio::time::sleep(Duration::from_millis(16)) => {}
            }

            self.poll_runners();
            self.render(terminal)?;

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration {
                tokio::time::sleep(frame_duration - elapsed).await;
            }
        }

        Ok(())
    }

    /// Drain runner events for both tabs
    pub(crate) fn poll_runners(&mut self) {
        self.prompt.view.absorb_events();
        self.vision.view.absorb_events();
    }

    /// Handle keyboard input
    async fn handle_key(&mut self, key: event::KeyEvent) {
        match key.code {
            KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
            }

            KeyCode::Tab => {
                self.active_tab = self.active_tab.next();
            }

            KeyCode::Enter => self.submit_active(),

            KeyCode::Up => self.cycle_model(-1),
            KeyCode::Down => self.cycle_model(1),

            // Toggle system instruction visibility (Prompt tab)
            KeyCode::F(2) if self.active_tab == Tab::Prompt => {
                self.prompt.show_system = !self.prompt.show_system;
                if !self.prompt.show_system {
                    self.prompt.editing_system = false;
                }
            }
            // Switch typing between system instruction and question
            KeyCode::Char('e')
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && self.active_tab == Tab::Prompt
                    && self.prompt.show_system =>
            {
                self.prompt.editing_system = !self.prompt.editing_system;
            }

            KeyCode::F(5) => self.reload_models().await,

            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.reset_active_tab();
            }

            KeyCode::Char(c) => self.active_input_mut().push(c),
            KeyCode::Backspace => {
                self.active_input_mut().pop();
            }

            _ => {}
        }
    }

    /// The buffer that currently receives typing
    fn active_input_mut(&mut self) -> &mut String {
        match self.active_tab {
            Tab::Prompt if self.prompt.show_system && self.prompt.editing_system => {
                &mut self.prompt.system
            }
            Tab::Prompt => &mut self.prompt.question,
            Tab::Vision => &mut self.vision.image_path,
        }
    }

    fn submit_active(&mut self) {
        match self.active_tab {
            Tab::Prompt => self.submit_prompt(),
            Tab::Vision => self.submit_vision(),
        }
    }

    /// Submit the Prompt tab's question
    pub(crate) fn submit_prompt(&mut self) {
        // Submission is disabled while a run is in flight
        if self.prompt.view.slot.is_active() {
            return;
        }

        let Some(model) = self.selected_model(self.prompt.view.model_index) else {
            self.prompt.view.notice = Some("No models available".to_string());
            return;
        };

        match ChatRequest::new(self.prompt.question.clone(), model) {
            Ok(request) => {
                let request = request.with_system(self.prompt.system.clone());
                self.prompt.view.result.clear();
                self.prompt.view.notice = None;
                if let Err(e) = self.prompt.view.slot.start(
                    self.backend.clone(),
                    request,
                    Some(self.sink.clone()),
                ) {
                    self.prompt.view.notice = Some(e.to_string());
                }
            }
            // Invalid input: no request was constructed, no worker starts
            Err(e) => self.prompt.view.notice = Some(e.to_string()),
        }
    }

    /// Submit the Vision tab's image
    pub(crate) fn submit_vision(&mut self) {
        if self.vision.view.slot.is_active() {
            return;
        }

        let Some(model) = self.selected_model(self.vision.view.model_index) else {
            self.vision.view.notice = Some("No models available".to_string());
            return;
        };

        let path = self.vision.image_path.trim().to_string();
        if path.is_empty() {
            self.vision.view.notice = Some("Enter an image path first".to_string());
            return;
        }
        if !std::path::Path::new(&path).exists() {
            self.vision.view.notice = Some(format!("No such file: {path}"));
            return;
        }

        match ChatRequest::new(self.config.vision_prompt.clone(), model) {
            Ok(request) => {
                let request = request.with_image(ImageAttachment::Path(path.into()));
                self.vision.view.result.clear();
                self.vision.view.notice = None;
                if let Err(e) = self.vision.view.slot.start(
                    self.backend.clone(),
                    request,
                    Some(self.sink.clone()),
                ) {
                    self.vision.view.notice = Some(e.to_string());
                }
            }
            Err(e) => self.vision.view.notice = Some(e.to_string()),
        }
    }

    fn selected_model(&self, index: usize) -> Option<String> {
        self.catalog.get(index).map(str::to_string)
    }

    /// Move the active tab's model selection
    pub(crate) fn cycle_model(&mut self, delta: isize) {
        let len = self.catalog.len();
        if len == 0 {
            return;
        }
        let view = match self.active_tab {
            Tab::Prompt => &mut self.prompt.view,
            Tab::Vision => &mut self.vision.view,
        };
        let len = len as isize;
        let next = (view.model_index as isize + delta).rem_euclid(len);
        view.model_index = next as usize;
    }

    /// Refresh the model catalog and clamp selections
    pub(crate) async fn reload_models(&mut self) {
        self.catalog.refresh(self.backend.as_ref()).await;
        let len = self.catalog.len();
        for view in [&mut self.prompt.view, &mut self.vision.view] {
            if view.model_index >= len {
                view.model_index = 0;
            }
        }
    }

    /// Clear the active tab's inputs and result
    ///
    /// A live runner is left alone; there is no cancellation.
    fn reset_active_tab(&mut self) {
        match self.active_tab {
            Tab::Prompt => {
                self.prompt.question.clear();
                self.prompt.system.clear();
                self.prompt.view.result.clear();
                self.prompt.view.notice = None;
                self.prompt.view.slot.reset();
            }
            Tab::Vision => {
                self.vision.image_path.clear();
                self.vision.view.result.clear();
                self.vision.view.notice = None;
                self.vision.view.slot.reset();
            }
        }
    }

    /// Render the UI
    fn render(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        terminal.draw(|frame| crate::ui::draw(frame, self))?;
        Ok(())
    }

    /// Status-line description of the active tab's slot
    pub(crate) fn active_state(&self) -> RunnerState {
        match self.active_tab {
            Tab::Prompt => self.prompt.view.slot.state(),
            Tab::Vision => self.vision.view.slot.state(),
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
