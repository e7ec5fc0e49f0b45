//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Background prediction via the assessment worker

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};

use crate::adapters::artifact::FsArtifactStore;
use crate::application::{AssessmentService, PredictorGateway};
use crate::config::Config;
use crate::domain::OutputMode;
use crate::tui::styles::MedicalTheme;

use super::ui::{
    questionnaire::{render_questionnaire, QuestionnaireState},
    render_disclaimer,
    result::{render_result, ResultState},
};
use super::worker::{AssessmentProgress, AssessmentWorker, AssessmentWorkerHandle};

/// Current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Questionnaire,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    LoadingModel,
    Predicting,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,
    service: Arc<AssessmentService<FsArtifactStore>>,
    /// Shown in the status bar.
    model_dir: String,
    form: QuestionnaireState,
    result: ResultState,
    pending_worker: Option<AssessmentWorkerHandle>,
    /// Current worker phase and when it started (for the progress animation)
    phase: Option<(Phase, Instant)>,
}

impl App {
    /// Create the application from runtime configuration.
    ///
    /// Artifacts are loaded lazily on the first submission per horizon.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        if !config.model_dir.is_dir() {
            tracing::warn!(
                "Model directory {:?} not found; predictions will fail until MYOPIA_MODEL_DIR points at the artifacts",
                config.model_dir
            );
        }

        let store = Arc::new(FsArtifactStore::from_config(config));
        let gateway = PredictorGateway::new(store).with_cache(config.cache_models);
        let service = Arc::new(AssessmentService::new(gateway, config.output_mode));

        Self::with_service(service, config.model_dir.display().to_string())
    }

    /// Create application with an injected service (Composition Root pattern).
    #[must_use]
    pub fn with_service(
        service: Arc<AssessmentService<FsArtifactStore>>,
        model_dir: String,
    ) -> Self {
        Self {
            screen: Screen::Questionnaire,
            should_quit: false,
            service,
            model_dir,
            form: QuestionnaireState::default(),
            result: ResultState::default(),
            pending_worker: None,
            phase: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore the terminal even if the loop failed.
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_worker();
            self.tick_progress();

            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(1),
                        Constraint::Min(0),
                        Constraint::Length(3),
                    ])
                    .split(f.area());

                self.render_status_bar(f, chunks[0]);
                match self.screen {
                    Screen::Questionnaire => render_questionnaire(f, chunks[1], &self.form),
                    Screen::Result => render_result(f, chunks[1], &self.result),
                }
                render_disclaimer(f, chunks[2]);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let mode = match self.service.output_mode() {
            OutputMode::Probability => "probability",
            OutputMode::Label => "label",
        };
        let bar = Paragraph::new(Line::from(vec![
            Span::styled(" Myopia Risk ", MedicalTheme::header()),
            Span::styled(
                format!(" models: {} │ output: {mode}", self.model_dir),
                MedicalTheme::text_secondary(),
            ),
        ]));
        f.render_widget(bar, area);
    }

    /// Drain progress messages from the background worker.
    fn poll_worker(&mut self) {
        while let Some(progress) = self
            .pending_worker
            .as_ref()
            .and_then(AssessmentWorkerHandle::try_recv)
        {
            match progress {
                AssessmentProgress::LoadingModel(horizon) => {
                    tracing::debug!("Worker loading {horizon} model");
                    self.set_phase(Phase::LoadingModel);
                }
                AssessmentProgress::Predicting => self.set_phase(Phase::Predicting),
                AssessmentProgress::Complete(assessment) => {
                    self.result = ResultState::Complete { assessment };
                    self.finish_worker();
                }
                AssessmentProgress::Error(message) => {
                    self.result = ResultState::Error { message };
                    self.finish_worker();
                }
            }
        }
    }

    fn finish_worker(&mut self) {
        self.pending_worker = None;
        self.phase = None;
    }

    fn set_phase(&mut self, phase: Phase) {
        let floor = match phase {
            Phase::LoadingModel => 0.0,
            Phase::Predicting => 0.6,
        };
        let progress = self.result.progress().unwrap_or(0.0).max(floor);
        self.phase = Some((phase, Instant::now()));
        self.result = match phase {
            Phase::LoadingModel => ResultState::LoadingModel { progress },
            Phase::Predicting => ResultState::Predicting { progress },
        };
    }

    /// Smooth, monotonic progress that approaches the phase target.
    fn tick_progress(&mut self) {
        let Some((phase, started_at)) = self.phase else {
            return;
        };
        let Some(current) = self.result.progress() else {
            return;
        };

        let (floor, target, tau) = match phase {
            Phase::LoadingModel => (0.02, 0.6, 1.5),
            Phase::Predicting => (0.6, 0.98, 0.5),
        };
        let elapsed = Instant::now()
            .saturating_duration_since(started_at)
            .as_secs_f64();
        let k = 1.0 - (-elapsed / tau).exp();
        let progress = (floor + (target - floor) * k).max(current).min(target);

        self.result = match phase {
            Phase::LoadingModel => ResultState::LoadingModel { progress },
            Phase::Predicting => ResultState::Predicting { progress },
        };
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Questionnaire => self.handle_questionnaire_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_questionnaire_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::BackTab => self.form.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form.next_field(),
            KeyCode::Left => self.form.cycle_prev(),
            KeyCode::Right | KeyCode::Char(' ') => self.form.cycle_next(),
            KeyCode::Char('s') | KeyCode::Char('S') => self.form.load_sample_data(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char(c) => self.form.input_char(c),
            KeyCode::Backspace => self.form.delete_char(),
            KeyCode::Delete => self.form.clear_field(),
            KeyCode::Esc => self.form = QuestionnaireState::default(),
            KeyCode::Enter => self.submit(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match &self.result {
            ResultState::Complete { .. } | ResultState::Error { .. } => match key {
                KeyCode::Enter | KeyCode::Esc => self.screen = Screen::Questionnaire,
                KeyCode::Char('n') | KeyCode::Char('N') => {
                    self.form = QuestionnaireState::default();
                    self.screen = Screen::Questionnaire;
                }
                KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
                _ => {}
            },
            _ => {}
        }
    }

    /// Validate on the UI thread; only a complete record reaches the worker.
    fn submit(&mut self) {
        let submission = match self.form.to_submission() {
            Ok(submission) => submission,
            Err(e) => {
                self.form.error_message = Some(e.to_string());
                return;
            }
        };

        match self.service.validate_and_encode(&submission) {
            Ok(record) => {
                self.form.error_message = None;
                self.screen = Screen::Result;
                self.result = ResultState::LoadingModel { progress: 0.0 };
                self.phase = Some((Phase::LoadingModel, Instant::now()));
                self.pending_worker = Some(AssessmentWorker::spawn(
                    Arc::clone(&self.service),
                    record,
                ));
            }
            Err(e) => {
                tracing::debug!("Form rejected: {} missing, {} invalid", e.missing.len(), e.invalid.len());
                self.form.error_message = Some(e.to_string());
            }
        }
    }
}
