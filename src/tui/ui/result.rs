//! Assessment progress and result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
    Frame,
};

use crate::application::Assessment;
use crate::domain::{Outcome, RiskLevel};
use crate::tui::styles::MedicalTheme;

/// Result screen state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    /// Not started
    #[default]
    Idle,
    /// Loading the artifact for the selected horizon
    LoadingModel { progress: f64 },
    /// Running the classifier
    Predicting { progress: f64 },
    /// Completed with result
    Complete { assessment: Box<Assessment> },
    /// Error occurred
    Error { message: String },
}

impl ResultState {
    /// Progress fraction while the worker runs.
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        match self {
            Self::LoadingModel { progress } | Self::Predicting { progress } => Some(*progress),
            _ => None,
        }
    }
}

/// Render the assessment view
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0], state);
    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::LoadingModel { progress } => render_progress(
            f,
            chunks[1],
            "Loading model",
            *progress,
            "Reading the classifier for the selected horizon...",
        ),
        ResultState::Predicting { progress } => {
            render_progress(f, chunks[1], "Predicting", *progress, "Scoring the answers...")
        }
        ResultState::Complete { assessment } => render_assessment(f, chunks[1], assessment),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2], state);
}

fn render_result_header(f: &mut Frame, area: Rect, state: &ResultState) {
    let horizon = match state {
        ResultState::Complete { assessment } => format!(" │ {} horizon", assessment.horizon()),
        _ => String::new(),
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Myopia Risk Assessment", MedicalTheme::title()),
        Span::styled(horizon, MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Complete the questionnaire to begin",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_progress(f: &mut Frame, area: Rect, stage: &str, progress: f64, description: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .margin(2)
        .split(area);

    let stage_text = Paragraph::new(Line::from(vec![
        Span::styled("Stage: ", MedicalTheme::text_secondary()),
        Span::styled(stage, MedicalTheme::focused()),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(stage_text, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::info())
        .ratio(progress.clamp(0.0, 1.0))
        .label(format!("{:.0}%", progress * 100.0));
    f.render_widget(gauge, chunks[1]);

    let desc = Paragraph::new(Line::from(Span::styled(
        description,
        MedicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(desc, chunks[2]);
}

fn render_assessment(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_input_row(f, columns[0], assessment);
    render_prediction(f, columns[1], assessment);
}

fn render_input_row(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let rows: Vec<Row> = assessment
        .input_row()
        .into_iter()
        .map(|(name, value)| {
            Row::new(vec![
                Cell::from(Span::styled(name, MedicalTheme::text_secondary())),
                Cell::from(Span::styled(value, MedicalTheme::text())),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Percentage(75), Constraint::Percentage(25)]).block(
        Block::default()
            .title(Span::styled(" Encoded Input ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(table, area);
}

fn render_prediction(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let block = Block::default()
        .title(Span::styled(" Prediction ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Risk level
            Constraint::Length(4), // Probability or label
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let level = assessment.risk_level;
    let risk_style = MedicalTheme::risk_level(level);
    let risk_icon = match level {
        RiskLevel::Low => "OK",
        RiskLevel::Moderate | RiskLevel::High => "!",
    };

    let risk_display = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{risk_icon} {level}"),
            risk_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            level.description(),
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(risk_display, chunks[0]);

    let horizon = assessment.horizon();
    match assessment.prediction.outcome {
        Outcome::Probability(p) => {
            let gauge = Gauge::default()
                .block(
                    Block::default()
                        .title(Span::styled(
                            format!(" {horizon} Myopia Probability "),
                            MedicalTheme::text_secondary(),
                        ))
                        .borders(Borders::ALL)
                        .border_style(MedicalTheme::border()),
                )
                .gauge_style(risk_style)
                .ratio(p.clamp(0.0, 1.0))
                .label(format!("{:.1}%", p * 100.0));
            f.render_widget(gauge, chunks[1]);
        }
        Outcome::Label(label) => {
            let text = if label == 0 {
                "0 - myopia not predicted"
            } else {
                "1 - myopia predicted"
            };
            let outcome = Paragraph::new(Line::from(vec![
                Span::styled(format!("{horizon} outcome: "), MedicalTheme::text_secondary()),
                Span::styled(text, risk_style),
            ]))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(MedicalTheme::border()),
            );
            f.render_widget(outcome, chunks[1]);
        }
    }
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Error", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Complete { .. } => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Edit Answers ", MedicalTheme::key_desc()),
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Questionnaire ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
        ResultState::Error { .. } => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Back to Form ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
        _ => Line::from(vec![Span::styled(
            "Processing...",
            MedicalTheme::text_muted(),
        )]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
