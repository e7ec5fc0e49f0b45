//! Questionnaire input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{Field, FieldKind, FieldSpec, InputError, Submission};
use crate::tui::styles::MedicalTheme;

/// One form entry. Categorical entries hold the selected label.
#[derive(Debug, Clone)]
pub struct FormEntry {
    pub spec: &'static FieldSpec,
    pub value: String,
}

impl FormEntry {
    fn hint(&self) -> String {
        match self.spec.kind {
            FieldKind::Categorical(choices) => format!("←/→ choose ({} options)", choices.len()),
            FieldKind::Numeric(range) => format!("{} to {}", range.min, range.max),
        }
    }

    /// Step through choices, or nudge a number by its step.
    fn cycle(&mut self, forward: bool) {
        match self.spec.kind {
            FieldKind::Categorical(choices) => {
                let n = choices.len();
                let current = choices.iter().position(|c| c.matches(&self.value));
                let next = match (current, forward) {
                    (None, true) => 0,
                    (None, false) => n - 1,
                    (Some(i), true) => (i + 1) % n,
                    (Some(i), false) => (i + n - 1) % n,
                };
                self.value = choices[next].label.to_string();
            }
            FieldKind::Numeric(range) => {
                let current = self.value.trim().parse::<f64>().unwrap_or(range.min);
                let next = if forward {
                    current + range.step
                } else {
                    current - range.step
                };
                let next = range.clamp(next);
                self.value = if range.step.fract() == 0.0 {
                    format!("{next:.0}")
                } else {
                    format!("{next:.1}")
                };
            }
        }
    }
}

/// Questionnaire form state
pub struct QuestionnaireState {
    pub entries: Vec<FormEntry>,
    pub selected: usize,
    pub error_message: Option<String>,
}

impl Default for QuestionnaireState {
    fn default() -> Self {
        Self {
            entries: Field::ALL
                .into_iter()
                .map(|field| FormEntry {
                    spec: field.spec(),
                    value: String::new(),
                })
                .collect(),
            selected: 0,
            error_message: None,
        }
    }
}

impl QuestionnaireState {
    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % self.entries.len();
    }

    pub fn prev_field(&mut self) {
        if self.selected == 0 {
            self.selected = self.entries.len() - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn cycle_next(&mut self) {
        self.entries[self.selected].cycle(true);
        self.error_message = None;
    }

    pub fn cycle_prev(&mut self) {
        self.entries[self.selected].cycle(false);
        self.error_message = None;
    }

    /// Type into a numeric entry. Ignored for categorical entries.
    pub fn input_char(&mut self, c: char) {
        let entry = &mut self.entries[self.selected];
        if entry.spec.range().is_some() && (c.is_ascii_digit() || c == '.') {
            entry.value.push(c);
            self.error_message = None;
        }
    }

    pub fn delete_char(&mut self) {
        let entry = &mut self.entries[self.selected];
        if entry.spec.range().is_some() {
            entry.value.pop();
        } else {
            entry.value.clear();
        }
    }

    pub fn clear_field(&mut self) {
        self.entries[self.selected].value.clear();
    }

    /// Fill every entry with the example answers.
    pub fn load_sample_data(&mut self) {
        let sample = Submission::example();
        for entry in &mut self.entries {
            let field = entry.spec.field;
            entry.value = match field {
                Field::Grade => sample.grade.map(|g| g.to_string()).unwrap_or_default(),
                Field::Bmi => sample.bmi.map(|b| b.to_string()).unwrap_or_default(),
                _ => sample.label(field).unwrap_or_default().to_string(),
            };
        }
        self.error_message = None;
    }

    /// Collect the entries into a submission.
    ///
    /// # Errors
    /// Returns `InputError` if a numeric entry is not a number.
    pub fn to_submission(&self) -> Result<Submission, InputError> {
        Submission::from_pairs(
            self.entries
                .iter()
                .map(|e| (e.spec.field.name(), e.value.as_str())),
        )
    }
}

/// Render the questionnaire form
pub fn render_questionnaire(f: &mut Frame, area: Rect, state: &QuestionnaireState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Myopia Risk Questionnaire", MedicalTheme::title()),
        Span::styled(
            " │ all 15 items are required",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &QuestionnaireState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.entries.len() + 1) / 2;

    render_field_column(f, columns[0], &state.entries[..mid], 0, state.selected);
    render_field_column(f, columns[1], &state.entries[mid..], mid, state.selected);
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    entries: &[FormEntry],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = entries
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, entry) in entries.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", entry.spec.prompt), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value_display = if entry.value.is_empty() {
            Span::styled(entry.hint(), MedicalTheme::text_muted())
        } else if entry.spec.range().is_none() && is_selected {
            Span::styled(format!("‹ {} ›", entry.value), MedicalTheme::text())
        } else {
            Span::styled(entry.value.clone(), MedicalTheme::text())
        };

        let content = Paragraph::new(Line::from(vec![
            Span::raw(" "),
            value_display,
            if is_selected && entry.spec.range().is_some() {
                Span::styled("▌", MedicalTheme::cursor())
            } else {
                Span::raw("")
            },
        ]))
        .block(block);

        f.render_widget(content, chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &QuestionnaireState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Choose ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Submit ", MedicalTheme::key_desc()),
            Span::styled("[S] ", MedicalTheme::key_hint()),
            Span::styled("Sample Answers ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Reset ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
