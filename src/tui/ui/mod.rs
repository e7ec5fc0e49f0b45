//! UI module: View components for the TUI.

pub mod questionnaire;
pub mod result;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::MedicalTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: Estimates are indicative only and do not replace an eye examination by an optometrist or ophthalmologist.",
            MedicalTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Predictions come from models trained on a school survey population and may not generalize.",
            MedicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
