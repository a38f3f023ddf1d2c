use crate::presentation::PresentationMode;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub const CLOSE_HINT: &str = "[Esc] close";

/// Top bar: bot title and, when embedded, the close control.
pub struct ConversationHeader<'a> {
    title: &'a str,
    presentation: PresentationMode,
}

impl<'a> ConversationHeader<'a> {
    pub fn new(title: &'a str, presentation: PresentationMode) -> Self {
        Self {
            title,
            presentation,
        }
    }
}

impl Widget for ConversationHeader<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let title = Line::from(Span::styled(
            self.title,
            Style::default().add_modifier(Modifier::BOLD),
        ));
        Paragraph::new(title).render(inner, buf);

        if self.presentation.shows_close_control() {
            let close = Line::from(Span::styled(CLOSE_HINT, Style::default().fg(Color::Gray)));
            Paragraph::new(close)
                .alignment(Alignment::Right)
                .render(inner, buf);
        }
    }
}
