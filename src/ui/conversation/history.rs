//! Conversation transcript display component

use crate::events::DisplayMessage;
use crate::render::render_message;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

pub const PENDING_TEXT: &str = "Hold on, I'm looking...";
const BODY_INDENT: &str = "  ";

/// Transcript view over the session's messages.
///
/// Always shows the newest lines, the terminal equivalent of scrolling the
/// last bubble into view after every render.
pub struct ConversationHistory<'a> {
    messages: &'a [DisplayMessage],
    pending: bool,
    bot_title: &'a str,
    notice: Option<&'a str>,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(messages: &'a [DisplayMessage], bot_title: &'a str) -> Self {
        Self {
            messages,
            pending: false,
            bot_title,
            notice: None,
        }
    }

    pub fn pending(mut self, pending: bool) -> Self {
        self.pending = pending;
        self
    }

    pub fn notice(mut self, notice: Option<&'a str>) -> Self {
        self.notice = notice;
        self
    }

    /// All transcript lines before wrapping.
    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for message in self.messages {
            lines.extend(self.render_entry(message));
            lines.push(Line::default());
        }

        if self.pending {
            lines.push(self.bot_header());
            lines.push(Line::from(vec![
                Span::raw(BODY_INDENT),
                Span::styled(
                    PENDING_TEXT,
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]));
            lines.push(Line::default());
        }

        if let Some(notice) = self.notice {
            for line in render_message(notice) {
                let mut spans = vec![Span::styled("│ ", Style::default().fg(Color::Yellow))];
                spans.extend(line.spans);
                lines.push(Line::from(spans));
            }
        }

        lines
    }

    fn bot_header(&self) -> Line<'static> {
        Line::from(Span::styled(
            self.bot_title.to_string(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))
    }

    fn render_entry(&self, message: &DisplayMessage) -> Vec<Line<'static>> {
        let body = render_message(&message.message);

        if message.is_bot {
            let mut lines = vec![self.bot_header()];
            lines.extend(body.into_iter().map(|line| {
                let mut spans = vec![Span::raw(BODY_INDENT)];
                spans.extend(line.spans);
                Line::from(spans)
            }));
            lines
        } else {
            let mut lines = vec![
                Line::from(Span::styled(
                    "you",
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Right),
            ];
            lines.extend(body.into_iter().map(|line| {
                let spans = line
                    .spans
                    .into_iter()
                    .map(|span| {
                        let style = Style::default().fg(Color::LightBlue).patch(span.style);
                        Span::styled(span.content, style)
                    })
                    .collect::<Vec<_>>();
                Line::from(spans).alignment(Alignment::Right)
            }));
            lines
        }
    }
}

/// Break a line into rows of at most `width` terminal columns, keeping styles.
pub fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    let alignment = line.alignment;
    let finish = |spans: Vec<Span<'static>>| {
        let mut row = Line::from(spans);
        row.alignment = alignment;
        row
    };

    if width == 0 {
        return vec![finish(line.spans)];
    }

    let mut rows = Vec::new();
    let mut row: Vec<Span<'static>> = Vec::new();
    let mut used = 0;

    for span in line.spans {
        let style = span.style;
        let mut chunk = String::new();
        for c in span.content.chars() {
            let columns = c.width().unwrap_or(0);
            if used > 0 && used + columns > width {
                if !chunk.is_empty() {
                    row.push(Span::styled(std::mem::take(&mut chunk), style));
                }
                rows.push(finish(std::mem::take(&mut row)));
                used = 0;
            }
            chunk.push(c);
            used += columns;
        }
        if !chunk.is_empty() {
            row.push(Span::styled(chunk, style));
        }
    }

    rows.push(finish(row));
    rows
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::LEFT | Borders::RIGHT)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner_area = block.inner(area);
        block.render(area, buf);

        let width = inner_area.width as usize;
        let rows: Vec<Line<'static>> = self
            .lines()
            .into_iter()
            .flat_map(|line| wrap_line(line, width))
            .collect();

        let height = inner_area.height as usize;
        let offset = rows.len().saturating_sub(height);
        let visible: Vec<Line<'static>> = rows.into_iter().skip(offset).collect();

        Paragraph::new(visible).render(inner_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn all_text(history: &ConversationHistory<'_>) -> Vec<String> {
        history.lines().iter().map(text).collect()
    }

    #[test]
    fn bot_and_user_entries_are_labelled() {
        let messages = vec![DisplayMessage::bot("Hi!"), DisplayMessage::user("Hello")];
        let history = ConversationHistory::new(&messages, "⚡");

        assert_eq!(all_text(&history), vec!["⚡", "  Hi!", "", "you", "Hello", ""]);
        assert_eq!(history.lines()[3].alignment, Some(Alignment::Right));
    }

    #[test]
    fn pending_shows_placeholder_bubble() {
        let messages = vec![DisplayMessage::user("Hello")];
        let history = ConversationHistory::new(&messages, "⚡").pending(true);
        assert!(all_text(&history).contains(&format!("  {PENDING_TEXT}")));

        let idle = ConversationHistory::new(&messages, "⚡");
        assert!(!all_text(&idle).iter().any(|line| line.contains(PENDING_TEXT)));
    }

    #[test]
    fn notice_is_appended_last() {
        let messages = vec![DisplayMessage::bot("Hi!")];
        let history = ConversationHistory::new(&messages, "⚡").notice(Some("heads up"));
        assert_eq!(all_text(&history).last().map(String::as_str), Some("│ heads up"));
    }

    #[test]
    fn wrap_splits_long_lines_and_keeps_styles() {
        let style = Style::default().fg(Color::Red);
        let line = Line::from(vec![Span::raw("abc"), Span::styled("defg", style)]);

        let rows = wrap_line(line, 3);

        assert_eq!(rows.iter().map(text).collect::<Vec<_>>(), vec!["abc", "def", "g"]);
        assert_eq!(rows[2].spans[0].style, style);
    }

    #[test]
    fn wrap_counts_wide_characters_as_two_columns() {
        let rows = wrap_line(Line::from("你好世界你好"), 5);
        assert_eq!(rows.iter().map(text).collect::<Vec<_>>(), vec!["你好", "世界", "你好"]);
    }

    #[test]
    fn wide_message_renders_every_character() {
        let message = "你好世界你好世界你好世界";
        let messages = vec![DisplayMessage::user(message)];
        let area = Rect::new(0, 0, 12, 10);
        let mut buf = Buffer::empty(area);

        ConversationHistory::new(&messages, "⚡").render(area, &mut buf);

        let rendered: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf.get(x, y).symbol().to_string())
            .collect();
        let shown = rendered.chars().filter(|c| message.contains(*c)).count();
        assert_eq!(shown, message.chars().count());
    }

    #[test]
    fn render_keeps_newest_lines_visible() {
        let messages: Vec<DisplayMessage> = (0..20)
            .map(|i| DisplayMessage::bot(format!("message {i}")))
            .collect();
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);

        ConversationHistory::new(&messages, "⚡").render(area, &mut buf);

        let last_rows: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf.get(x, y).symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n");
        assert!(last_rows.contains("message 19"));
        assert!(!last_rows.contains("message 0 "));
    }
}
