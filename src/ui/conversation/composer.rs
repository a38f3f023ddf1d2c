use crate::presentation::PresentationMode;
use crate::ui::conversation::commands::{CommandEntry, SlashCommand, command_entries, parse_slash_command};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

const PLACEHOLDER: &str = "Type your message…";
const MAX_VISIBLE_LINES: u16 = 6;
const MAX_PALETTE_ROWS: usize = 5;

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ConversationResult {
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// State for the text area within the composer.
///
/// `cursor` is a byte offset that always sits on a char boundary.
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    pub cursor: usize,
}

impl TextAreaState {
    fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.content[..self.cursor]
            .chars()
            .next_back()
            .map(|c| self.cursor - c.len_utf8())
    }

    fn next_boundary(&self) -> Option<usize> {
        self.content[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }

    /// Delete character before cursor
    fn backspace(&mut self) -> bool {
        match self.prev_boundary() {
            Some(prev) => {
                self.content.replace_range(prev..self.cursor, "");
                self.cursor = prev;
                true
            }
            None => false,
        }
    }

    /// Delete character at cursor
    fn delete(&mut self) -> bool {
        match self.next_boundary() {
            Some(next) => {
                self.content.replace_range(self.cursor..next, "");
                true
            }
            None => false,
        }
    }

    fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }
}

/// Conversation composer for user input
pub struct ConversationComposer {
    state: TextAreaState,
    enabled: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    show_command_palette: bool,
    selected_command: Option<usize>,
}

impl ConversationComposer {
    pub fn new(presentation: PresentationMode) -> Self {
        Self {
            state: TextAreaState::default(),
            enabled: true,
            command_entries: command_entries(presentation),
            filtered_commands: Vec::new(),
            show_command_palette: false,
            selected_command: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationResult {
        if key.kind != KeyEventKind::Press || !self.enabled {
            return ConversationResult::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return ConversationResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                    self.state.insert_char('\n');
                    self.sync_command_palette();
                } else if self.show_command_palette && self.apply_selected_command() {
                    return ConversationResult::None;
                } else {
                    return self.submit();
                }
            }
            KeyCode::Up if self.show_command_palette => self.move_command_selection(-1),
            KeyCode::Down if self.show_command_palette => self.move_command_selection(1),
            KeyCode::Esc if self.show_command_palette => self.close_command_palette(),
            KeyCode::Tab if self.show_command_palette => {
                self.apply_selected_command();
            }
            KeyCode::Char(c) => {
                self.state.insert_char(c);
                self.sync_command_palette();
            }
            KeyCode::Backspace => {
                if self.state.backspace() {
                    self.sync_command_palette();
                }
            }
            KeyCode::Delete => {
                if self.state.delete() {
                    self.sync_command_palette();
                }
            }
            KeyCode::Left => {
                if let Some(prev) = self.state.prev_boundary() {
                    self.state.cursor = prev;
                }
            }
            KeyCode::Right => {
                if let Some(next) = self.state.next_boundary() {
                    self.state.cursor = next;
                }
            }
            KeyCode::Home => self.state.cursor = 0,
            KeyCode::End => self.state.cursor = self.state.content.len(),
            _ => {}
        }

        ConversationResult::None
    }

    /// Blank input is never submitted; the text stays in place instead.
    fn submit(&mut self) -> ConversationResult {
        if self.state.content.trim().is_empty() {
            return ConversationResult::None;
        }
        let content = self.state.take();
        self.close_command_palette();

        match parse_slash_command(&content) {
            Some(command) => ConversationResult::Command(command),
            None => ConversationResult::Submitted(content.trim().to_string()),
        }
    }

    fn sync_command_palette(&mut self) {
        let content = &self.state.content;
        let typing_command = content.starts_with('/') && !content.contains(char::is_whitespace);
        if typing_command {
            if !self.show_command_palette {
                self.show_command_palette = true;
                self.selected_command = Some(0);
            }
            self.refresh_command_palette();
        } else if self.show_command_palette {
            self.close_command_palette();
        }
    }

    fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn refresh_command_palette(&mut self) {
        let query = self.state.content.trim_start_matches('/').to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
            .copied()
            .collect();

        self.selected_command = if self.filtered_commands.is_empty() {
            None
        } else {
            let index = self.selected_command.unwrap_or(0);
            Some(index.min(self.filtered_commands.len() - 1))
        };
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let len = self.filtered_commands.len() as isize;
        let current = self.selected_command.unwrap_or(0) as isize;
        self.selected_command = Some((current + delta).rem_euclid(len) as usize);
    }

    fn apply_selected_command(&mut self) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index))
            .copied()
        else {
            return false;
        };

        self.state.content = format!("/{}", entry.keyword);
        self.state.cursor = self.state.content.len();
        self.close_command_palette();
        true
    }

    /// Input is disabled while a reply is pending.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.close_command_palette();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn content(&self) -> &str {
        &self.state.content
    }

    pub fn is_palette_open(&self) -> bool {
        self.show_command_palette
    }

    pub fn clear(&mut self) {
        self.state.take();
        self.close_command_palette();
    }

    /// Rows needed including borders.
    pub fn desired_height(&self) -> u16 {
        let lines = self.state.content.split('\n').count() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + 2
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, border_style) = if self.enabled {
            ("Message", Style::default().fg(Color::Green))
        } else {
            ("Waiting for reply…", Style::default().fg(Color::DarkGray))
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(border_style);

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.state.content.is_empty() {
            let placeholder_line = Line::from(Span::styled(
                PLACEHOLDER,
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.state.content.clone();
            if self.enabled {
                content.insert(self.state.cursor.min(content.len()), '▌');
            }

            let lines: Vec<&str> = content.split('\n').collect();
            let height = inner_area.height as usize;
            let start = lines.len().saturating_sub(height);
            for (i, line_text) in lines[start..].iter().enumerate() {
                let line = Line::from(Span::styled(*line_text, Style::default().fg(Color::White)));
                buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
            }
        }

        if self.show_command_palette && !self.filtered_commands.is_empty() {
            self.render_palette(area, buf);
        }
    }
}

impl ConversationComposer {
    /// Palette floats directly above the composer.
    fn render_palette(&self, area: Rect, buf: &mut Buffer) {
        let rows = self.filtered_commands.len().min(MAX_PALETTE_ROWS);
        let palette_height = rows as u16 + 2;
        let palette_area = Rect {
            x: area.x,
            y: area.y.saturating_sub(palette_height),
            width: area.width,
            height: palette_height,
        }
        .intersection(buf.area);

        Clear.render(palette_area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().fg(Color::Blue));
        let inner = block.inner(palette_area);
        block.render(palette_area, buf);

        for (index, entry) in self.filtered_commands.iter().enumerate().take(inner.height as usize) {
            let style = if self.selected_command == Some(index) {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };

            let line = Line::from(vec![
                Span::styled(format!("/{}", entry.keyword), style),
                Span::styled("  ", Style::default()),
                Span::styled(entry.description, Style::default().fg(Color::Gray)),
            ]);

            buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &mut ConversationComposer, text: &str) {
        for c in text.chars() {
            composer.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_trimmed_text_and_clears() {
        let mut composer = ConversationComposer::new(PresentationMode::Standalone);
        type_text(&mut composer, " Hello ");

        let result = composer.handle_key(key(KeyCode::Enter));

        assert_eq!(result, ConversationResult::Submitted("Hello".to_string()));
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let mut composer = ConversationComposer::new(PresentationMode::Standalone);
        type_text(&mut composer, "   ");
        assert_eq!(composer.handle_key(key(KeyCode::Enter)), ConversationResult::None);
        assert_eq!(composer.content(), "   ");
    }

    #[test]
    fn shift_enter_inserts_newline() {
        let mut composer = ConversationComposer::new(PresentationMode::Standalone);
        type_text(&mut composer, "a");
        composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&mut composer, "b");
        assert_eq!(composer.content(), "a\nb");
        assert_eq!(composer.desired_height(), 4);
    }

    #[test]
    fn disabled_composer_ignores_input() {
        let mut composer = ConversationComposer::new(PresentationMode::Standalone);
        composer.set_enabled(false);
        type_text(&mut composer, "hi");
        assert_eq!(composer.content(), "");
        assert_eq!(composer.handle_key(key(KeyCode::Enter)), ConversationResult::None);
    }

    #[test]
    fn editing_respects_multibyte_characters() {
        let mut composer = ConversationComposer::new(PresentationMode::Standalone);
        type_text(&mut composer, "héllo");
        composer.handle_key(key(KeyCode::Left));
        composer.handle_key(key(KeyCode::Left));
        composer.handle_key(key(KeyCode::Left));
        composer.handle_key(key(KeyCode::Backspace));
        assert_eq!(composer.content(), "hllo");
    }

    #[test]
    fn slash_command_is_parsed_on_submit() {
        let mut composer = ConversationComposer::new(PresentationMode::Standalone);
        type_text(&mut composer, "/reset");
        composer.handle_key(key(KeyCode::Esc));

        match composer.handle_key(key(KeyCode::Enter)) {
            ConversationResult::Command(command) => assert_eq!(command, SlashCommand::Reset),
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn palette_completes_selected_command() {
        let mut composer = ConversationComposer::new(PresentationMode::Embedded);
        type_text(&mut composer, "/cl");
        assert!(composer.is_palette_open());

        composer.handle_key(key(KeyCode::Tab));

        assert_eq!(composer.content(), "/close");
        assert!(!composer.is_palette_open());
    }

    #[test]
    fn palette_hides_close_when_standalone() {
        let mut composer = ConversationComposer::new(PresentationMode::Standalone);
        type_text(&mut composer, "/cl");
        assert!(!composer.apply_selected_command());
        assert_eq!(composer.content(), "/cl");
    }

    #[test]
    fn command_word_followed_by_text_is_submitted() {
        let mut composer = ConversationComposer::new(PresentationMode::Standalone);
        type_text(&mut composer, "/exit code 1 means what?");
        assert!(!composer.is_palette_open());

        assert_eq!(
            composer.handle_key(key(KeyCode::Enter)),
            ConversationResult::Submitted("/exit code 1 means what?".to_string())
        );
    }

    #[test]
    fn shift_enter_closes_palette() {
        let mut composer = ConversationComposer::new(PresentationMode::Standalone);
        type_text(&mut composer, "/re");
        assert!(composer.is_palette_open());

        composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        assert!(!composer.is_palette_open());

        assert_eq!(
            composer.handle_key(key(KeyCode::Enter)),
            ConversationResult::Submitted("/re".to_string())
        );
    }
}
