//! Markdown rendering for chat bubbles.
//!
//! Converts a message body into styled terminal lines. Fenced code blocks
//! that name a language get a label line above the code.

use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const CODE_INDENT: &str = "  ";

fn code_style() -> Style {
    Style::default().fg(Color::Cyan)
}

fn code_block_style() -> Style {
    Style::default().fg(Color::LightYellow)
}

fn label_style() -> Style {
    Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC)
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Render a message body into display lines.
pub fn render_message(text: &str) -> Vec<Line<'static>> {
    let mut writer = LineWriter::default();
    for event in Parser::new_ext(text, markdown_options()) {
        writer.handle(event);
    }
    writer.finish()
}

struct CodeBlock {
    language: Option<String>,
    text: String,
}

#[derive(Default)]
struct LineWriter {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
    links: Vec<Option<String>>,
    code: Option<CodeBlock>,
    quote_depth: usize,
    table_cell: usize,
}

impl LineWriter {
    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let next = self.style().patch(patch);
        self.styles.push(next);
    }

    fn push_text(&mut self, text: impl Into<String>) {
        let style = self.style();
        self.spans.push(Span::styled(text.into(), style));
    }

    fn flush_line(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let mut spans = Vec::with_capacity(self.spans.len() + 1);
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.append(&mut self.spans);
        self.lines.push(Line::from(spans));
    }

    /// Top-level blocks are separated by one blank line.
    fn start_block(&mut self) {
        self.flush_line();
        let after_content = self.lines.last().is_some_and(|line| !line.spans.is_empty());
        if self.lists.is_empty() && after_content {
            self.lines.push(Line::default());
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        if let Some(code) = self.code.as_mut() {
            match event {
                Event::Text(text) => {
                    code.text.push_str(&text);
                    return;
                }
                Event::End(TagEnd::CodeBlock) => {}
                _ => return,
            }
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push_text(text.into_string()),
            Event::Code(code) => {
                let style = self.style().patch(code_style());
                self.spans.push(Span::styled(code.into_string(), style));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_text(html.trim_end_matches('\n').to_string());
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.flush_line(),
            Event::Rule => {
                self.start_block();
                self.push_text("───");
                self.flush_line();
            }
            Event::TaskListMarker(checked) => {
                self.push_text(if checked { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.start_block();
                }
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                self.push_style(Style::default().add_modifier(Modifier::BOLD));
                self.push_text(format!("{} ", "#".repeat(level as usize)));
            }
            Tag::BlockQuote => {
                self.start_block();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.start_block();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeBlock {
                    language,
                    text: String::new(),
                });
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.start_block();
                } else {
                    self.flush_line();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{indent}{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.spans.push(Span::raw(marker));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link {
                link_type,
                dest_url,
                ..
            } => {
                self.push_style(Style::default().add_modifier(Modifier::UNDERLINED));
                let shown = match link_type {
                    LinkType::Autolink | LinkType::Email => None,
                    _ => Some(dest_url.into_string()),
                };
                self.links.push(shown);
            }
            Tag::Image { dest_url, .. } => {
                self.push_text("[image: ");
                self.links.push(Some(dest_url.into_string()));
            }
            Tag::Table(_) => {
                self.start_block();
            }
            Tag::TableHead | Tag::TableRow => {
                self.flush_line();
                self.table_cell = 0;
            }
            Tag::TableCell => {
                if self.table_cell > 0 {
                    self.push_text(" │ ");
                }
                self.table_cell += 1;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush_line(),
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.flush_line();
            }
            TagEnd::BlockQuote => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => self.finish_code_block(),
            TagEnd::List(_) => {
                self.flush_line();
                self.lists.pop();
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(Some(url)) = self.links.pop() {
                    if !url.is_empty() {
                        self.spans.push(Span::styled(
                            format!(" ({url})"),
                            Style::default().fg(Color::DarkGray),
                        ));
                    }
                }
            }
            TagEnd::Image => {
                self.links.pop();
                self.push_text("]");
            }
            TagEnd::TableHead => {
                self.flush_line();
                self.push_text("───");
                self.flush_line();
            }
            TagEnd::TableRow | TagEnd::Table => self.flush_line(),
            _ => {}
        }
    }

    fn finish_code_block(&mut self) {
        let Some(block) = self.code.take() else {
            return;
        };
        let body = block.text.strip_suffix('\n').unwrap_or(&block.text);

        let indent = "  ".repeat(self.lists.len());

        if let Some(language) = block.language {
            if !indent.is_empty() {
                self.spans.push(Span::raw(indent.clone()));
            }
            self.spans.push(Span::styled(language, label_style()));
            self.flush_line();
        }
        for line in body.split('\n') {
            self.spans.push(Span::raw(format!("{indent}{CODE_INDENT}")));
            self.spans
                .push(Span::styled(line.to_string(), code_block_style()));
            self.flush_line();
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush_line();
        while self
            .lines
            .last()
            .is_some_and(|line| line.spans.iter().all(|span| span.content.trim().is_empty()))
        {
            self.lines.pop();
        }
        if self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn plain(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn plain_text_is_single_line() {
        assert_eq!(plain(&render_message("Hi!")), vec!["Hi!"]);
    }

    #[test]
    fn strong_text_is_bold() {
        let lines = render_message("Hello **world**");
        assert_eq!(plain(&lines), vec!["Hello world"]);
        let bold = &lines[0].spans[1];
        assert_eq!(bold.content.as_ref(), "world");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn paragraphs_are_separated_by_blank_line() {
        assert_eq!(plain(&render_message("first\n\nsecond")), vec!["first", "", "second"]);
    }

    #[test]
    fn fenced_code_gets_language_label_and_no_trailing_blank() {
        let lines = render_message("```rust\nfn main() {}\n```");
        assert_eq!(plain(&lines), vec!["rust", "  fn main() {}"]);
        assert_eq!(lines[1].spans[1].style, code_block_style());
    }

    #[test]
    fn fenced_code_without_language_has_no_label() {
        assert_eq!(
            plain(&render_message("```\nlet a = 1;\nlet b = 2;\n```")),
            vec!["  let a = 1;", "  let b = 2;"]
        );
    }

    #[test]
    fn quoted_code_keeps_quote_prefix_on_label() {
        assert_eq!(
            plain(&render_message("> ```rust\n> let x = 1;\n> ```")),
            vec!["│ rust", "│   let x = 1;"]
        );
    }

    #[test]
    fn code_in_list_item_is_indented_with_the_item() {
        assert_eq!(
            plain(&render_message("- item\n\n  ```sh\n  ls\n  ```")),
            vec!["• item", "  sh", "    ls"]
        );
    }

    #[test]
    fn inline_code_keeps_backtick_content() {
        let lines = render_message("run `cargo fmt` first");
        assert_eq!(plain(&lines), vec!["run cargo fmt first"]);
        assert_eq!(lines[0].spans[1].style.fg, Some(Color::Cyan));
    }

    #[test]
    fn lists_get_markers() {
        assert_eq!(plain(&render_message("- a\n- b")), vec!["• a", "• b"]);
        assert_eq!(
            plain(&render_message("1. one\n2. two")),
            vec!["1. one", "2. two"]
        );
    }

    #[test]
    fn nested_list_is_indented() {
        assert_eq!(
            plain(&render_message("- a\n  - b\n- c")),
            vec!["• a", "  • b", "• c"]
        );
    }

    #[test]
    fn links_show_destination() {
        assert_eq!(
            plain(&render_message("see [docs](https://dialoqbase.n4ze3m.com)")),
            vec!["see docs (https://dialoqbase.n4ze3m.com)"]
        );
    }

    #[test]
    fn tables_render_cells_with_separators() {
        let rendered = plain(&render_message("| a | b |\n|---|---|\n| 1 | 2 |"));
        assert!(rendered.contains(&"a │ b".to_string()));
        assert!(rendered.contains(&"1 │ 2".to_string()));
    }

    #[test]
    fn empty_message_renders_one_blank_line() {
        assert_eq!(render_message("").len(), 1);
    }
}
