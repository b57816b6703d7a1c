//! Markdown prose rendering for the chat pane.
//!
//! Converts markdown text to styled ratatui Lines. Fenced code blocks are
//! normally split out beforehand and drawn by the code-block renderer in
//! `ui`; any that reach here are drawn as plain code lines.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Colors for markdown elements
pub const CODE_BG: Color = Color::Rgb(40, 44, 52);
pub const CODE_FG: Color = Color::Rgb(171, 178, 191);
const HEADING_COLOR: Color = Color::Rgb(97, 175, 239);
const BOLD_COLOR: Color = Color::Rgb(224, 208, 183);
const ITALIC_COLOR: Color = Color::Rgb(152, 195, 121);
const LINK_COLOR: Color = Color::Rgb(86, 182, 194);
const LIST_BULLET_COLOR: Color = Color::Rgb(198, 120, 221);
const BLOCKQUOTE_COLOR: Color = Color::Rgb(128, 128, 128);

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    // One entry per open list: next number for ordered lists
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
}

impl Renderer {
    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let style = self.style().patch(patch);
        self.styles.push(style);
    }

    fn pop_style(&mut self) {
        self.styles.pop();
    }

    fn text(&mut self, text: &str) {
        let style = self.style();
        self.spans.push(Span::styled(text.to_string(), style));
    }

    fn flush(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let mut spans = Vec::with_capacity(self.spans.len() + 1);
        if self.quote_depth > 0 {
            spans.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                Style::default().fg(BLOCKQUOTE_COLOR),
            ));
        }
        spans.append(&mut self.spans);
        self.lines.push(Line::from(spans));
    }

    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn start_item(&mut self) {
        self.flush();
        let depth = self.lists.len().saturating_sub(1);
        let marker = match self.lists.last_mut() {
            Some(Some(number)) => {
                let marker = format!("{}. ", number);
                *number += 1;
                marker
            }
            _ => "• ".to_string(),
        };
        self.spans.push(Span::raw("  ".repeat(depth)));
        self.spans
            .push(Span::styled(marker, Style::default().fg(LIST_BULLET_COLOR)));
    }

    fn code_text(&mut self, text: &str) {
        for line in text.lines() {
            self.spans.push(Span::styled(
                line.to_string(),
                Style::default().fg(CODE_FG).bg(CODE_BG),
            ));
            self.flush();
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.in_code_block => self.code_text(&text),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                self.spans.push(Span::styled(
                    format!(" {} ", code),
                    Style::default().fg(CODE_FG).bg(CODE_BG),
                ));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                for line in html.lines() {
                    self.text(line);
                    self.flush();
                }
            }
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(BLOCKQUOTE_COLOR),
                )));
            }
            Event::TaskListMarker(done) => self.text(if done { "[x] " } else { "[ ] " }),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.spans.push(Span::styled(
                    format!("{} ", "#".repeat(level as usize)),
                    Style::default().fg(HEADING_COLOR),
                ));
                self.push_style(
                    Style::default()
                        .fg(HEADING_COLOR)
                        .add_modifier(Modifier::BOLD),
                );
            }
            Tag::Emphasis => {
                self.push_style(Style::default().fg(ITALIC_COLOR).add_modifier(Modifier::ITALIC))
            }
            Tag::Strong => {
                self.push_style(Style::default().fg(BOLD_COLOR).add_modifier(Modifier::BOLD))
            }
            Tag::Link { .. } => self.push_style(
                Style::default()
                    .fg(LINK_COLOR)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => self.start_item(),
            Tag::BlockQuote { .. } => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(_) => {
                self.flush();
                self.in_code_block = true;
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Heading { .. } => {
                self.pop_style();
                self.flush();
                self.blank_line();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Link => self.pop_style(),
            TagEnd::Item => self.flush(),
            TagEnd::List { .. } => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                self.flush();
                self.in_code_block = false;
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Render markdown prose to styled lines.
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    let mut renderer = Renderer::default();
    for event in Parser::new(text) {
        renderer.event(event);
    }
    renderer.finish()
}
