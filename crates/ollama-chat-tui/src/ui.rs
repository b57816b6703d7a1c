use std::time::Instant;

use ollama_chat_core::preview::{render_preview, Preview};
use ollama_chat_core::{segment_message, ChatRole, CodeBlock, Segment};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::markdown::{render_markdown, CODE_BG, CODE_FG};

const MAX_INPUT_LINES: usize = 5;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let input_lines = app.input.split('\n').count().clamp(1, MAX_INPUT_LINES) as u16;
    let banner_height = if app.session.last_error().is_some() || app.status.is_some() {
        1
    } else {
        0
    };

    // Main layout: header, chat, banner, input, footer
    let [header_area, chat_area, banner_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(banner_height),
        Constraint::Length(input_lines + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    if banner_height > 0 {
        render_banner(app, frame, banner_area);
    }
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Ollama Chat ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(" {} ", app.proxy.endpoint()),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let inner_width = area.width.saturating_sub(2);
    app.chat_height = area.height.saturating_sub(2);

    let lines = transcript_lines(app, Instant::now());
    let text = if lines.is_empty() {
        Text::from(Span::styled(
            "Type a message...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(lines)
    };

    // Measured before the border is attached, so the count is word-wrapped rows
    // of the inner area only.
    let chat = Paragraph::new(text).wrap(Wrap { trim: false });
    app.total_lines = chat.line_count(inner_width).min(u16::MAX as usize) as u16;

    if app.follow_bottom {
        app.scroll_target = app.max_scroll();
        app.follow_bottom = false;
    }
    let max_scroll = app.max_scroll();
    app.scroll = app.scroll.min(max_scroll);
    app.scroll_target = app.scroll_target.min(max_scroll);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let chat = chat.block(chat_block).scroll((app.scroll, 0));
    frame.render_widget(chat, area);
}

/// The whole transcript as styled lines, code blocks and previews included.
pub(crate) fn transcript_lines(app: &App, now: Instant) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let copied = app.session.copied_index(now);
    let mut block_number = 0;

    for (index, msg) in app.session.messages().iter().enumerate() {
        lines.push(role_line(msg.role));

        let preview_shown = app.session.is_preview_shown(index);
        for segment in segment_message(&msg.content) {
            match segment {
                Segment::Prose(prose) => lines.extend(render_markdown(&prose)),
                Segment::Code(block) => {
                    let selected = app.selected_block == Some(block_number);
                    block_number += 1;

                    push_code_block(
                        &mut lines,
                        &block,
                        selected,
                        copied == Some(index),
                        preview_shown,
                    );
                    if preview_shown {
                        if let Some(preview) = render_preview(&block) {
                            push_preview(&mut lines, &block, &preview);
                        }
                    }
                }
            }
        }

        lines.push(Line::default());
    }

    if app.session.input_disabled() {
        lines.push(role_line(ChatRole::Assistant));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn role_line(role: ChatRole) -> Line<'static> {
    match role {
        ChatRole::User => Line::from(Span::styled(
            "You:",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        ChatRole::Assistant => Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    }
}

fn push_code_block(
    lines: &mut Vec<Line<'static>>,
    block: &CodeBlock,
    selected: bool,
    copied: bool,
    preview_shown: bool,
) {
    let border = Style::default().fg(if selected { Color::Yellow } else { Color::DarkGray });
    let action = Style::default().fg(Color::Gray);
    let tag = if block.language.is_empty() {
        "code".to_string()
    } else {
        block.language.clone()
    };

    let mut header = vec![
        Span::styled("┌─ ", border),
        Span::styled(tag, Style::default().fg(CODE_FG).add_modifier(Modifier::BOLD)),
        Span::styled(" ─ ", border),
    ];
    if copied {
        header.push(Span::styled("Copied!", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)));
    } else {
        header.push(Span::styled("[y] Copy code", action));
    }
    if block.can_preview() {
        let label = if preview_shown { "  [p] Hide preview" } else { "  [p] Show preview" };
        header.push(Span::styled(label, action));
    }
    lines.push(Line::from(header));

    let body: Vec<&str> = if block.body.is_empty() {
        vec![""]
    } else {
        block.body.lines().collect()
    };
    for line in body {
        lines.push(Line::from(vec![
            Span::styled("│ ", border),
            Span::styled(line.to_string(), Style::default().fg(CODE_FG).bg(CODE_BG)),
        ]));
    }

    lines.push(Line::from(Span::styled("└──", border)));
}

fn push_preview(lines: &mut Vec<Line<'static>>, block: &CodeBlock, preview: &Preview) {
    let frame_style = Style::default().fg(Color::Gray);
    lines.push(Line::from(Span::styled(
        "Preview:",
        Style::default().fg(Color::DarkGray),
    )));

    match preview {
        Preview::Error(message) => {
            lines.push(Line::from(Span::styled(
                format!("Error: {}", message),
                Style::default().fg(Color::Red),
            )));
        }
        Preview::Markup(markup) => {
            let kind = block
                .preview_kind()
                .map(|kind| kind.display_name())
                .unwrap_or("HTML");
            lines.push(Line::from(Span::styled(
                format!("╭─ {} preview ─ [o] open sandboxed in browser", kind),
                frame_style,
            )));
            for line in markup.lines() {
                lines.push(Line::from(vec![
                    Span::styled("│ ", frame_style),
                    Span::styled(line.to_string(), Style::default().fg(Color::White)),
                ]));
            }
            lines.push(Line::from(Span::styled("╰──", frame_style)));
        }
    }
}

fn render_banner(app: &App, frame: &mut Frame, area: Rect) {
    let line = if let Some(error) = app.session.last_error() {
        Line::from(vec![
            Span::styled(
                format!(" Error: {} ", error),
                Style::default().bg(Color::Red).fg(Color::White),
            ),
            Span::styled(" x dismiss ", Style::default().fg(Color::Gray)),
        ])
    } else if let Some(status) = &app.status {
        Line::from(Span::styled(
            format!(" {} ", status),
            Style::default().fg(Color::Gray),
        ))
    } else {
        Line::default()
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let disabled = app.session.input_disabled();
    let editing = app.input_mode == InputMode::Editing && !disabled;

    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let title = if disabled {
        " Waiting for reply... "
    } else {
        " Message (Enter to send, Shift+Enter for newline) "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let text_style = if disabled {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(Color::Cyan)
    };

    // Cursor position as (line, column) within the input
    let before_cursor: String = app.input.chars().take(app.cursor).collect();
    let cursor_line = before_cursor.matches('\n').count();
    let cursor_col = before_cursor
        .rsplit('\n')
        .next()
        .map(|tail| tail.chars().count())
        .unwrap_or(0);

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    // Scroll so the cursor stays visible
    let line_offset = if inner_height > 0 && cursor_line >= inner_height {
        cursor_line + 1 - inner_height
    } else {
        0
    };
    let col_offset = if inner_width > 0 && cursor_col >= inner_width {
        cursor_col + 1 - inner_width
    } else {
        0
    };

    let visible: Vec<Line> = app
        .input
        .split('\n')
        .skip(line_offset)
        .take(inner_height.max(1))
        .map(|line| Line::from(line.chars().skip(col_offset).take(inner_width).collect::<String>()))
        .collect();

    let input = Paragraph::new(visible).style(text_style).block(input_block);
    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((
            area.x + 1 + (cursor_col - col_offset) as u16,
            area.y + 1 + (cursor_line - line_offset) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: &[(&str, &str)] = match app.input_mode {
        InputMode::Normal => &[
            (" i ", " edit "),
            (" n/N ", " block "),
            (" y ", " copy "),
            (" p ", " preview "),
            (" o ", " open "),
            (" j/k ", " scroll "),
            (" q ", " quit "),
        ],
        InputMode::Editing => &[
            (" Enter ", " send "),
            (" Shift+Enter ", " newline "),
            (" Esc ", " normal "),
            (" Ctrl+C ", " quit "),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    for (key, label) in hints {
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
