use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};
use crate::app::{App, InputMode};

/// Turn `**bold**` runs in assistant text into styled spans. Single stars,
/// empty runs, and unmatched markers all read as literal text.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        match after_open.find("**") {
            Some(close) if close > 0 => {
                if open > 0 {
                    spans.push(Span::raw(rest[..open].to_string()));
                }
                spans.push(Span::styled(
                    after_open[..close].to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                rest = &after_open[close + 2..];
            }
            _ => break,
        }
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat log, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" parley ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("{} ", app.client.endpoint()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("[{}] ", app.client.model()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.input_mode == InputMode::Normal {
            Color::Cyan
        } else {
            Color::DarkGray
        }))
        .title(" Chat ");

    // Store inner dimensions for scroll calculations
    let inner = block.inner(area);
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    if app.transcript.is_empty() && app.pending.is_none() && app.last_error.is_none() {
        let placeholder = Paragraph::new("Type your prompt and press Enter...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let user_label = Span::styled(
        "You:",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    );
    let assistant_label = Span::styled(
        "AI:",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    );

    let mut lines: Vec<Line> = Vec::new();

    for exchange in &app.transcript {
        lines.push(Line::from(user_label.clone()));
        for line in exchange.user.lines() {
            lines.push(Line::from(line.to_string()));
        }
        if exchange.user.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::default());

        lines.push(Line::from(assistant_label.clone()));
        for line in exchange.assistant.lines() {
            lines.push(parse_markdown_line(line));
        }
        lines.push(Line::default());
    }

    if let Some(pending) = &app.pending {
        lines.push(Line::from(user_label.clone()));
        for line in pending.lines() {
            lines.push(Line::from(line.to_string()));
        }
        if pending.is_empty() {
            lines.push(Line::default());
        }
        lines.push(Line::default());

        lines.push(Line::from(assistant_label.clone()));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    if let Some(error) = &app.last_error {
        lines.push(Line::from(Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::default());
    }

    let total_lines = lines.len() as u16;

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);

    // Render scrollbar
    if total_lines > app.chat_height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        let mut scrollbar_state =
            ScrollbarState::new(total_lines as usize).position(app.scroll as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(ratatui::layout::Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;

    let title = if app.is_waiting() {
        " Waiting for reply... "
    } else {
        " Prompt "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing {
            Color::Yellow
        } else {
            Color::DarkGray
        }))
        .title(title);

    // Horizontal scrolling keeps the cursor visible in a single-line box.
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " SCROLL ",
        InputMode::Editing => " TYPE ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" scroll mode ", label_style),
            Span::styled(" Ctrl-C ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" g/G ", key_style),
            Span::styled(" top/bottom ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_parse_markdown_plain_text() {
        let line = parse_markdown_line("just some text");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line_text(&line), "just some text");
    }

    #[test]
    fn test_parse_markdown_bold() {
        let line = parse_markdown_line("a **bold** word");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content.as_ref(), "bold");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_parse_markdown_multiple_bold_runs() {
        let line = parse_markdown_line("**a** and **b**");
        assert_eq!(line_text(&line), "a and b");
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert!(line.spans[2].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_parse_markdown_empty_bold_run_is_literal() {
        let line = parse_markdown_line("odd **** marker");
        assert_eq!(line_text(&line), "odd **** marker");
    }

    #[test]
    fn test_parse_markdown_unclosed_bold_is_literal() {
        let line = parse_markdown_line("a **dangling marker");
        assert_eq!(line_text(&line), "a **dangling marker");
    }

    #[test]
    fn test_parse_markdown_single_star_is_literal() {
        let line = parse_markdown_line("2 * 3 = 6");
        assert_eq!(line_text(&line), "2 * 3 = 6");
    }

    #[test]
    fn test_parse_markdown_empty_line() {
        let line = parse_markdown_line("");
        assert!(line.spans.is_empty());
    }
}
