use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Role};
use crate::layout::PageHeaderLayout;

const PANEL_WIDTH: u16 = 64;
const PANEL_HEIGHT: u16 = 22;
const BADGE_TEXT: &str = " ▲ HERO chat (o) ";
const INPUT_PLACEHOLDER: &str = "How can I assist?";

/// Parse a line of text, converting **bold** spans and [text](url) links
/// into styled spans. Links show their target beside the label since a
/// terminal has no browsing context to open.
pub fn markdown_spans(text: &str) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut chars = text.chars().peekable();
    let mut current = String::new();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();

                // Find closing **
                let mut bold = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == '*' && chars.peek() == Some(&'*') {
                        chars.next();
                        closed = true;
                        break;
                    }
                    bold.push(c);
                }

                if closed && !bold.is_empty() {
                    if !current.is_empty() {
                        spans.push(Span::raw(std::mem::take(&mut current)));
                    }
                    spans.push(Span::styled(
                        bold,
                        Style::default().add_modifier(Modifier::BOLD),
                    ));
                } else {
                    // No closing **, treat as literal
                    current.push_str("**");
                    current.push_str(&bold);
                }
            }
            '[' => match take_link(&mut chars) {
                Ok((label, url)) => {
                    if !current.is_empty() {
                        spans.push(Span::raw(std::mem::take(&mut current)));
                    }
                    let label = if label.is_empty() {
                        "Link".to_string()
                    } else {
                        label
                    };
                    spans.push(Span::styled(
                        format!("{label} ({url})"),
                        Style::default()
                            .fg(Color::Blue)
                            .add_modifier(Modifier::UNDERLINED),
                    ));
                }
                Err(consumed) => {
                    // Not a link, keep everything literally
                    current.push('[');
                    current.push_str(&consumed);
                }
            },
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        spans.push(Span::raw(current));
    }
    spans
}

/// Consume the rest of a `label](url)` sequence. On failure the consumed
/// characters come back so the caller can emit them unchanged.
fn take_link(
    chars: &mut std::iter::Peekable<std::str::Chars>,
) -> Result<(String, String), String> {
    let mut consumed = String::new();
    let mut label = String::new();

    loop {
        match chars.next() {
            Some(']') => break,
            Some(c) => {
                label.push(c);
                consumed.push(c);
            }
            None => return Err(consumed),
        }
    }
    consumed.push(']');

    if chars.peek() != Some(&'(') {
        return Err(consumed);
    }
    chars.next();
    consumed.push('(');

    let mut url = String::new();
    loop {
        match chars.next() {
            Some(')') => return Ok((label, url)),
            Some(c) => {
                url.push(c);
                consumed.push(c);
            }
            None => return Err(consumed),
        }
    }
}

pub fn markdown_line(text: &str) -> Line<'static> {
    let spans = markdown_spans(text);
    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let page = PageHeaderLayout::new("HERO: Housing Essential Resource Organizer")
        .subheading("Find and navigate housing support across the Bay Area")
        .inverse(app.open);
    let content_area = page.render(frame, area);

    let [body_area, footer_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(content_area);

    render_page_body(frame, body_area);
    render_footer(app, frame, footer_area);

    if app.open {
        render_chat_panel(app, frame, body_area);
        app.badge_area = None;
    } else {
        render_toggle_badge(app, frame, body_area);
        app.header_area = None;
    }
}

fn render_page_body(frame: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::default(),
        Line::from(" Welcome to the housing resource portal."),
        Line::from(" Open the chat to ask about shelters, rental assistance,"),
        Line::from(" and other housing programs in your area."),
    ]);
    let body = Paragraph::new(text).style(Style::default().fg(Color::Gray));
    frame.render_widget(body, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hints = if app.open {
        " Enter send | Esc minimize | ↑/↓ scroll | Ctrl+C quit "
    } else {
        " o open chat | q quit "
    };
    let footer = Paragraph::new(Line::from(Span::styled(
        hints,
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(footer, area);
}

/// Closed state: a one-line toggle badge floating at the bottom-right.
fn render_toggle_badge(app: &mut App, frame: &mut Frame, area: Rect) {
    let width = (BADGE_TEXT.chars().count() as u16).min(area.width);
    let badge_area = Rect::new(
        area.right().saturating_sub(width),
        area.bottom().saturating_sub(1),
        width,
        1.min(area.height),
    );
    app.badge_area = Some(badge_area);

    let badge = Paragraph::new(BADGE_TEXT).style(
        Style::default()
            .bg(Color::Magenta)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(Clear, badge_area);
    frame.render_widget(badge, badge_area);
}

/// Open state: header bar, transcript, and input box floating over the
/// bottom-right of the page content.
fn render_chat_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let width = PANEL_WIDTH.min(area.width);
    let height = PANEL_HEIGHT.min(area.height);
    let panel = Rect::new(
        area.right().saturating_sub(width),
        area.bottom().saturating_sub(height),
        width,
        height,
    );
    frame.render_widget(Clear, panel);

    let [header_area, chat_area, input_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(panel);

    // The header doubles as the minimize control for the mouse
    app.header_area = Some(header_area);
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            " HERO: Housing Essential Resource Organizer ",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("▼"),
    ]))
    .style(Style::default().bg(Color::Magenta).fg(Color::White));
    frame.render_widget(header, header_area);

    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store inner dimensions for the scroll math (minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let mut lines: Vec<Line> = Vec::new();

    for msg in &app.messages {
        let (label, label_style) = match msg.role {
            Role::User => (
                "You: ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Role::Assistant => (
                "Hero: ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        };

        let fragments = msg.fragments();

        // First fragment rides inline with the role label
        let mut inline = vec![Span::styled(label, label_style)];
        let mut fragment_lines = fragments
            .first()
            .map(|fragment| fragment.lines())
            .into_iter()
            .flatten();
        if let Some(first_line) = fragment_lines.next() {
            inline.extend(markdown_spans(first_line));
        }
        lines.push(Line::from(inline));
        for line in fragment_lines {
            lines.push(markdown_line(line));
        }
        lines.push(Line::default());

        // Each later fragment is its own block
        for fragment in fragments.iter().skip(1) {
            for line in fragment.lines() {
                lines.push(markdown_line(line));
            }
            lines.push(Line::default());
        }
    }

    if app.loading {
        lines.push(Line::from(Span::styled(
            "Hero:",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{dots}"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    if !app.error.is_empty() {
        lines.push(Line::from(Span::styled(
            app.error.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    let transcript = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(transcript, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.loading {
        Color::DarkGray
    } else {
        Color::Yellow
    };
    let title = if app.loading { " Sending... " } else { " Ask " };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Horizontal scroll keeps the cursor visible in a narrow box
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.input.is_empty() && !app.loading {
        Paragraph::new(INPUT_PLACEHOLDER)
            .style(Style::default().fg(Color::DarkGray))
            .block(block)
    } else {
        let visible_text: String = app
            .input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text)
            .style(Style::default().fg(Color::Cyan))
            .block(block)
    };

    frame.render_widget(input, area);

    // The cursor hides while a request is in flight, matching the disabled
    // input state
    if !app.loading {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}
