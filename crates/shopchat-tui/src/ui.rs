use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;
use shopchat_core::{ChatBackend, Sender, SUGGESTIONS};
use crate::app::{App, Focus, LogRow, RowKind};

/// Most rows the input box grows to before it starts scrolling.
const MAX_INPUT_ROWS: u16 = 4;

pub fn render<B: ChatBackend>(app: &mut App<B>, frame: &mut Frame) {
    let area = frame.area();

    let chips = layout_chips(area.width.saturating_sub(2));
    let chip_rows = chips.iter().map(|c| c.y + 1).max().unwrap_or(1);
    let input_rows = (app.input.split('\n').count() as u16).clamp(1, MAX_INPUT_ROWS);

    // Main layout: header, conversation, suggestions, input, footer
    let [header_area, log_area, suggestions_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(chip_rows + 2),
        Constraint::Length(input_rows + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_log(app, frame, log_area);
    render_suggestions(app, frame, suggestions_area, &chips);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header<B: ChatBackend>(app: &App<B>, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Shop Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!(" {} ", app.endpoint), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn render_log<B: ChatBackend>(app: &mut App<B>, frame: &mut Frame, area: Rect) {
    // Store area for mouse hit-testing and inner size for scroll calculations
    app.log_area = Some(area);
    app.log_height = area.height.saturating_sub(2);
    app.log_width = area.width.saturating_sub(2);

    // Clamp against the same rows that get drawn
    let rows = app.log_rows();
    app.clamp_log_scroll(rows.len());

    let border_color = if app.focus == Focus::Log { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    let lines: Vec<Line> = rows
        .into_iter()
        .skip(app.log_scroll)
        .take(app.log_height as usize)
        .map(log_line)
        .collect();

    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn log_line(row: LogRow) -> Line<'static> {
    let (style, alignment) = match row.kind {
        RowKind::Label(Sender::User) => (
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Alignment::Right,
        ),
        RowKind::Text(Sender::User) => (Style::default().fg(Color::Cyan), Alignment::Right),
        RowKind::Label(Sender::Bot) => (
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            Alignment::Left,
        ),
        RowKind::Text(Sender::Bot) | RowKind::Blank => (Style::default(), Alignment::Left),
        RowKind::Typing => (
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            Alignment::Left,
        ),
    };
    Line::from(Span::styled(row.text, style)).alignment(alignment)
}

fn chip_label(idx: usize) -> String {
    format!(" {} {} ", idx + 1, SUGGESTIONS[idx])
}

/// Flow the suggestion chips left to right, wrapping onto new rows like the
/// buttons of a flex-wrap bar. Returned rects are relative to the inner area.
pub fn layout_chips(width: u16) -> Vec<Rect> {
    let width = width.max(1);
    let mut chips = Vec::with_capacity(SUGGESTIONS.len());
    let (mut x, mut y) = (0u16, 0u16);

    for idx in 0..SUGGESTIONS.len() {
        let chip_width = (chip_label(idx).width() as u16).min(width);
        if x > 0 && x + chip_width > width {
            x = 0;
            y += 1;
        }
        chips.push(Rect::new(x, y, chip_width, 1));
        x += chip_width + 1;
    }
    chips
}

fn render_suggestions<B: ChatBackend>(app: &mut App<B>, frame: &mut Frame, area: Rect, chips: &[Rect]) {
    let focused = app.focus == Focus::Suggestions;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Suggestions ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let busy = app.is_busy();
    app.suggestion_areas.clear();

    for (idx, chip) in chips.iter().enumerate() {
        let rect = Rect::new(inner.x + chip.x, inner.y + chip.y, chip.width, chip.height)
            .intersection(inner);
        if rect.is_empty() {
            continue;
        }
        app.suggestion_areas.push(rect);

        let style = if busy {
            Style::default().fg(Color::DarkGray)
        } else if focused && idx == app.selected_suggestion {
            Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        };
        frame.render_widget(Paragraph::new(chip_label(idx)).style(style), rect);
    }
}

fn render_input<B: ChatBackend>(app: &App<B>, frame: &mut Frame, area: Rect) {
    let busy = app.is_busy();
    let focused = app.focus == Focus::Input;
    let border_color = if busy {
        Color::DarkGray
    } else if focused {
        Color::Yellow
    } else {
        Color::Gray
    };
    let title = if busy { " Waiting for reply... " } else { " Message (Enter to send) " };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    // Cursor row and display column within the (possibly multi-line) buffer
    let before_cursor: String = app.input.chars().take(app.input_cursor).collect();
    let row = before_cursor.matches('\n').count() as u16;
    let col = before_cursor
        .rsplit('\n')
        .next()
        .map(UnicodeWidthStr::width)
        .unwrap_or(0) as u16;

    // Scroll so the cursor stays visible
    let row_offset = row.saturating_sub(inner_height.saturating_sub(1));
    let col_offset = col.saturating_sub(inner_width.saturating_sub(1));

    let input = if app.input.is_empty() {
        Paragraph::new(Span::styled(
            "Type your message...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let style = if busy { Style::default().fg(Color::DarkGray) } else { Style::default().fg(Color::Cyan) };
        Paragraph::new(app.input.as_str())
            .style(style)
            .scroll((row_offset, col_offset))
    };
    frame.render_widget(input.block(block), area);

    if focused && !busy {
        frame.set_cursor_position((
            area.x + 1 + col - col_offset,
            area.y + 1 + row - row_offset,
        ));
    }
}

fn render_footer<B: ChatBackend>(app: &App<B>, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let (mode_text, hints): (&str, &[(&str, &str)]) = match app.focus {
        Focus::Input => (
            " INPUT ",
            &[("Enter", "send"), ("Alt+Enter", "newline"), ("Tab", "focus"), ("Esc", "clear/quit")][..],
        ),
        Focus::Suggestions => (
            " SUGGEST ",
            &[("←/→", "select"), ("Enter", "send"), ("1-4", "send"), ("Tab", "focus"), ("q", "quit")][..],
        ),
        Focus::Log => (
            " LOG ",
            &[("j/k", "scroll"), ("g/G", "top/bottom"), ("1-4", "send"), ("Tab", "focus"), ("q", "quit")][..],
        ),
    };

    let mut spans = vec![
        Span::styled(mode_text, Style::default().bg(Color::Blue).fg(Color::White)),
        Span::raw(" "),
    ];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
