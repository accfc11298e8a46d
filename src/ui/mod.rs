use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, FocusPane, FormField, OverlayState, WeatherOverlay};
use crate::filter::count_label;
use crate::notes::{util, Note, Priority};

const PREVIEW_LINES: usize = 2;

pub fn draw_app(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(4)])
        .split(frame.size());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(vertical[0]);

    draw_form(frame, state, columns[0]);
    draw_list(frame, state, columns[1], list_state);

    let status = build_status_line(state);
    let status_paragraph = Paragraph::new(status).style(Style::default().fg(Color::Gray));
    frame.render_widget(status_paragraph, vertical[1]);

    render_overlay(frame, state);
}

fn draw_form(frame: &mut Frame, state: &AppState, area: Rect) {
    let form_focused = matches!(state.focus, FocusPane::Form);
    let block_style = if form_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let title = if state.form.editing_id().is_some() {
        "Edit Note"
    } else {
        "New Note"
    };

    let mut lines = Vec::new();
    lines.push(field_line(
        "Title",
        &state.form.title,
        form_focused && state.form.active == FormField::Title,
    ));
    lines.push(Line::from(""));
    let content_active = form_focused && state.form.active == FormField::Content;
    lines.push(field_label("Content", content_active));
    if state.form.content.is_empty() {
        lines.push(input_line("", content_active));
    } else {
        let last = state.form.content.lines().count().saturating_sub(1);
        for (idx, text) in state.form.content.lines().enumerate() {
            lines.push(input_line(text, content_active && idx == last));
        }
        // A trailing newline means the cursor sits on a fresh empty line.
        if state.form.content.ends_with('\n') {
            lines.push(input_line("", content_active));
        }
    }
    lines.push(Line::from(""));
    lines.push(field_line(
        "Tags (comma separated)",
        &state.form.tags,
        form_focused && state.form.active == FormField::Tags,
    ));
    lines.push(Line::from(""));
    lines.push(priority_line(
        state.form.priority,
        form_focused && state.form.active == FormField::Priority,
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Ctrl-s save • Ctrl-l clear • Up/Down field • Esc back to list",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(block_style),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn label_span(label: &str, active: bool) -> Span<'static> {
    let style = if active {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Span::styled(label.to_string(), style)
}

fn field_label(label: &str, active: bool) -> Line<'static> {
    Line::from(label_span(label, active))
}

fn input_line(text: &str, active: bool) -> Line<'static> {
    let mut display = text.to_string();
    if active {
        display.push('▌');
    }
    Line::from(Span::raw(display))
}

fn field_line(label: &str, value: &str, active: bool) -> Line<'static> {
    let mut spans = vec![label_span(label, active), Span::raw(": ")];
    let mut display = value.to_string();
    if active {
        display.push('▌');
    }
    spans.push(Span::raw(display));
    Line::from(spans)
}

fn priority_line(priority: Priority, active: bool) -> Line<'static> {
    let mut spans = vec![label_span("Priority", active), Span::raw(": ")];
    if active {
        spans.push(Span::styled("◂ ", Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::styled(
        priority.to_string(),
        priority_style(priority).add_modifier(Modifier::BOLD),
    ));
    if active {
        spans.push(Span::styled(" ▸", Style::default().fg(Color::DarkGray)));
    }
    Line::from(spans)
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::Low => Style::default().fg(Color::Green),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::High => Style::default().fg(Color::Red),
    }
}

fn draw_list(frame: &mut Frame, state: &AppState, area: Rect, list_state: &mut ListState) {
    let block_style = if matches!(state.focus, FocusPane::List) {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let visible = state.visible();
    let inner_width = area.width.saturating_sub(4) as usize;
    let mut items = Vec::with_capacity(visible.len());
    for note in &visible {
        items.push(note_card(note, state, inner_width));
    }
    if items.is_empty() {
        let placeholder = if state.book().is_empty() {
            "No notes yet. Press Tab to reach the form and create one."
        } else {
            "No notes match the current filter."
        };
        items.push(ListItem::new(Span::styled(
            placeholder,
            Style::default().fg(Color::DarkGray),
        )));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("Notes ({})", count_label(visible.len())))
                .borders(Borders::ALL)
                .border_style(block_style),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, list_state);
}

fn note_card<'a>(note: &Note, state: &AppState, width: usize) -> ListItem<'a> {
    let mut title_spans = Vec::new();
    if state
        .move_source
        .as_deref()
        .map(|id| id == note.id)
        .unwrap_or(false)
    {
        title_spans.push(Span::styled(
            "⇅ ",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if state.form.is_editing(&note.id) {
        title_spans.push(Span::styled(
            "✎ ",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
    }
    title_spans.push(Span::styled(
        note.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    title_spans.push(Span::raw("  "));
    title_spans.push(Span::styled(
        format!("[{}]", note.priority),
        priority_style(note.priority),
    ));

    let mut lines = vec![
        Line::from(title_spans),
        Line::from(Span::styled(
            format!("Updated {}", util::format_date(note.updated_at)),
            Style::default().fg(Color::Gray),
        )),
    ];
    if let Some(tag_line) = tag_line(&note.tags) {
        lines.push(tag_line);
    }
    for text in note.content.lines().take(PREVIEW_LINES) {
        lines.push(Line::from(truncate_to_width(text, width)));
    }
    lines.push(Line::from(""));
    ListItem::new(lines)
}

fn tag_line(tags: &[String]) -> Option<Line<'static>> {
    if tags.is_empty() {
        return None;
    }
    let style = Style::default().fg(Color::Green);
    let mut spans = Vec::new();
    for (idx, tag) in tags.iter().enumerate() {
        spans.push(Span::styled(format!("#{tag}"), style));
        if idx + 1 < tags.len() {
            spans.push(Span::raw(" "));
        }
    }
    Some(Line::from(spans))
}

fn truncate_to_width(text: &str, width: usize) -> String {
    if width == 0 || UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let glyph = ch.to_string();
        let glyph_width = UnicodeWidthStr::width(glyph.as_str());
        if used + glyph_width + 1 > width {
            break;
        }
        used += glyph_width;
        out.push(ch);
    }
    out.push('…');
    out
}

fn build_status_line(state: &AppState) -> Text<'static> {
    let mut spans = vec![Span::raw(count_label(state.visible_len()))];

    let filter = state.priority_filter();
    spans.push(Span::raw(" | Priority: "));
    spans.push(Span::styled(
        filter.label().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ));

    if state.search_active || !state.query.search.is_empty() {
        let label_style = if state.search_active {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::raw(" | Search "));
        spans.push(Span::styled("/", label_style));
        if state.query.search.is_empty() {
            spans.push(Span::styled(
                "(type to search)",
                Style::default().fg(Color::DarkGray),
            ));
        } else {
            spans.push(Span::styled(
                state.query.search.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        if state.search_active {
            spans.push(Span::styled("▌", Style::default().fg(Color::Cyan)));
        }
    }

    if state.move_source.is_some() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            "MOVING",
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
    }

    if let Some(message) = &state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Cyan),
        ));
    }

    let mut lines = Vec::with_capacity(3);
    lines.push(Line::from(spans));
    lines.push(Line::from(vec![
        Span::styled(
            "Keys: ",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Tab focus • j/k move • n new • e edit • d delete • D delete all",
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    lines.push(Line::from(Span::styled(
        "      m grab/drop • / search • f priority filter • F clear filters • w weather • q quit",
        Style::default().fg(Color::DarkGray),
    )));
    Text::from(lines)
}

fn render_overlay(frame: &mut Frame, state: &AppState) {
    match &state.overlay {
        Some(OverlayState::ConfirmDelete(confirm)) => {
            let area = centered_rect(60, 30, frame.size());
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Delete Note",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(format!(
                    "Are you sure you want to delete '{}'?",
                    confirm.title
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter or y confirm • Esc or n cancel",
                    Style::default().fg(Color::Gray),
                )),
            ])
            .block(
                Block::default()
                    .title("Confirm Delete")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            )
            .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        Some(OverlayState::ConfirmDeleteAll) => {
            let area = centered_rect(50, 30, frame.size());
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Delete every note?",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "This cannot be undone.",
                    Style::default().fg(Color::Red),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter or y delete all • Esc or n cancel",
                    Style::default().fg(Color::Red),
                )),
            ])
            .block(
                Block::default()
                    .title("Delete All")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            );
            frame.render_widget(paragraph, area);
        }
        Some(OverlayState::Weather(overlay)) => {
            let area = centered_rect(60, 40, frame.size());
            frame.render_widget(Clear, area);
            let paragraph = Paragraph::new(weather_lines(overlay))
                .block(
                    Block::default()
                        .title("Weather")
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Cyan)),
                )
                .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
        }
        None => {}
    }
}

fn weather_lines(overlay: &WeatherOverlay) -> Vec<Line<'static>> {
    let mut city_display = overlay.city_input.clone();
    city_display.push('▌');
    let mut lines = vec![
        Line::from(Span::styled(
            "City Weather",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![Span::raw("City: "), Span::raw(city_display)]),
        Line::from(""),
    ];

    if overlay.loading {
        lines.push(Line::from(Span::styled(
            "Loading…",
            Style::default().fg(Color::Yellow),
        )));
    } else if let Some(error) = &overlay.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    } else if let Some(report) = &overlay.report {
        lines.push(Line::from(Span::styled(
            format!("Weather in {}", report.city),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(format!(
            "Temperature: {}°C",
            report.current.temperature
        )));
        lines.push(Line::from(format!(
            "Windspeed: {} km/h",
            report.current.windspeed
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "Type a city name and press Enter.",
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter search • Esc close",
        Style::default().fg(Color::Gray),
    )));
    lines
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_leaves_short_text_alone() {
        assert_eq!(truncate_to_width("short", 20), "short");
    }

    #[test]
    fn truncation_appends_an_ellipsis() {
        let out = truncate_to_width("a rather long preview line", 10);
        assert!(out.ends_with('…'));
        assert!(UnicodeWidthStr::width(out.as_str()) <= 10);
    }

    #[test]
    fn wide_glyphs_count_double() {
        let out = truncate_to_width("你好世界你好世界", 6);
        assert!(UnicodeWidthStr::width(out.as_str()) <= 6);
        assert!(out.ends_with('…'));
    }
}
