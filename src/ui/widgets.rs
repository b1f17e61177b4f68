use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus};
use crate::workflow::WorkflowState;

const PAPER_BORDER: Color = Color::Rgb(139, 69, 19);
const INK: Color = Color::Rgb(210, 180, 140);

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

pub fn render_header(frame: &mut Frame, area: Rect) {
    let header = vec![
        Line::from(Span::styled(
            "THE HISTORIC TIMES",
            Style::default().fg(INK).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "ALL THE NEWS THAT WAS FIT TO PRINT",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(header).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(PAPER_BORDER)),
    );

    frame.render_widget(paragraph, area);
}

pub fn render_model_selector(frame: &mut Frame, app: &App, area: Rect) {
    let line = if app.models_loading {
        Line::from(Span::styled("Loading models...", Style::default().fg(Color::DarkGray)))
    } else if let Some(error) = &app.models_error {
        Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))
    } else if app.available_models.is_empty() {
        Line::from(Span::styled("No models available", Style::default().fg(Color::DarkGray)))
    } else if let Some(index) = app.selected_model {
        Line::from(vec![
            Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                app.current_model().to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("  ({}/{})", index + 1, app.available_models.len()),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    } else {
        Line::from(Span::styled(
            "Select a model (Up/Down)",
            Style::default().fg(Color::Gray),
        ))
    };

    let selector = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" AI Model ")
            .border_style(focus_style(app.focus == Focus::Model)),
    );

    frame.render_widget(selector, area);
}

pub fn render_date_picker(frame: &mut Frame, app: &App, area: Rect) {
    let date = app.selected_date.date().format("%B %d, %Y").to_string();
    let picker = Paragraph::new(Line::from(vec![
        Span::styled("◀ ", Style::default().fg(Color::DarkGray)),
        Span::styled(date, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(" ▶", Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Date ")
            .border_style(focus_style(app.focus == Focus::Date)),
    );

    frame.render_widget(picker, area);
}

pub fn render_submit_button(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.is_loading() {
        ("Searching the archives...", Style::default().fg(Color::DarkGray))
    } else {
        (
            "Enter: What happened then?",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    };

    let button = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(button, area);
}

/// Scroll offset that keeps lines `start..end` inside a window of `height`
/// lines, moving as little as possible from `current`.
pub const fn scroll_to_keep_visible(
    current: usize,
    start: usize,
    end: usize,
    height: usize,
) -> usize {
    if start < current {
        start
    } else if end > current + height {
        end.saturating_sub(height)
    } else {
        current
    }
}

fn visual_height(line: &Line, width: usize) -> usize {
    let line_width = line.width();
    if line_width == 0 || width == 0 {
        1
    } else {
        line_width.div_ceil(width)
    }
}

fn message_lines(title: &str, color: Color, detail: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(
            title.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(detail.to_string(), Style::default().fg(INK))),
    ]
}

pub fn render_results_card(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = app.queried_date.map_or_else(
        || " Historic Events ".to_string(),
        |date| format!(" {} ", date.display_string()),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center)
        .border_style(if app.focus == Focus::Results {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(PAPER_BORDER)
        });

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    let mut scroll = 0;
    let (lines, alignment) = match &app.state {
        WorkflowState::Idle => (
            message_lines(
                "Welcome to Chronicle Explorer",
                Color::Magenta,
                "Pick an AI model and a date, then press Enter to see what happened on that day.",
            ),
            Alignment::Center,
        ),
        WorkflowState::Loading => {
            let mut lines = message_lines(
                "Consulting the archives...",
                Color::Yellow,
                "The historian is leafing through old newspapers.",
            );
            lines.push(Line::from(""));
            for width in [60, 100, 100, 80] {
                lines.push(Line::from(Span::styled(
                    "░".repeat(inner_width * width / 100),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            (lines, Alignment::Center)
        }
        WorkflowState::Error(message) => (
            message_lines("Error Loading Events", Color::Red, message),
            Alignment::Center,
        ),
        WorkflowState::Success(events) if events.is_empty() => (
            message_lines(
                "No Historic Events Found",
                INK,
                "Please try a different date or check the server response.",
            ),
            Alignment::Center,
        ),
        WorkflowState::Success(events) => {
            let mut lines: Vec<Line<'static>> = Vec::new();
            let mut selected_range = (0, 0);

            for (index, event) in events.iter().enumerate() {
                let selected = index == app.selected_event;
                let start: usize = lines.iter().map(|l| visual_height(l, inner_width)).sum();

                let marker = if selected { "▶ " } else { "  " };
                let title_style = if selected {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(INK)
                };
                lines.push(Line::from(vec![
                    Span::styled(marker, Style::default().fg(Color::Yellow)),
                    Span::styled(
                        event.year.clone(),
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(event.title.clone(), title_style),
                ]));
                if event.has_description() {
                    lines.push(Line::from(Span::styled(
                        format!("        {}", event.description),
                        Style::default().fg(Color::Gray),
                    )));
                }
                lines.push(Line::from(""));

                if selected {
                    let end: usize = lines.iter().map(|l| visual_height(l, inner_width)).sum();
                    selected_range = (start, end);
                }
            }

            scroll = scroll_to_keep_visible(
                app.scroll_offset,
                selected_range.0,
                selected_range.1,
                inner_height,
            );
            (lines, Alignment::Left)
        }
    };

    // Sync the actual scroll back to the app state
    app.scroll_offset = scroll;

    let card = Paragraph::new(lines)
        .alignment(alignment)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));

    frame.render_widget(card, area);
}

pub fn render_link_line(frame: &mut Frame, app: &App, area: Rect) {
    let Some(url) = app.selected_event().and_then(|event| event.search_url()) else {
        return;
    };

    let link = Paragraph::new(Line::from(vec![
        Span::styled("Search: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            url.to_string(),
            Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        ),
    ]));

    frame.render_widget(link, area);
}

pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (backend, backend_color) = match app.backend_healthy {
        Some(true) => ("● backend online", Color::Green),
        Some(false) => ("● backend unreachable", Color::Red),
        None => ("○ checking backend", Color::DarkGray),
    };

    let (state, state_color) = match &app.state {
        WorkflowState::Idle => ("Idle".to_string(), Color::DarkGray),
        WorkflowState::Loading => ("Loading...".to_string(), Color::Yellow),
        WorkflowState::Success(events) => (format!("{} events", events.len()), Color::Green),
        WorkflowState::Error(_) => ("Error".to_string(), Color::Red),
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(backend, Style::default().fg(backend_color)),
        Span::raw("  |  "),
        Span::styled(
            state,
            Style::default().fg(state_color).add_modifier(Modifier::BOLD),
        ),
    ]))
    .alignment(Alignment::Right);

    frame.render_widget(status, area);
}

pub fn render_bottom_bar(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.exit_pending {
        (
            "Press Ctrl+C again to exit, Esc to cancel",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            "Ctrl+C: Quit | Ctrl+H: Help | Tab: Focus | Up/Down: Change | Enter: Search",
            Style::default().fg(Color::DarkGray),
        )
    };

    let bar = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(style);

    frame.render_widget(bar, area);
}

pub fn render_help_window(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from(Span::styled(
            "Chronicle Explorer - Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("General:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Ctrl+H        - Show/hide this help"),
        Line::from("  Ctrl+R        - Reload models"),
        Line::from("  Ctrl+Q        - Quit application"),
        Line::from("  Ctrl+C        - Quit application"),
        Line::from("  Tab           - Move focus"),
        Line::from(""),
        Line::from(Span::styled("Model:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Up/Down       - Previous/next model"),
        Line::from(""),
        Line::from(Span::styled("Date:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Up/Down       - Next/previous day"),
        Line::from("  PgUp/PgDn     - Next/previous month"),
        Line::from(""),
        Line::from(Span::styled("Results:", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  Up/Down       - Select event"),
        Line::from("  Enter         - Ask about the selected date"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Ctrl+H or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    let popup_width = 60;
    let popup_height = 24;
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: popup_width.min(area.width),
        height: popup_height.min(area.height),
    };

    frame.render_widget(Clear, popup_area);
    frame.render_widget(help_paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_keeps_selection_visible() {
        // already visible
        assert_eq!(scroll_to_keep_visible(0, 2, 5, 10), 0);
        // below the window
        assert_eq!(scroll_to_keep_visible(0, 12, 15, 10), 5);
        // above the window
        assert_eq!(scroll_to_keep_visible(8, 3, 6, 10), 3);
    }

    #[test]
    fn test_visual_height_wraps() {
        assert_eq!(visual_height(&Line::from(""), 10), 1);
        assert_eq!(visual_height(&Line::from("abcdefghij"), 10), 1);
        assert_eq!(visual_height(&Line::from("abcdefghijk"), 10), 2);
        assert_eq!(visual_height(&Line::from("abc"), 0), 1);
    }
}
