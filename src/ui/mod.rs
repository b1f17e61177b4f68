pub mod widgets;

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Masthead
            Constraint::Length(3), // Model, date and submit controls
            Constraint::Min(0),    // Results card (flexible)
            Constraint::Length(1), // Search link for the selected event
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Bottom keymap bar
        ])
        .split(frame.area());

    let controls = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(chunks[1]);

    widgets::render_header(frame, chunks[0]);
    widgets::render_model_selector(frame, app, controls[0]);
    widgets::render_date_picker(frame, app, controls[1]);
    widgets::render_submit_button(frame, app, controls[2]);
    widgets::render_results_card(frame, app, chunks[2]);
    widgets::render_link_line(frame, app, chunks[3]);
    widgets::render_status_bar(frame, app, chunks[4]);
    widgets::render_bottom_bar(frame, app, chunks[5]);

    if app.show_help {
        widgets::render_help_window(frame, frame.area());
    }
}
