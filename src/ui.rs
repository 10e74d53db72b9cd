//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from presenter state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! The layout is a three-line panel (badge plus label) on top and a one-line
//! status bar at the bottom.  "Show problem" opens a centred popup over both.
//!
//! ## For contributors
//!
//! * Badge colours follow the operator: red for DB, light red for ÖBB, grey
//!   while disconnected.  They are defined inline in `badge_style`.
//! * The tests render into a [`ratatui::backend::TestBackend`] and search the
//!   buffer text, so keep visible strings stable or update the tests with them.

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::selector::ActiveSource;

/// Draw the complete UI for one frame.
pub fn draw(app: &App, frame: &mut Frame) {
    let [panel_area, _, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_panel(app, frame, panel_area);
    draw_status_bar(app, frame, status_area);

    if app.show_problem {
        draw_problem(app, frame);
    }
}

fn badge_style(active: ActiveSource) -> Style {
    let colour = match active {
        ActiveSource::Ice => Color::Red,
        ActiveSource::Railjet => Color::LightRed,
        ActiveSource::Disconnected => Color::DarkGray,
    };
    Style::default().fg(Color::White).bg(colour).add_modifier(Modifier::BOLD)
}

/// Render the badge and label line.
fn draw_panel(app: &App, frame: &mut Frame, area: Rect) {
    let label_style = if app.stale || app.active == ActiveSource::Disconnected {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", app.active.badge()), badge_style(app.active)),
        Span::raw(" "),
        Span::styled(app.label.as_str(), label_style),
    ];
    if app.stale {
        spans.push(Span::styled("  (stale)", Style::default().fg(Color::Yellow)));
    }

    let panel = Paragraph::new(Line::from(spans))
        .block(Block::default().title(" railpanel ").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let updated = app
        .updated_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".into());

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(format!("source: {}", app.active), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("updated {updated} ({} polls)", app.ticks),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  p: show problem  q: quit"),
    ]));
    frame.render_widget(status, area);
}

/// Render the "Show problem" popup.
fn draw_problem(app: &App, frame: &mut Frame) {
    let [area] = Layout::vertical([Constraint::Length(5)])
        .flex(Flex::Center)
        .areas(frame.area());
    let [area] = Layout::horizontal([Constraint::Percentage(70)])
        .flex(Flex::Center)
        .areas(area);

    let popup = Paragraph::new(app.problem_text())
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(" Problem ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
    frame.render_widget(Clear, area);
    frame.render_widget(popup, area);
}
