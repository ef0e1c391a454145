use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, View};
use crate::util::time::format_total;

use super::helpers::spans_width;

/// Render the header: date, view tabs and the horizon, with separator line below
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // tabs
            Constraint::Length(1), // separator
        ])
        .split(area);

    let sep_cols = render_tabs(frame, app, chunks[0]);
    render_separator(frame, app, chunks[1], &sep_cols);
}

/// Render tabs and return the column positions of each separator character.
fn render_tabs(frame: &mut Frame, app: &App, area: Rect) -> Vec<usize> {
    let bg = app.theme.background;
    let width = area.width as usize;
    let mut spans: Vec<Span> = Vec::new();
    let mut sep_cols: Vec<usize> = Vec::new();
    let sep = Span::styled("\u{2502}", Style::default().fg(app.theme.dim).bg(bg));

    spans.push(Span::styled(" ", Style::default().bg(bg)));
    spans.push(Span::styled(
        "\u{25B6}",
        Style::default().fg(app.theme.purple).bg(bg),
    ));
    spans.push(Span::styled(
        format!(" {} ", app.date_label()),
        Style::default()
            .fg(app.theme.text_bright)
            .bg(bg)
            .add_modifier(Modifier::BOLD),
    ));
    sep_cols.push(spans_width(&spans));
    spans.push(sep.clone());

    for (view, label) in [(View::Cockpit, "Cockpit"), (View::Log, "Log")] {
        spans.push(Span::styled(
            format!(" {} ", label),
            tab_style(app, app.view == view),
        ));
        sep_cols.push(spans_width(&spans));
        spans.push(sep.clone());
    }

    if app.focus_mode {
        spans.push(Span::styled(
            " focus ",
            Style::default().fg(app.theme.cyan).bg(bg),
        ));
    }

    // Right side: clock, remaining work and when it would be done
    let eta = app
        .cockpit
        .eta
        .map_or_else(|| "--:--".to_string(), |c| c.to_string());
    let horizon = format!(
        "{}  left {}  eta {} ",
        app.clock(),
        format_total(app.cockpit.remaining_minutes),
        eta
    );
    let used = spans_width(&spans);
    let horizon_width = crate::util::unicode::display_width(&horizon);
    if used + horizon_width < width {
        spans.push(Span::styled(
            " ".repeat(width - used - horizon_width),
            Style::default().bg(bg),
        ));
        spans.push(Span::styled(
            horizon,
            Style::default().fg(app.theme.text).bg(bg),
        ));
    }

    let tabs = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(tabs, area);
    sep_cols
}

fn render_separator(frame: &mut Frame, app: &App, area: Rect, sep_cols: &[usize]) {
    let width = area.width as usize;
    let mut line: String = String::with_capacity(width * 3);
    for col in 0..width {
        if sep_cols.contains(&col) {
            line.push('\u{2534}');
        } else {
            line.push('\u{2500}');
        }
    }
    let sep_widget =
        Paragraph::new(line).style(Style::default().fg(app.theme.dim).bg(app.theme.background));
    frame.render_widget(sep_widget, area);
}

/// Style for a tab: highlighted if current, normal otherwise
fn tab_style(app: &App, is_current: bool) -> Style {
    if is_current {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.text).bg(app.theme.background)
    }
}
