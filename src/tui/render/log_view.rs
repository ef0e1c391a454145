use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::line::{ChildEntry, LineKind};
use crate::parse::classify;
use crate::tui::app::App;
use crate::util::unicode::fit_to_width;

/// Render the log itself, one row per visible line, cursor row highlighted
pub fn render_log_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let height = area.height as usize;
    let visible = app.visible_lines();

    // Keep the cursor row on screen
    let cursor_row = visible
        .iter()
        .position(|&l| l >= app.cursor)
        .unwrap_or(visible.len().saturating_sub(1));
    if cursor_row < app.scroll_offset {
        app.scroll_offset = cursor_row;
    } else if height > 0 && cursor_row >= app.scroll_offset + height {
        app.scroll_offset = cursor_row + 1 - height;
    }

    let gutter = format!("{}", app.doc.len()).len().max(3);
    let mut lines: Vec<Line> = Vec::new();
    for (row, &idx) in visible
        .iter()
        .enumerate()
        .skip(app.scroll_offset)
        .take(height)
    {
        let text = app.doc.line(idx).unwrap_or_default();
        let is_cursor = row == cursor_row;
        let row_bg = if is_cursor { app.theme.selection_bg } else { bg };
        let (fg, bold) = line_style(app, text);

        let mut style = Style::default().fg(fg).bg(row_bg);
        if bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        let number = format!(" {:>width$} ", idx + 1, width = gutter);
        let room = width.saturating_sub(number.len());
        lines.push(Line::from(vec![
            Span::styled(number, Style::default().fg(app.theme.dim).bg(row_bg)),
            Span::styled(fit_to_width(text, room), style),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

fn line_style(app: &App, text: &str) -> (Color, bool) {
    match classify(text) {
        LineKind::Heading { .. } => (app.theme.text_bright, true),
        LineKind::Parent => (app.theme.text, false),
        LineKind::Child(entry) => match entry {
            ChildEntry::Hourglass { end: None, .. } => (app.theme.highlight, true),
            ChildEntry::Hourglass { .. } => (app.theme.yellow, false),
            ChildEntry::Done { .. } => (app.theme.green, false),
            ChildEntry::Memo { .. } => (app.theme.cyan, false),
            ChildEntry::Note { .. } => (app.theme.dim, false),
        },
        LineKind::Blank | LineKind::Other => (app.theme.dim, false),
    }
}
