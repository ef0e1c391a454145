use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode};
use crate::util::unicode::{display_width, truncate_to_width};

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let (mut spans, hint) = match app.mode {
        Mode::Navigate => {
            let spans = match &app.notice {
                Some(notice) => {
                    let fg = if notice.is_error {
                        app.theme.red
                    } else {
                        app.theme.green
                    };
                    vec![Span::styled(
                        format!(" {}", truncate_to_width(&notice.text, width.saturating_sub(12))),
                        Style::default().fg(fg).bg(bg),
                    )]
                }
                None => Vec::new(),
            };
            (spans, "? help")
        }
        Mode::Prompt(kind) => {
            // Prompt: add> text▌
            let spans = vec![
                Span::styled(
                    format!(" {}> ", kind.label()),
                    Style::default().fg(app.theme.purple).bg(bg),
                ),
                Span::styled(
                    app.input.clone(),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ),
                Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)), // ▌ cursor
            ];
            (spans, "Enter save  Esc cancel")
        }
    };

    let content_width: usize = spans.iter().map(|s| display_width(&s.content)).sum();
    let hint_width = display_width(hint);
    if content_width + hint_width + 1 < width {
        let padding = width - content_width - hint_width - 1;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(
            hint,
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}
