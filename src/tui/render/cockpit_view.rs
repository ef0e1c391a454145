use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::model::record::TaskRecord;
use crate::tui::app::App;
use crate::util::time::{format_countdown, format_total};
use crate::util::unicode::{display_width, fit_to_width, truncate_to_width};

use super::helpers::{proportional_widths, spans_width, task_glyph};

const LABEL_WIDTH: usize = 7;

/// Render the dashboard: NOW card, next / must / ribbon / scheduled, task list
pub fn render_cockpit_view(frame: &mut Frame, app: &App, area: Rect) {
    let summary = summary_lines(app, area.width as usize);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),                     // NOW card
            Constraint::Length(summary.len() as u16), // next / must / ribbon / at
            Constraint::Min(1),                        // task list
        ])
        .split(area);

    render_now_card(frame, app, chunks[0]);
    let bg = Style::default().bg(app.theme.background);
    frame.render_widget(Paragraph::new(summary).style(bg), chunks[1]);
    render_task_list(frame, app, chunks[2]);
}

// ---------------------------------------------------------------------------
// NOW card
// ---------------------------------------------------------------------------

fn render_now_card(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let running = app.cockpit.now.is_some();
    let border = if running {
        app.theme.highlight
    } else {
        app.theme.dim
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(bg))
        .title(Span::styled(
            " NOW ",
            Style::default()
                .fg(app.theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ));
    let inner_width = area.width.saturating_sub(2) as usize;

    let lines = match (&app.cockpit.now, &app.cockpit.now_detail) {
        (Some(record), Some(detail)) => {
            // Countdown when there is an estimate, elapsed time otherwise
            let (clock_text, clock_color) = match (detail.remaining_seconds, detail.elapsed_seconds)
            {
                (Some(left), _) => (format_countdown(left), app.theme.countdown_color(left)),
                (None, Some(elapsed)) => (format_countdown(elapsed), app.theme.text),
                (None, None) => ("--:--".to_string(), app.theme.dim),
            };
            let title_width = inner_width.saturating_sub(display_width(&clock_text) + 4);
            let title = format!(" ⌛ {}", truncate_to_width(&record.title, title_width));
            let mut first = vec![Span::styled(
                title,
                Style::default()
                    .fg(app.theme.text_bright)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            )];
            let pad = inner_width.saturating_sub(spans_width(&first) + display_width(&clock_text) + 1);
            first.push(Span::styled(" ".repeat(pad), Style::default().bg(bg)));
            first.push(Span::styled(
                clock_text,
                Style::default()
                    .fg(clock_color)
                    .bg(bg)
                    .add_modifier(Modifier::BOLD),
            ));

            let mut facts = Vec::new();
            if let Some(start) = detail.start {
                facts.push(format!("start {}", start));
            }
            if let Some(est) = record.estimate_minutes {
                facts.push(format!("est {}", format_total(est)));
            }
            if let Some(ends) = detail.ends_at {
                facts.push(format!("ends {}", ends));
            }
            let second = Span::styled(
                format!("   {}", facts.join(" · ")),
                Style::default().fg(app.theme.text).bg(bg),
            );
            vec![Line::from(first), Line::from(second)]
        }
        _ => {
            let hint = match &app.cockpit.next {
                Some(next) => format!(
                    "   s to start: {}",
                    truncate_to_width(&next.title, inner_width.saturating_sub(16))
                ),
                None => "   a to add a task".to_string(),
            };
            vec![
                Line::from(Span::styled(
                    " READY",
                    Style::default()
                        .fg(app.theme.green)
                        .bg(bg)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg))),
            ]
        }
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

// ---------------------------------------------------------------------------
// Summary rows
// ---------------------------------------------------------------------------

fn label(app: &App, text: &str) -> Span<'static> {
    Span::styled(
        format!("{:<width$}", format!(" {}", text), width = LABEL_WIDTH),
        Style::default()
            .fg(app.theme.purple)
            .bg(app.theme.background)
            .add_modifier(Modifier::BOLD),
    )
}

fn summary_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let bg = app.theme.background;
    let text = Style::default().fg(app.theme.text).bg(bg);
    let dim = Style::default().fg(app.theme.dim).bg(bg);
    let room = width.saturating_sub(LABEL_WIDTH + 1);
    let mut lines = Vec::new();

    // NEXT
    let next = match &app.cockpit.next {
        Some(r) => Span::styled(truncate_to_width(&task_label(r), room), text),
        None => Span::styled("—", dim),
    };
    lines.push(Line::from(vec![label(app, "NEXT"), next]));

    // MUST
    if app.cockpit.must.is_empty() {
        lines.push(Line::from(vec![label(app, "MUST"), Span::styled("—", dim)]));
    }
    for (i, record) in app.cockpit.must.iter().enumerate() {
        let head = if i == 0 {
            label(app, "MUST")
        } else {
            Span::styled(" ".repeat(LABEL_WIDTH), Style::default().bg(bg))
        };
        let (mark, style) = if record.is_done {
            ("✅ ", dim)
        } else {
            ("· ", text)
        };
        lines.push(Line::from(vec![
            head,
            Span::styled(mark, style),
            Span::styled(truncate_to_width(&record.title, room.saturating_sub(3)), style),
        ]));
    }

    // Ribbon
    lines.push(ribbon_line(app, width));

    // Scheduled
    for record in &app.cockpit.scheduled {
        let Some(at) = record.scheduled_at else {
            continue;
        };
        let style = if record.is_done { dim } else { text };
        lines.push(Line::from(vec![
            label(app, "AT"),
            Span::styled(format!("{} ", at), Style::default().fg(app.theme.cyan).bg(bg)),
            Span::styled(truncate_to_width(&record.title, room.saturating_sub(6)), style),
        ]));
    }

    lines.push(Line::from(""));
    lines
}

/// One row of blocks, one per logged entry, widths proportional to minutes
/// (each clamped to the ribbon cap).
fn ribbon_line(app: &App, width: usize) -> Line<'static> {
    let bg = app.theme.background;
    let cockpit = &app.cockpit;
    let totals = format!(
        " {} +{}",
        format_total(cockpit.done_minutes),
        format_total(cockpit.running_minutes)
    );
    let bar_cells = width.saturating_sub(LABEL_WIDTH + display_width(&totals) + 1);

    let mut spans = vec![label(app, "DONE")];
    if cockpit.segments.is_empty() {
        spans.push(Span::styled(
            fit_to_width("·", bar_cells),
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    } else {
        let weights: Vec<u32> = cockpit.segments.iter().map(|s| s.width_minutes).collect();
        let widths = proportional_widths(&weights, bar_cells);
        let mut used = 0;
        for (i, (segment, cells)) in cockpit.segments.iter().zip(widths).enumerate() {
            used += cells;
            spans.push(Span::styled(
                "█".repeat(cells),
                Style::default()
                    .fg(app.theme.segment_color(segment.kind, i))
                    .bg(bg),
            ));
        }
        spans.push(Span::styled(
            " ".repeat(bar_cells.saturating_sub(used)),
            Style::default().bg(bg),
        ));
    }
    spans.push(Span::styled(
        totals,
        Style::default().fg(app.theme.text).bg(bg),
    ));
    Line::from(spans)
}

fn task_label(record: &TaskRecord) -> String {
    match record.estimate_minutes {
        Some(est) => format!("{} ({}m)", record.title, est),
        None => record.title.clone(),
    }
}

// ---------------------------------------------------------------------------
// Task list
// ---------------------------------------------------------------------------

fn render_task_list(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let rows = (area.height as usize).saturating_sub(1);
    let tasks: Vec<&TaskRecord> = app
        .cockpit
        .tasks
        .iter()
        .take(app.vault.config.cockpit.task_list_limit)
        .collect();

    let mut lines = vec![Line::from(vec![
        label(app, "TASKS"),
        Span::styled(
            format!("{} open", app.cockpit.tasks.len()),
            Style::default().fg(app.theme.dim).bg(bg),
        ),
    ])];

    let cursor_row = tasks.iter().position(|r| r.start_line == app.cursor);
    let offset = match cursor_row {
        Some(row) if row >= rows => row + 1 - rows,
        _ => 0,
    };

    for (i, record) in tasks.iter().enumerate().skip(offset).take(rows) {
        let is_cursor = cursor_row == Some(i);
        let row_bg = if is_cursor { app.theme.selection_bg } else { bg };
        let fg = if record.is_running {
            app.theme.highlight
        } else if is_cursor {
            app.theme.text_bright
        } else {
            app.theme.text
        };

        let mut spans = vec![
            Span::styled(
                format!("{:>5}  ", record.start_line + 1),
                Style::default().fg(app.theme.dim).bg(row_bg),
            ),
            Span::styled(
                format!("{} ", task_glyph(record)),
                Style::default().fg(fg).bg(row_bg),
            ),
        ];
        let mut tail = String::new();
        if let Some(est) = record.estimate_minutes {
            tail.push_str(&format!(" {}m", est));
        }
        if record.is_must {
            tail.push_str(" !");
        }
        let title_room = width.saturating_sub(spans_width(&spans) + display_width(&tail) + 1);
        spans.push(Span::styled(
            fit_to_width(&record.title, title_room),
            Style::default().fg(fg).bg(row_bg),
        ));
        spans.push(Span::styled(
            format!("{} ", tail),
            Style::default().fg(app.theme.dim).bg(row_bg),
        ));
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;

    fn render(app: &App) -> String {
        render_to_string(TERM_W, TERM_H, |frame, area| {
            render_cockpit_view(frame, app, area);
        })
    }

    #[test]
    fn cockpit_running_task() {
        let app = app_for(SAMPLE_LOG, "09:10");
        let output = render(&app);
        assert!(output.contains("⌛"));
        assert!(output.contains("Write report"));
        // 30m estimate, 10m in
        assert!(output.contains("20:00"));
        assert!(output.contains("start 09:00 · est 30m · ends 09:30"));
        assert!(output.contains("NEXT  11:00 Read papers (15m)"));
        assert!(output.contains("MUST  · Write report"));
        assert!(output.contains("AT    11:00 11:00 Read papers"));
        assert!(output.contains("10m +10m"));
    }

    #[test]
    fn cockpit_overrun_goes_negative() {
        let app = app_for(SAMPLE_LOG, "09:45");
        let output = render(&app);
        assert!(output.contains("-15:00"));
    }

    #[test]
    fn cockpit_ready_state() {
        let app = app_for(EMPTY_LOG, "09:10");
        let output = render(&app);
        assert!(output.contains("READY"));
        assert!(output.contains("a to add a task"));
        assert!(output.contains("NEXT  —"));
        assert!(output.contains("0 open"));
    }

    #[test]
    fn cockpit_ready_points_at_next() {
        let app = app_for("# Log\n- Plan the day (5m)\n", "07:00");
        let output = render(&app);
        assert!(output.contains("READY"));
        assert!(output.contains("s to start: Plan the day"));
    }

    #[test]
    fn task_list_lists_open_tasks_with_line_numbers() {
        let app = app_for(SAMPLE_LOG, "09:10");
        let output = render(&app);
        assert!(output.contains("2 open"));
        assert!(output.contains("    6  ⌛"));
        assert!(output.contains("    9  · 11:00 Read papers"));
        assert!(!output.contains("Mail"));
    }
}
