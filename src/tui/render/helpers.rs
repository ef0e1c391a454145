use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::Span;

use crate::model::record::TaskRecord;
use crate::util::unicode;

/// State glyph shown in front of a task title
pub(super) fn task_glyph(record: &TaskRecord) -> &'static str {
    if record.is_running {
        "⌛"
    } else if record.is_done {
        "✅"
    } else if record.is_memo {
        "📝"
    } else {
        "·"
    }
}

/// Compute total display width of a slice of spans
pub(super) fn spans_width(spans: &[Span]) -> usize {
    spans
        .iter()
        .map(|s| unicode::display_width(&s.content))
        .sum()
}

/// Create a centered rectangle of the given percentage of the parent
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Split `cells` among `weights` proportionally; every non-zero weight gets
/// at least one cell while room lasts.
pub(super) fn proportional_widths(weights: &[u32], cells: usize) -> Vec<usize> {
    let total: u64 = weights.iter().map(|w| u64::from(*w)).sum();
    if total == 0 || cells == 0 {
        return vec![0; weights.len()];
    }
    let mut used = 0usize;
    weights
        .iter()
        .map(|w| {
            let share = (u64::from(*w) * cells as u64 / total) as usize;
            let share = if *w > 0 { share.max(1) } else { 0 };
            let share = share.min(cells - used);
            used += share;
            share
        })
        .collect()
}
