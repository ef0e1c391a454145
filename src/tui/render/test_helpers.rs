use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::log_io::Vault;
use crate::model::config::Config;
use crate::model::document::LogDocument;
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// An App over an in-memory log with the clock pinned to `at` (HH:MM).
/// Nothing touches the disk until an action runs.
pub fn app_for(text: &str, at: &str) -> App {
    let vault = Vault {
        root: PathBuf::from("/tmp/chute-test"),
        config: Config::default(),
    };
    let date = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
    let time = NaiveTime::parse_from_str(at, "%H:%M").unwrap();
    App::new(
        vault,
        date,
        PathBuf::from("/tmp/chute-test/taskchute/2026-01-10.md"),
        LogDocument::from_text(text),
        Some(time),
    )
}

/// A morning in progress: one done task, one running, one waiting.
pub const SAMPLE_LOG: &str = "\
# TaskChute 2026-01-10

## Morning
- Mail (10m) <!-- tc:id=a1b2c3 -->
  - ✅ 08:00–08:10 +10m
- Write report (30m) #must <!-- tc:id=d4e5f6 -->
  - ⌛ 09:00–
  - 📝 outline first
- 11:00 Read papers (15m)
";

/// A fresh log with nothing in it yet.
pub const EMPTY_LOG: &str = "# TaskChute 2026-01-10\n\n";
