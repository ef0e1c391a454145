/// The full content of one daily log, as lines.
///
/// Edits replace whole lines or insert new ones; lines are never reordered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogDocument {
    lines: Vec<String>,
    trailing_newline: bool,
}

impl LogDocument {
    /// Split on `\n`, tolerating `\r\n`.
    pub fn from_text(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let lines = text
            .lines()
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();
        LogDocument {
            lines,
            trailing_newline,
        }
    }

    /// Join back with `\n`, restoring the trailing newline if the source had one.
    pub fn to_text(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(|s| s.as_str())
    }

    /// Replace line `idx`. Out-of-range indices are ignored.
    pub fn set_line(&mut self, idx: usize, text: impl Into<String>) {
        if let Some(slot) = self.lines.get_mut(idx) {
            *slot = text.into();
        }
    }

    /// Insert a new line after `idx`, returning the new line's index.
    /// `None` inserts at the top.
    pub fn insert_after(&mut self, idx: Option<usize>, text: impl Into<String>) -> usize {
        let at = match idx {
            Some(i) => (i + 1).min(self.lines.len()),
            None => 0,
        };
        self.lines.insert(at, text.into());
        at
    }
}
