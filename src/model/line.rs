use serde::Serialize;

use crate::util::time::Clock;

/// Running timer marker on a child line
pub const HOURGLASS: &str = "⌛";
/// Marker written when a timer is closed
pub const DONE_MARKER: &str = "✅";
/// Every done marker the parser accepts (older logs use the heavy check mark)
pub const DONE_MARKERS: [&str; 3] = ["✅", "✔️", "✔"];
/// Free-text memo marker
pub const MEMO: &str = "📝";
/// Separator between start and end time
pub const RANGE_DASH: char = '–';

/// What a single line of a daily log is, decided once by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `#`..`######` heading; separates task blocks
    Heading { level: usize },
    /// Column-0 `- ` task line
    Parent,
    /// Indented `- ` line under a parent
    Child(ChildEntry),
    Blank,
    /// Anything else (stray prose); skipped
    Other,
}

/// A parsed child log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChildEntry {
    /// `- ⌛ HH:mm–` (running) or `- ⌛ HH:mm–HH:mm` (closed but not converted)
    Hourglass {
        start: Option<Clock>,
        end: Option<Clock>,
    },
    /// `- ✅ HH:mm–HH:mm +Nm`
    Done {
        start: Option<Clock>,
        end: Option<Clock>,
        /// The `+Nm` annotation as written, if any
        recorded_minutes: Option<u32>,
    },
    /// `- 📝 text`
    Memo { text: String },
    /// Indented line without a recognized marker
    Note { text: String },
}

impl ChildEntry {
    /// An hourglass entry with no end time
    pub fn is_running(&self) -> bool {
        matches!(self, ChildEntry::Hourglass { end: None, .. })
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ChildEntry::Done { .. })
    }

    pub fn is_hourglass(&self) -> bool {
        matches!(self, ChildEntry::Hourglass { .. })
    }

    pub fn start(&self) -> Option<Clock> {
        match self {
            ChildEntry::Hourglass { start, .. } | ChildEntry::Done { start, .. } => *start,
            _ => None,
        }
    }
}

/// First link on a task line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Link {
    /// `[label](url)`
    Markdown { label: String, url: String },
    /// `[[target|label]]` or `[[target]]`
    Wiki { target: String, label: String },
}

impl Link {
    pub fn label(&self) -> &str {
        match self {
            Link::Markdown { label, .. } | Link::Wiki { label, .. } => label,
        }
    }

    /// What to hand to an opener: the URL, or the wiki target note.
    pub fn target(&self) -> &str {
        match self {
            Link::Markdown { url, .. } => url,
            Link::Wiki { target, .. } => target,
        }
    }
}
