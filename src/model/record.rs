use serde::Serialize;

use super::line::{ChildEntry, Link};
use crate::util::time::Clock;

/// A child line together with its position in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildLine {
    /// 0-indexed line in the document
    pub line: usize,
    pub text: String,
    pub entry: ChildEntry,
}

/// One task: a parent line plus the child lines under it.
///
/// Records are derived from the text on every read and never stored; the
/// `tc:id` comment is the only identity that survives edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    /// 0-indexed line of the parent
    pub start_line: usize,
    /// Exclusive end of the block (next parent, next heading, or EOF)
    pub end_line: usize,
    /// Parent line as written
    pub raw: String,
    /// Display title: no dash, id comment, estimate or must marker
    pub title: String,
    pub estimate_minutes: Option<u32>,
    pub is_must: bool,
    /// Parent starts with the memo marker; never a task candidate
    pub is_memo: bool,
    pub id: Option<String>,
    pub link: Option<Link>,
    pub scheduled_at: Option<Clock>,
    pub children: Vec<ChildLine>,
    /// Some child is a done line
    pub is_done: bool,
    /// The latest hourglass child has no end time
    pub is_running: bool,
}

impl TaskRecord {
    /// The latest hourglass child, running or not
    pub fn latest_hourglass(&self) -> Option<&ChildLine> {
        self.children.iter().rev().find(|c| c.entry.is_hourglass())
    }

    /// The running hourglass child, if the task is running
    pub fn running_child(&self) -> Option<&ChildLine> {
        self.latest_hourglass().filter(|c| c.entry.is_running())
    }

    /// The first hourglass child (the one `start` stamps)
    pub fn first_hourglass(&self) -> Option<&ChildLine> {
        self.children.iter().find(|c| c.entry.is_hourglass())
    }

    pub fn latest_done(&self) -> Option<&ChildLine> {
        self.children.iter().rev().find(|c| c.entry.is_done())
    }

    /// Neither done nor running and not a memo parent
    pub fn is_unprocessed(&self) -> bool {
        !self.is_memo && !self.is_done && !self.has_unfinished_hourglass()
    }

    pub fn has_unfinished_hourglass(&self) -> bool {
        self.children.iter().any(|c| c.entry.is_running())
    }

    /// Total of the done entries' durations, recorded annotation first.
    pub fn logged_minutes(&self) -> u32 {
        self.children
            .iter()
            .filter_map(|c| crate::ops::derive::done_minutes(&c.entry))
            .fold(0, u32::saturating_add)
    }
}
