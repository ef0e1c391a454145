use serde::Serialize;

use super::record::TaskRecord;
use crate::util::time::Clock;

/// Which kind of log entry a progress segment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Done,
    Running,
}

/// One block of the progress ribbon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub title: String,
    /// Actual duration
    pub minutes: u32,
    /// Duration clamped to the ribbon cap, for drawing only
    pub width_minutes: u32,
}

/// Live numbers for the running task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NowDetail {
    pub start: Option<Clock>,
    pub elapsed_seconds: Option<i64>,
    /// Estimate minus elapsed; negative once overrun
    pub remaining_seconds: Option<i64>,
    /// When the estimate runs out
    pub ends_at: Option<Clock>,
}

/// Everything a dashboard needs, derived from one snapshot of a log.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Cockpit {
    pub now: Option<TaskRecord>,
    pub now_detail: Option<NowDetail>,
    pub next: Option<TaskRecord>,
    pub must: Vec<TaskRecord>,
    /// Not-done tasks in file order
    pub tasks: Vec<TaskRecord>,
    pub scheduled: Vec<TaskRecord>,
    pub remaining_minutes: u32,
    pub eta: Option<Clock>,
    pub segments: Vec<Segment>,
    pub done_minutes: u32,
    pub running_minutes: u32,
    /// Every record, done ones included
    pub records: Vec<TaskRecord>,
}

impl Cockpit {
    /// "READY" state: nothing running
    pub fn is_ready(&self) -> bool {
        self.now.is_none()
    }
}
