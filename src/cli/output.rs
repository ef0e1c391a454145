use serde::Serialize;

use crate::model::cockpit::Cockpit;
use crate::model::line::Link;
use crate::model::record::TaskRecord;
use crate::ops::check::{CheckResult, IdFix};
use crate::util::time::{Clock, format_countdown, format_total};

/// Placeholder for a time that could not be computed
pub const NO_TIME: &str = "--:--";
/// Placeholder for an empty slot
pub const EMPTY: &str = "—";

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    /// 1-based line of the task
    pub line: usize,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate_minutes: Option<u32>,
    pub must: bool,
    pub done: bool,
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<Clock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
    pub logged_minutes: u32,
}

#[derive(Serialize)]
pub struct NowJson {
    #[serde(flatten)]
    pub task: TaskJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Clock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<Clock>,
}

#[derive(Serialize)]
pub struct StatusJson {
    pub date: String,
    pub time: Clock,
    pub now: Option<NowJson>,
    pub next: Option<TaskJson>,
    pub must: Vec<TaskJson>,
    pub scheduled: Vec<TaskJson>,
    pub remaining_minutes: u32,
    pub eta: Option<Clock>,
    pub done_minutes: u32,
    pub running_minutes: u32,
}

/// Result of a write command
#[derive(Serialize)]
pub struct ActionJson {
    pub ok: bool,
    pub path: String,
    /// 1-based line the action landed on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Serialize)]
pub struct OpenJson {
    pub date: String,
    pub path: String,
    pub created: bool,
}

#[derive(Serialize)]
pub struct CheckJson<'a> {
    #[serde(flatten)]
    pub result: &'a CheckResult,
    #[serde(skip_serializing_if = "no_fixes")]
    pub fixed: &'a [IdFix],
}

fn no_fixes(fixed: &&[IdFix]) -> bool {
    fixed.is_empty()
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(record: &TaskRecord) -> TaskJson {
    TaskJson {
        line: record.start_line + 1,
        title: record.title.clone(),
        id: record.id.clone(),
        estimate_minutes: record.estimate_minutes,
        must: record.is_must,
        done: record.is_done,
        running: record.is_running,
        scheduled_at: record.scheduled_at,
        link: record.link.clone(),
        logged_minutes: record.logged_minutes(),
    }
}

pub fn status_to_json(cockpit: &Cockpit, date: String, time: Clock) -> StatusJson {
    let now = cockpit.now.as_ref().map(|record| {
        let detail = cockpit.now_detail.as_ref();
        NowJson {
            task: task_to_json(record),
            start: detail.and_then(|d| d.start),
            elapsed_seconds: detail.and_then(|d| d.elapsed_seconds),
            remaining_seconds: detail.and_then(|d| d.remaining_seconds),
            ends_at: detail.and_then(|d| d.ends_at),
        }
    });
    StatusJson {
        date,
        time,
        now,
        next: cockpit.next.as_ref().map(task_to_json),
        must: cockpit.must.iter().map(task_to_json).collect(),
        scheduled: cockpit.scheduled.iter().map(task_to_json).collect(),
        remaining_minutes: cockpit.remaining_minutes,
        eta: cockpit.eta,
        done_minutes: cockpit.done_minutes,
        running_minutes: cockpit.running_minutes,
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

fn clock_or_placeholder(clock: Option<Clock>) -> String {
    clock.map_or_else(|| NO_TIME.to_string(), |c| c.to_string())
}

/// One task for `tc list`: line number, state glyph, title, estimate.
pub fn format_task_line(record: &TaskRecord) -> String {
    let glyph = if record.is_running {
        "⌛"
    } else if record.is_done {
        "✅"
    } else if record.is_memo {
        "📝"
    } else {
        "·"
    };
    let mut line = format!("{:>4}  {} {}", record.start_line + 1, glyph, record.title);
    if let Some(est) = record.estimate_minutes {
        line.push_str(&format!(" ({}m)", est));
    }
    if record.is_must {
        line.push_str(" [must]");
    }
    line
}

/// Multi-line summary for `tc status`.
pub fn format_status(cockpit: &Cockpit, date: &str, time: Clock) -> Vec<String> {
    let mut lines = Vec::new();
    let eta = clock_or_placeholder(cockpit.eta);
    lines.push(format!(
        "{} {}  remaining {}  eta {}",
        date,
        time,
        format_total(cockpit.remaining_minutes),
        eta
    ));

    match (&cockpit.now, &cockpit.now_detail) {
        (Some(now), Some(detail)) => {
            let countdown = detail
                .remaining_seconds
                .map_or_else(|| NO_TIME.to_string(), format_countdown);
            let elapsed = detail
                .elapsed_seconds
                .map_or_else(|| EMPTY.to_string(), |s| format_total((s.max(0) / 60) as u32));
            lines.push(format!("NOW   {}", now.title));
            lines.push(format!(
                "      start {}  elapsed {}  left {}  ends {}",
                clock_or_placeholder(detail.start),
                elapsed,
                countdown,
                clock_or_placeholder(detail.ends_at)
            ));
        }
        _ => lines.push("NOW   READY".to_string()),
    }

    let next = cockpit
        .next
        .as_ref()
        .map_or(EMPTY.to_string(), |r| r.title.clone());
    lines.push(format!("NEXT  {}", next));

    if cockpit.must.is_empty() {
        lines.push(format!("MUST  {}", EMPTY));
    } else {
        for (i, record) in cockpit.must.iter().enumerate() {
            let label = if i == 0 { "MUST" } else { "" };
            let mark = if record.is_done { "✅" } else { "·" };
            lines.push(format!("{:<4}  {} {}", label, mark, record.title));
        }
    }

    for record in &cockpit.scheduled {
        if let Some(at) = record.scheduled_at {
            lines.push(format!("AT    {} {}", at, record.title));
        }
    }

    lines.push(format!(
        "DONE  {}  running {}  total {}",
        format_total(cockpit.done_minutes),
        format_total(cockpit.running_minutes),
        format_total(cockpit.done_minutes.saturating_add(cockpit.running_minutes))
    ));
    lines
}
