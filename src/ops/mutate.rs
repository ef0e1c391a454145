use std::sync::LazyLock;

use regex::Regex;

use crate::model::line::{ChildEntry, DONE_MARKER, HOURGLASS, LineKind, RANGE_DASH};
use crate::parse::classify::{classify, strip_done_marker};
use crate::util::time::{Clock, diff_hhmm, diff_minutes, format_duration_annotation};

static HOURGLASS_HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*-\s+⌛\x{FE0F}?)(.*)$").unwrap());
static INDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\s*)-\s+(.*)$").unwrap());
static DONE_TIMES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{2}:\d{2})\s*[–-]\s*(\d{2}:\d{2})(.*)$").unwrap());
static ANNOTATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\+\d+m\b").unwrap());
static LOOSE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,2}:\d{2}").unwrap());

/// Why an action declined to touch the log.
///
/// These are expected outcomes (the user pointed at the wrong line, or
/// another surface already wrote the time), not bugs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Refusal {
    #[error("put the cursor on a task line")]
    NoParent,
    #[error("use this inside a ## section")]
    NoSection,
    #[error("section not found: {0}")]
    SectionNotFound(String),
    #[error("task text is empty")]
    EmptyTitle,
    #[error("already has a start time, not overwriting")]
    AlreadyStarted,
    #[error("running entry has no start time (start it first)")]
    MissingStartTime,
    #[error("already has an end time, not overwriting")]
    AlreadyClosed,
    #[error("no running ⌛ entry found")]
    NoRunningEntry,
    #[error("no ✅ entry found")]
    NoDoneEntry,
    #[error("no unprocessed task left to start")]
    NoStartCandidate,
    #[error("not an ⌛ line")]
    NotHourglass,
    #[error("not a ✅ line")]
    NotDone,
    #[error("could not read the times on this line")]
    UnreadableTimes,
    #[error("no change")]
    NoChange,
}

fn hourglass_times(line: &str) -> Result<(Option<Clock>, Option<Clock>), Refusal> {
    match classify(line) {
        LineKind::Child(ChildEntry::Hourglass { start, end }) => Ok((start, end)),
        _ => Err(Refusal::NotHourglass),
    }
}

fn indent_of(line: &str) -> &str {
    INDENT_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map_or("  ", |m| m.as_str())
}

/// Put `time` right after the hourglass of a not-yet-started entry.
///
/// Refuses with `AlreadyStarted` when a start time is present, even one that
/// does not read as a valid clock (`9:00`, `25:00`); callers keep the line
/// exactly as it was in that case.
pub fn stamp_start_time(line: &str, time: Clock) -> Result<String, Refusal> {
    let (start, _) = hourglass_times(line)?;
    if start.is_some() {
        return Err(Refusal::AlreadyStarted);
    }
    let caps = HOURGLASS_HEAD_RE
        .captures(line)
        .ok_or(Refusal::NotHourglass)?;
    let head = &caps[1];
    let tail = caps[2].trim();
    if LOOSE_TIME_RE.is_match(tail) {
        return Err(Refusal::AlreadyStarted);
    }
    let stamped = if tail.is_empty() {
        format!("{} {}{}", head, time, RANGE_DASH)
    } else if tail.starts_with(['–', '-']) {
        format!("{} {}{}", head, time, tail)
    } else {
        format!("{} {}{} {}", head, time, RANGE_DASH, tail)
    };
    Ok(stamped)
}

/// Turn an open hourglass entry into `- ✅ start–end +Nm`, keeping its indent.
pub fn close_as_hourglass(line: &str, start: Clock, end: Clock) -> Result<String, Refusal> {
    let (_, existing_end) = hourglass_times(line)?;
    if existing_end.is_some() {
        return Err(Refusal::AlreadyClosed);
    }
    Ok(format!(
        "{}- {} {}{}{} {}",
        indent_of(line),
        DONE_MARKER,
        start,
        RANGE_DASH,
        end,
        format_duration_annotation(diff_minutes(start, end))
    ))
}

/// Turn a done entry back into a running one from the same start time.
pub fn reopen_from_done(line: &str) -> Result<String, Refusal> {
    let start = match classify(line) {
        LineKind::Child(ChildEntry::Done { start, .. }) => start,
        _ => return Err(Refusal::NotDone),
    };
    let start = start.ok_or(Refusal::UnreadableTimes)?;
    Ok(format!(
        "{}- {} {}{}",
        indent_of(line),
        HOURGLASS,
        start,
        RANGE_DASH
    ))
}

/// Rewrite the `+Nm` annotation of a done line from its range.
///
/// Only the annotation changes; any other trailing text stays. A line whose
/// annotation is already right comes back unchanged.
pub fn recompute_duration(line: &str) -> Result<String, Refusal> {
    if !matches!(classify(line), LineKind::Child(ChildEntry::Done { .. })) {
        return Err(Refusal::NotDone);
    }
    let caps = INDENT_RE.captures(line).ok_or(Refusal::NotDone)?;
    let content = caps.get(2).map_or("", |m| m.as_str());
    let after_marker = strip_done_marker(content).ok_or(Refusal::NotDone)?;
    let times = DONE_TIMES_RE
        .captures(after_marker)
        .ok_or(Refusal::UnreadableTimes)?;
    let minutes = diff_hhmm(&times[1], &times[2]).ok_or(Refusal::UnreadableTimes)?;
    let annotation = format_duration_annotation(minutes);

    let tail = times.get(3).map_or("", |m| m.as_str());
    let tail_at = line.len() - tail.len();
    if let Some(m) = ANNOTATION_RE.find(tail) {
        let mut out = String::with_capacity(line.len() + 2);
        out.push_str(&line[..tail_at + m.start()]);
        out.push_str(&annotation);
        out.push_str(&line[tail_at + m.end()..]);
        Ok(out)
    } else {
        Ok(format!("{} {}", line.trim_end(), annotation))
    }
}
