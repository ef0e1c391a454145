use chrono::NaiveTime;

use crate::model::cockpit::{Cockpit, NowDetail, Segment, SegmentKind};
use crate::model::config::CockpitConfig;
use crate::model::line::ChildEntry;
use crate::model::record::TaskRecord;
use crate::parse::parse_log;
use crate::util::time::{Clock, diff_minutes, elapsed_seconds, eta};

/// Knobs for `derive` that come from `[cockpit]` in chute.toml
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeriveOptions {
    pub must_limit: usize,
    pub ribbon_cap_minutes: u32,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        DeriveOptions::from(&CockpitConfig::default())
    }
}

impl From<&CockpitConfig> for DeriveOptions {
    fn from(config: &CockpitConfig) -> Self {
        DeriveOptions {
            must_limit: config.must_limit,
            ribbon_cap_minutes: config.ribbon_cap_minutes,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse `text` and derive the cockpit in one step.
pub fn cockpit(text: &str, now: NaiveTime, options: &DeriveOptions) -> Cockpit {
    derive(&parse_log(text), now, options)
}

/// Compute now / next / must / remaining / progress from parsed records.
///
/// Pure: the same records and the same `now` always give the same result.
/// An empty record list gives the "ready" cockpit.
pub fn derive(records: &[TaskRecord], now: NaiveTime, options: &DeriveOptions) -> Cockpit {
    let now_idx = find_now(records);
    let now_record = now_idx.map(|i| &records[i]);

    let next = records
        .iter()
        .enumerate()
        .find(|(i, r)| Some(*i) != now_idx && !r.is_done && !r.is_running && !r.is_memo)
        .map(|(_, r)| r.clone());

    let must: Vec<TaskRecord> = records
        .iter()
        .filter(|r| r.is_must)
        .take(options.must_limit)
        .cloned()
        .collect();

    let tasks: Vec<TaskRecord> = records
        .iter()
        .filter(|r| !r.is_done && !r.is_memo)
        .cloned()
        .collect();

    let scheduled: Vec<TaskRecord> = records
        .iter()
        .filter(|r| r.scheduled_at.is_some())
        .cloned()
        .collect();

    let remaining_minutes: u32 = records
        .iter()
        .filter(|r| !r.is_done)
        .filter_map(|r| r.estimate_minutes)
        .fold(0, u32::saturating_add);

    let segments = build_segments(records, now_idx, now, options.ribbon_cap_minutes);
    let done_minutes = segments
        .iter()
        .filter(|s| s.kind == SegmentKind::Done)
        .map(|s| s.minutes)
        .fold(0, u32::saturating_add);
    let running_minutes = segments
        .iter()
        .filter(|s| s.kind == SegmentKind::Running)
        .map(|s| s.minutes)
        .fold(0, u32::saturating_add);

    let now_clock = Clock::from_time(now);
    let now_detail = now_record.map(|r| describe_now(r, now));

    Cockpit {
        now: now_record.cloned(),
        now_detail,
        next,
        must,
        tasks,
        scheduled,
        remaining_minutes,
        eta: (remaining_minutes > 0).then(|| eta(now_clock, remaining_minutes)),
        segments,
        done_minutes,
        running_minutes,
        records: records.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Pieces
// ---------------------------------------------------------------------------

/// The running record whose running hourglass sits latest in the file.
fn find_now(records: &[TaskRecord]) -> Option<usize> {
    records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.running_child().map(|c| (i, c.line)))
        .max_by_key(|(_, line)| *line)
        .map(|(i, _)| i)
}

/// Minutes a closed entry took: the written `+Nm` first, else its range.
pub fn done_minutes(entry: &ChildEntry) -> Option<u32> {
    match entry {
        ChildEntry::Done {
            recorded_minutes: Some(m),
            ..
        } => Some(*m),
        ChildEntry::Done {
            start: Some(s),
            end: Some(e),
            ..
        } => Some(diff_minutes(*s, *e)),
        _ => None,
    }
}

fn build_segments(
    records: &[TaskRecord],
    now_idx: Option<usize>,
    now: NaiveTime,
    cap: u32,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let running_line = if Some(i) == now_idx {
            record.running_child().map(|c| c.line)
        } else {
            None
        };
        for child in &record.children {
            let (kind, minutes) = if child.entry.is_done() {
                match done_minutes(&child.entry) {
                    Some(m) => (SegmentKind::Done, m),
                    None => continue,
                }
            } else if Some(child.line) == running_line {
                match child.entry.start() {
                    Some(start) => (SegmentKind::Running, running_elapsed_minutes(start, now)),
                    None => continue,
                }
            } else {
                continue;
            };
            segments.push(Segment {
                kind,
                title: record.title.clone(),
                minutes,
                width_minutes: minutes.min(cap),
            });
        }
    }
    segments
}

fn running_elapsed_minutes(start: Clock, now: NaiveTime) -> u32 {
    u32::try_from(elapsed_seconds(start, now) / 60).unwrap_or(0)
}

fn describe_now(record: &TaskRecord, now: NaiveTime) -> NowDetail {
    let start = record.running_child().and_then(|c| c.entry.start());
    let elapsed = start.map(|s| elapsed_seconds(s, now));
    let remaining = match (record.estimate_minutes, elapsed) {
        (Some(est), Some(el)) => Some(i64::from(est) * 60 - el),
        _ => None,
    };
    let ends_at = match (start, record.estimate_minutes) {
        (Some(s), Some(est)) => Some(s.add_minutes(est)),
        _ => None,
    };
    NowDetail {
        start,
        elapsed_seconds: elapsed,
        remaining_seconds: remaining,
        ends_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn derive_text(text: &str, now: &str) -> Cockpit {
        cockpit(text, at(now), &DeriveOptions::default())
    }

    #[test]
    fn test_single_running_task() {
        let c = derive_text("- Task A (20m)\n  - ⌛ 09:00–", "09:05");
        let now = c.now.as_ref().unwrap();
        assert_eq!(now.title, "Task A");
        assert!(now.is_running);
        assert_eq!(c.remaining_minutes, 20);
        assert!(c.next.is_none());
    }

    #[test]
    fn test_now_detail_countdown() {
        let c = derive_text("- Task A (20m)\n  - ⌛ 09:00–", "09:05");
        let detail = c.now_detail.unwrap();
        assert_eq!(detail.start, Clock::parse("09:00"));
        assert_eq!(detail.elapsed_seconds, Some(300));
        assert_eq!(detail.remaining_seconds, Some(900));
        assert_eq!(detail.ends_at, Clock::parse("09:20"));
    }

    #[test]
    fn test_overrun_countdown_is_negative() {
        let c = derive_text("- Task A (5m)\n  - ⌛ 09:00–", "09:07");
        assert_eq!(c.now_detail.unwrap().remaining_seconds, Some(-120));
    }

    #[test]
    fn test_ready_when_nothing_runs() {
        let c = derive_text("- Task A (20m)\n- Task B", "10:00");
        assert!(c.is_ready());
        assert!(c.now_detail.is_none());
        assert_eq!(c.next.unwrap().title, "Task A");
    }

    #[test]
    fn test_empty_document_is_ready() {
        let c = derive_text("", "10:00");
        assert_eq!(c, Cockpit::default());
    }

    #[test]
    fn test_unparsable_document_is_ready() {
        let c = derive_text("just some prose\n  - ⌛ 09:00–\n## heading", "10:00");
        assert!(c.is_ready());
        assert!(c.next.is_none());
        assert!(c.tasks.is_empty());
        assert!(c.segments.is_empty());
    }

    #[test]
    fn test_next_skips_done_and_running() {
        let text = "\
- Done task
  - ✔ 08:00–08:30 +30m
- Running task
  - ⌛ 09:00–
- Waiting task (10m)
";
        let c = derive_text(text, "09:10");
        assert_eq!(c.next.unwrap().title, "Waiting task");
    }

    #[test]
    fn test_next_none_when_only_done_and_running() {
        let text = "- A\n  - ✔ 08:00–08:30 +30m\n- B\n  - ⌛ 09:00–\n";
        let c = derive_text(text, "09:10");
        assert!(c.next.is_none());
    }

    #[test]
    fn test_next_skips_memo_parent() {
        let c = derive_text("- 📝 thoughts\n- Real task", "09:00");
        assert_eq!(c.next.unwrap().title, "Real task");
        assert_eq!(c.tasks.len(), 1);
    }

    #[test]
    fn test_latest_running_wins_now() {
        let text = "- First\n  - ⌛ 09:00–\n- Second\n  - ⌛ 09:30–\n";
        let c = derive_text(text, "09:40");
        assert_eq!(c.now.unwrap().title, "Second");
        // the other running task is neither now nor next
        assert!(c.next.is_none());
    }

    #[test]
    fn test_must_is_capped_in_file_order() {
        let text = "- a #must\n- b #must\n- c #must\n- d #must\n";
        let c = cockpit(
            text,
            at("09:00"),
            &DeriveOptions {
                must_limit: 2,
                ribbon_cap_minutes: 240,
            },
        );
        let titles: Vec<_> = c.must.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn test_remaining_counts_running_and_skips_done() {
        let text = "\
- Done (30m)
  - ✅ 08:00–08:30 +30m
- Running (20m)
  - ⌛ 09:00–
- Todo (15m)
- No estimate
";
        let c = derive_text(text, "09:05");
        assert_eq!(c.remaining_minutes, 35);
        assert_eq!(c.eta, Clock::parse("09:40"));
    }

    #[test]
    fn test_segments_prefer_recorded_annotation() {
        let text = "- A\n  - ✅ 08:00–08:30 +25m\n- B\n  - ✅ 08:30–08:40\n";
        let c = derive_text(text, "09:00");
        let minutes: Vec<u32> = c.segments.iter().map(|s| s.minutes).collect();
        assert_eq!(minutes, vec![25, 10]);
        assert_eq!(c.done_minutes, 35);
    }

    #[test]
    fn test_ribbon_cap_does_not_touch_totals() {
        let text = "- Long\n  - ✅ 06:00–11:00 +300m\n- Now\n  - ⌛ 11:00–\n";
        let c = derive_text(text, "16:00");
        assert_eq!(c.segments[0].minutes, 300);
        assert_eq!(c.segments[0].width_minutes, 240);
        assert_eq!(c.segments[1].kind, SegmentKind::Running);
        assert_eq!(c.segments[1].minutes, 300);
        assert_eq!(c.segments[1].width_minutes, 240);
        assert_eq!(c.done_minutes, 300);
        assert_eq!(c.running_minutes, 300);
    }

    #[test]
    fn test_huge_annotations_saturate_totals() {
        let text = "- A\n  - ✅ 08:00–08:30 +4294967295m\n- B\n  - ✅ 08:30–08:40 +4294967295m\n";
        let c = derive_text(text, "09:00");
        assert_eq!(c.done_minutes, u32::MAX);
    }

    #[test]
    fn test_huge_annotations_saturate_logged_minutes() {
        let text = "- A\n  - ✅ 08:00–08:30 +4294967295m\n  - ✅ 08:30–08:40 +10m\n";
        let c = derive_text(text, "09:00");
        assert_eq!(c.records[0].logged_minutes(), u32::MAX);
        assert_eq!(c.done_minutes, u32::MAX);
    }

    #[test]
    fn test_running_segment_crosses_midnight() {
        let c = derive_text("- Night\n  - ⌛ 23:50–", "00:10");
        assert_eq!(c.running_minutes, 20);
    }

    #[test]
    fn test_done_line_without_times_has_no_segment() {
        let c = derive_text("- A\n  - ✅ sometime\n", "09:00");
        assert!(c.segments.is_empty());
        assert!(c.records[0].is_done);
    }

    #[test]
    fn test_scheduled_tasks() {
        let c = derive_text("- 10:30 meeting\n- lunch\n- 13:00 call (30m)", "09:00");
        let titles: Vec<_> = c.scheduled.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["10:30 meeting", "13:00 call"]);
    }

    #[test]
    fn test_derive_is_idempotent() {
        let text = "- A (10m) #must\n  - ✅ 08:00–08:10 +10m\n- B (20m)\n  - ⌛ 09:00–\n- C\n";
        assert_eq!(derive_text(text, "09:15"), derive_text(text, "09:15"));
    }
}
