use crate::model::line::{ChildEntry, LineKind};
use crate::model::record::{ChildLine, TaskRecord};

use super::classify::{
    classify, extract_estimate, extract_id, extract_link, extract_schedule, is_memo_parent,
    is_must, parent_text, title_of,
};

/// Group every parent line with the indented child lines that follow it.
///
/// One pass, no backtracking. A block ends at the next parent or heading;
/// blank lines and stray text inside a block are skipped without closing it.
pub fn build_records<S: AsRef<str>>(lines: &[S]) -> Vec<TaskRecord> {
    let mut records: Vec<TaskRecord> = Vec::new();
    let mut current: Option<TaskRecord> = None;

    for (idx, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        match classify(line) {
            LineKind::Parent => {
                if let Some(done) = current.take() {
                    records.push(finish(done, idx));
                }
                current = Some(start_record(idx, line));
            }
            LineKind::Heading { .. } => {
                if let Some(done) = current.take() {
                    records.push(finish(done, idx));
                }
            }
            LineKind::Child(entry) => {
                if let Some(record) = current.as_mut() {
                    record.children.push(ChildLine {
                        line: idx,
                        text: line.to_string(),
                        entry,
                    });
                }
            }
            LineKind::Blank | LineKind::Other => {}
        }
    }

    if let Some(done) = current.take() {
        records.push(finish(done, lines.len()));
    }
    records
}

fn start_record(idx: usize, line: &str) -> TaskRecord {
    let text = parent_text(line);
    TaskRecord {
        start_line: idx,
        end_line: idx + 1,
        raw: line.to_string(),
        title: title_of(line),
        estimate_minutes: extract_estimate(text),
        is_must: is_must(text),
        is_memo: is_memo_parent(line),
        id: extract_id(line),
        link: extract_link(text),
        scheduled_at: extract_schedule(text),
        children: Vec::new(),
        is_done: false,
        is_running: false,
    }
}

fn finish(mut record: TaskRecord, end_line: usize) -> TaskRecord {
    record.end_line = end_line;
    record.is_done = record.children.iter().any(|c| c.entry.is_done());
    record.is_running = record
        .latest_hourglass()
        .is_some_and(|c| matches!(c.entry, ChildEntry::Hourglass { end: None, .. }));
    record
}

/// Index of the record whose block contains `line`, if any.
pub fn record_at(records: &[TaskRecord], line: usize) -> Option<&TaskRecord> {
    records
        .iter()
        .find(|r| (r.start_line..r.end_line).contains(&line))
}
