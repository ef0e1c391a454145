use log::debug;

use crate::model::document::LogDocument;
use crate::model::line::{ChildEntry, HOURGLASS, LineKind, MEMO, RANGE_DASH};
use crate::parse::classify::{
    classify, collect_ids, is_child, is_done_line, is_hourglass_line, is_memo_parent, is_parent,
    is_running_line,
};
use crate::util::time::Clock;

use super::ids::{generate_unique_id, upsert_unique_id};
use super::mutate::{
    Refusal, close_as_hourglass, recompute_duration, reopen_from_done, stamp_start_time,
};

/// What an action did to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Line the cursor should land on
    pub cursor_line: usize,
    /// Set when the action went through only partway
    pub warning: Option<Refusal>,
}

impl Applied {
    fn at(cursor_line: usize) -> Self {
        Applied {
            cursor_line,
            warning: None,
        }
    }
}

/// Where a new task line goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// End of the `##` section containing this line
    Cursor(usize),
    /// End of the `##` section with this heading text
    Section(String),
    /// After the last non-blank line of the document
    End,
}

// ---------------------------------------------------------------------------
// Locating lines
// ---------------------------------------------------------------------------

/// The parent task line for `line`: itself if it is a parent, the nearest
/// parent above if it is a child. Blank lines and headings have no parent.
pub fn parent_of(doc: &LogDocument, line: usize) -> Option<usize> {
    let text = doc.line(line)?;
    match classify(text) {
        LineKind::Parent => Some(line),
        LineKind::Child(_) => {
            for i in (0..line).rev() {
                match classify(doc.line(i)?) {
                    LineKind::Parent => return Some(i),
                    LineKind::Heading { .. } => return None,
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

/// Exclusive end of the block starting at `parent`: next parent, next
/// heading, or end of document.
pub fn block_end(doc: &LogDocument, parent: usize) -> usize {
    (parent + 1..doc.len())
        .find(|&i| {
            matches!(
                doc.line(i).map(classify),
                Some(LineKind::Parent | LineKind::Heading { .. })
            )
        })
        .unwrap_or(doc.len())
}

fn block_lines(doc: &LogDocument, parent: usize) -> std::ops::Range<usize> {
    parent + 1..block_end(doc, parent)
}

fn first_in_block(doc: &LogDocument, parent: usize, pred: impl Fn(&str) -> bool) -> Option<usize> {
    block_lines(doc, parent).find(|&i| doc.line(i).is_some_and(&pred))
}

fn last_in_block(doc: &LogDocument, parent: usize, pred: impl Fn(&str) -> bool) -> Option<usize> {
    block_lines(doc, parent)
        .rev()
        .find(|&i| doc.line(i).is_some_and(&pred))
}

fn last_in_file(doc: &LogDocument, pred: impl Fn(&str) -> bool) -> Option<usize> {
    (0..doc.len()).rev().find(|&i| doc.line(i).is_some_and(&pred))
}

fn first_in_file(doc: &LogDocument, pred: impl Fn(&str) -> bool) -> Option<usize> {
    (0..doc.len()).find(|&i| doc.line(i).is_some_and(&pred))
}

/// First parent that is not a memo and has neither a done nor a running entry.
pub fn first_unprocessed_parent(doc: &LogDocument) -> Option<usize> {
    (0..doc.len()).find(|&i| {
        let Some(text) = doc.line(i) else {
            return false;
        };
        is_parent(text)
            && !is_memo_parent(text)
            && first_in_block(doc, i, |l| is_done_line(l) || is_running_line(l)).is_none()
    })
}

/// The `##` heading governing `line`. A level-1 heading above ends the search.
pub fn section_of(doc: &LogDocument, line: usize) -> Option<usize> {
    let last = line.min(doc.len().checked_sub(1)?);
    for i in (0..=last).rev() {
        if let Some(LineKind::Heading { level }) = doc.line(i).map(classify) {
            match level {
                2 => return Some(i),
                1 => return None,
                _ => {}
            }
        }
    }
    None
}

fn find_section(doc: &LogDocument, name: &str) -> Option<usize> {
    (0..doc.len()).find(|&i| {
        doc.line(i).is_some_and(|l| {
            matches!(classify(l), LineKind::Heading { level: 2 })
                && l.trim_start().trim_start_matches('#').trim() == name.trim()
        })
    })
}

/// Exclusive end of a `##` section: the next level 1 or 2 heading.
fn section_end(doc: &LogDocument, header: usize) -> usize {
    (header + 1..doc.len())
        .find(|&i| {
            matches!(
                doc.line(i).map(classify),
                Some(LineKind::Heading { level: 1 | 2 })
            )
        })
        .unwrap_or(doc.len())
}

/// Line after which a new task goes: the last non-blank line of the section.
fn section_insert_point(doc: &LogDocument, header: usize) -> usize {
    (header..section_end(doc, header))
        .rev()
        .find(|&i| doc.line(i).is_some_and(|l| !l.trim().is_empty()))
        .unwrap_or(header)
}

fn ensure_id(doc: &mut LogDocument, parent: usize, generate: &mut impl FnMut() -> String) {
    let Some(text) = doc.line(parent) else {
        return;
    };
    let ids = collect_ids(doc.lines().iter().map(String::as_str));
    let (updated, _) = upsert_unique_id(text, &ids, generate);
    if updated != text {
        doc.set_line(parent, updated);
    }
}

fn running_hourglass_line(time: Clock) -> String {
    format!("  - {} {}{}", HOURGLASS, time, RANGE_DASH)
}

fn hourglass_start(text: &str) -> Option<Clock> {
    match classify(text) {
        LineKind::Child(ChildEntry::Hourglass { start, .. }) => start,
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Start / End / Resume
// ---------------------------------------------------------------------------

/// Start the task on `parent`: give it an id, then stamp its first ⌛ entry
/// or add a running one right under it.
pub fn start_at(
    doc: &mut LogDocument,
    parent: usize,
    now: Clock,
    generate: &mut impl FnMut() -> String,
) -> Result<Applied, Refusal> {
    if !doc.line(parent).is_some_and(is_parent) {
        return Err(Refusal::NoParent);
    }
    let mut work = doc.clone();
    ensure_id(&mut work, parent, generate);

    let cursor = match first_in_block(&work, parent, is_hourglass_line) {
        Some(idx) => {
            let text = work.line(idx).unwrap_or_default();
            let stamped = stamp_start_time(text, now)?;
            work.set_line(idx, stamped);
            idx
        }
        None => work.insert_after(Some(parent), running_hourglass_line(now)),
    };
    debug!("started task on line {} at {}", parent + 1, now);
    *doc = work;
    Ok(Applied::at(cursor))
}

/// Start the task under the cursor.
pub fn start(
    doc: &mut LogDocument,
    cursor: usize,
    now: Clock,
    generate: &mut impl FnMut() -> String,
) -> Result<Applied, Refusal> {
    let parent = parent_of(doc, cursor).ok_or(Refusal::NoParent)?;
    start_at(doc, parent, now, generate)
}

fn close_at(doc: &mut LogDocument, idx: usize, now: Clock) -> Result<(), Refusal> {
    let text = doc.line(idx).ok_or(Refusal::NoRunningEntry)?;
    let start = hourglass_start(text).ok_or(Refusal::MissingStartTime)?;
    let closed = close_as_hourglass(text, start, now)?;
    doc.set_line(idx, closed);
    Ok(())
}

/// Close the latest running ⌛ entry in the log.
pub fn end(doc: &mut LogDocument, now: Clock) -> Result<Applied, Refusal> {
    let idx = last_in_file(doc, is_running_line).ok_or(Refusal::NoRunningEntry)?;
    close_at(doc, idx, now)?;
    debug!("ended entry on line {} at {}", idx + 1, now);
    Ok(Applied::at(idx))
}

fn pick_end_target(doc: &LogDocument, cursor: usize) -> Option<usize> {
    if doc.line(cursor).is_some_and(is_running_line) {
        return Some(cursor);
    }
    parent_of(doc, cursor)
        .and_then(|p| first_in_block(doc, p, is_running_line))
        .or_else(|| first_in_file(doc, is_running_line))
}

/// Close the running entry nearest the cursor, then start the first
/// unprocessed task.
///
/// Nothing starts if the close is refused. When there is nothing left to
/// start the close is kept and the result carries a warning.
pub fn end_and_start(
    doc: &mut LogDocument,
    cursor: usize,
    now: Clock,
    generate: &mut impl FnMut() -> String,
) -> Result<Applied, Refusal> {
    let target = pick_end_target(doc, cursor).ok_or(Refusal::NoRunningEntry)?;
    let mut work = doc.clone();
    close_at(&mut work, target, now)?;

    let Some(parent) = first_unprocessed_parent(&work) else {
        *doc = work;
        return Ok(Applied {
            cursor_line: target,
            warning: Some(Refusal::NoStartCandidate),
        });
    };
    match start_at(&mut work, parent, now, generate) {
        Ok(applied) => {
            *doc = work;
            Ok(applied)
        }
        Err(refusal) => {
            *doc = work;
            Ok(Applied {
                cursor_line: target,
                warning: Some(refusal),
            })
        }
    }
}

/// Reopen the latest ✅ entry in the log as a running one.
pub fn resume(
    doc: &mut LogDocument,
    generate: &mut impl FnMut() -> String,
) -> Result<Applied, Refusal> {
    let idx = last_in_file(doc, is_done_line).ok_or(Refusal::NoDoneEntry)?;
    let text = doc.line(idx).unwrap_or_default();
    let reopened = reopen_from_done(text)?;
    let parent = parent_of(doc, idx).ok_or(Refusal::NoParent)?;

    let mut work = doc.clone();
    ensure_id(&mut work, parent, generate);
    work.set_line(idx, reopened);
    debug!("resumed entry on line {}", idx + 1);
    *doc = work;
    Ok(Applied::at(idx))
}

// ---------------------------------------------------------------------------
// Inserting lines
// ---------------------------------------------------------------------------

fn insert_point(doc: &LogDocument, anchor: &Anchor) -> Result<Option<usize>, Refusal> {
    match anchor {
        Anchor::Cursor(line) => {
            let header = section_of(doc, *line).ok_or(Refusal::NoSection)?;
            Ok(Some(section_insert_point(doc, header)))
        }
        Anchor::Section(name) => {
            let header =
                find_section(doc, name).ok_or_else(|| Refusal::SectionNotFound(name.clone()))?;
            Ok(Some(section_insert_point(doc, header)))
        }
        Anchor::End => Ok(doc
            .lines()
            .iter()
            .rposition(|l| !l.trim().is_empty())),
    }
}

/// Add a `- text` task line at the anchor.
pub fn insert_task(doc: &mut LogDocument, anchor: &Anchor, text: &str) -> Result<Applied, Refusal> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Refusal::EmptyTitle);
    }
    let after = insert_point(doc, anchor)?;
    let idx = doc.insert_after(after, format!("- {}", text));
    debug!("inserted task on line {}", idx + 1);
    Ok(Applied::at(idx))
}

/// Add a task with a fresh id and a running ⌛ entry. An empty text uses
/// the start time as a placeholder title.
pub fn insert_and_start(
    doc: &mut LogDocument,
    anchor: &Anchor,
    text: &str,
    now: Clock,
    generate: &mut impl FnMut() -> String,
) -> Result<Applied, Refusal> {
    let after = insert_point(doc, anchor)?;
    let title = match text.trim() {
        "" => now.to_string(),
        t => t.to_string(),
    };
    let ids = collect_ids(doc.lines().iter().map(String::as_str));
    let id = generate_unique_id(&ids, generate);

    let parent = doc.insert_after(after, format!("- {} <!-- tc:id={} -->", title, id));
    let child = doc.insert_after(Some(parent), running_hourglass_line(now));
    debug!("inserted and started task on line {}", parent + 1);
    Ok(Applied::at(child))
}

/// Add a `📝` memo under the task at the cursor: after the cursor's child
/// line, or right under the parent.
pub fn insert_memo(doc: &mut LogDocument, cursor: usize, text: &str) -> Result<Applied, Refusal> {
    let parent = parent_of(doc, cursor).ok_or(Refusal::NoParent)?;
    let end = block_end(doc, parent);
    let after = if doc.line(cursor).is_some_and(is_child) {
        cursor
    } else {
        parent
    };
    let after = after.min(end.saturating_sub(1)).max(parent);
    let memo = format!("  - {} {}", MEMO, text.trim());
    let idx = doc.insert_after(Some(after), memo.trim_end());
    Ok(Applied::at(idx))
}

// ---------------------------------------------------------------------------
// Recalculate / Focus
// ---------------------------------------------------------------------------

fn recompute_at(doc: &mut LogDocument, idx: usize) -> Result<Applied, Refusal> {
    let text = doc.line(idx).ok_or(Refusal::NoDoneEntry)?;
    let updated = recompute_duration(text)?;
    if updated == text {
        return Err(Refusal::NoChange);
    }
    doc.set_line(idx, updated);
    Ok(Applied::at(idx))
}

/// Recompute `+Nm` on the cursor's ✅ line, or on the latest ✅ entry of the
/// cursor's task.
pub fn recalculate(doc: &mut LogDocument, cursor: usize) -> Result<Applied, Refusal> {
    if doc.line(cursor).is_some_and(is_done_line) {
        return recompute_at(doc, cursor);
    }
    let parent = parent_of(doc, cursor).ok_or(Refusal::NoParent)?;
    let idx = last_in_block(doc, parent, is_done_line).ok_or(Refusal::NoDoneEntry)?;
    recompute_at(doc, idx)
}

/// Focus Mode: lines still shown once child lines other than ⌛ are hidden.
pub fn focus_lines(doc: &LogDocument) -> Vec<usize> {
    doc.lines()
        .iter()
        .enumerate()
        .filter(|(_, l)| !is_child(l) || is_hourglass_line(l))
        .map(|(i, _)| i)
        .collect()
}
