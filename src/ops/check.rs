use std::collections::HashMap;

use serde::Serialize;

use crate::model::document::LogDocument;
use crate::model::line::ChildEntry;
use crate::parse::build_records;
use crate::parse::classify::{collect_ids, extract_id};

use super::ids::{generate_unique_id, set_id};

/// Structured result from `tc check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// Something that breaks the cockpit's reading of the log.
///
/// Line numbers are 1-based, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// Two or more tasks carry the same `tc:id`
    #[serde(rename = "duplicate_id")]
    DuplicateId { id: String, lines: Vec<usize> },
    /// More than one task has a running ⌛ entry
    #[serde(rename = "multiple_running")]
    MultipleRunning { lines: Vec<usize> },
}

/// A validation warning (non-critical issue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// ⌛ entry without a start time; End will refuse it
    #[serde(rename = "missing_start_time")]
    MissingStartTime { line: usize, title: String },
    /// ✅ entry whose range could not be read
    #[serde(rename = "unreadable_done")]
    UnreadableDone { line: usize, title: String },
    /// Task has log entries but no id
    #[serde(rename = "missing_id")]
    MissingId { line: usize, title: String },
}

// ---------------------------------------------------------------------------
// Main check entry point
// ---------------------------------------------------------------------------

/// Validate one daily log. Read-only.
///
/// Checks performed:
/// 1. No two tasks share a `tc:id`
/// 2. At most one task is running
/// 3. Warnings for ⌛ entries without start, unreadable ✅ ranges and
///    started tasks without an id
pub fn check_log(doc: &LogDocument) -> CheckResult {
    let mut result = CheckResult::default();
    let records = build_records(doc.lines());

    for (id, lines) in find_duplicate_ids(doc) {
        result.errors.push(CheckError::DuplicateId { id, lines });
    }

    let running: Vec<usize> = records
        .iter()
        .filter_map(|r| r.running_child().map(|c| c.line + 1))
        .collect();
    if running.len() > 1 {
        result
            .errors
            .push(CheckError::MultipleRunning { lines: running });
    }

    for record in &records {
        for child in &record.children {
            match &child.entry {
                ChildEntry::Hourglass { start: None, .. } => {
                    result.warnings.push(CheckWarning::MissingStartTime {
                        line: child.line + 1,
                        title: record.title.clone(),
                    });
                }
                ChildEntry::Done { start, end, .. } if start.is_none() || end.is_none() => {
                    result.warnings.push(CheckWarning::UnreadableDone {
                        line: child.line + 1,
                        title: record.title.clone(),
                    });
                }
                _ => {}
            }
        }
        let has_entries = record
            .children
            .iter()
            .any(|c| c.entry.is_hourglass() || c.entry.is_done());
        if has_entries && record.id.is_none() {
            result.warnings.push(CheckWarning::MissingId {
                line: record.start_line + 1,
                title: record.title.clone(),
            });
        }
    }

    result.valid = result.errors.is_empty();
    result
}

/// Ids that appear on more than one line, with those lines (1-based), in
/// order of first appearance.
fn find_duplicate_ids(doc: &LogDocument) -> Vec<(String, Vec<usize>)> {
    let mut order: Vec<String> = Vec::new();
    let mut seen: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, line) in doc.lines().iter().enumerate() {
        if let Some(id) = extract_id(line) {
            let entry = seen.entry(id.clone()).or_default();
            if entry.is_empty() {
                order.push(id);
            }
            entry.push(idx + 1);
        }
    }
    order
        .into_iter()
        .filter_map(|id| {
            let lines = seen.remove(&id)?;
            (lines.len() > 1).then_some((id, lines))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Repair
// ---------------------------------------------------------------------------

/// A line rewritten by `fix_ids`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdFix {
    /// 1-based
    pub line: usize,
    pub old_id: String,
    pub new_id: String,
}

/// Give every repeated id after its first occurrence a fresh one.
pub fn fix_ids(doc: &mut LogDocument, generate: &mut impl FnMut() -> String) -> Vec<IdFix> {
    let mut fixes = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for idx in 0..doc.len() {
        let Some(line) = doc.line(idx) else {
            continue;
        };
        let Some(id) = extract_id(line) else {
            continue;
        };
        if !seen.contains(&id) {
            seen.push(id);
            continue;
        }
        let ids = collect_ids(doc.lines().iter().map(String::as_str));
        let new_id = generate_unique_id(&ids, generate);
        let updated = set_id(line, &new_id);
        doc.set_line(idx, updated);
        seen.push(new_id.clone());
        fixes.push(IdFix {
            line: idx + 1,
            old_id: id,
            new_id,
        });
    }
    fixes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> LogDocument {
        LogDocument::from_text(text)
    }

    #[test]
    fn test_clean_log_is_valid() {
        let result = check_log(&doc(
            "- A <!-- tc:id=aaa111 -->\n  - ✅ 08:00–08:10 +10m\n- B <!-- tc:id=bbb222 -->\n  - ⌛ 09:00–\n- C\n",
        ));
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_ids() {
        let result = check_log(&doc(
            "- A <!-- tc:id=dup001 -->\n- B <!-- tc:id=ok0001 -->\n- C <!-- tc:id=dup001 -->\n",
        ));
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![CheckError::DuplicateId {
                id: "dup001".into(),
                lines: vec![1, 3],
            }]
        );
    }

    #[test]
    fn test_multiple_running() {
        let result = check_log(&doc(
            "- A <!-- tc:id=a1 -->\n  - ⌛ 08:00–\n- B <!-- tc:id=b1 -->\n  - ⌛ 09:00–\n",
        ));
        assert_eq!(
            result.errors,
            vec![CheckError::MultipleRunning { lines: vec![2, 4] }]
        );
    }

    #[test]
    fn test_warnings() {
        let result = check_log(&doc("- A\n  - ⌛\n- B <!-- tc:id=b1 -->\n  - ✅ later\n"));
        assert!(result.valid);
        assert_eq!(
            result.warnings,
            vec![
                CheckWarning::MissingStartTime {
                    line: 2,
                    title: "A".into()
                },
                CheckWarning::MissingId {
                    line: 1,
                    title: "A".into()
                },
                CheckWarning::UnreadableDone {
                    line: 4,
                    title: "B".into()
                },
            ]
        );
    }

    #[test]
    fn test_fix_ids_keeps_first_occurrence() {
        let mut d = doc("- A <!-- tc:id=dup001 -->\n- B <!-- tc:id=dup001 -->\n- C <!-- tc:id=dup001 -->\n");
        let mut next = ["new001", "new002"].into_iter().map(String::from);
        let fixes = fix_ids(&mut d, &mut || next.next().unwrap_or_default());
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].line, 2);
        assert_eq!(fixes[1].new_id, "new002");
        assert_eq!(
            d.to_text(),
            "- A <!-- tc:id=dup001 -->\n- B <!-- tc:id=new001 -->\n- C <!-- tc:id=new002 -->\n"
        );
        assert!(check_log(&d).valid);
    }
}
