use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::line::{ChildEntry, DONE_MARKERS, Link, LineKind, MEMO};
use crate::util::time::Clock;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(#{1,6})\s+").unwrap());
static PARENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-\s+").unwrap());
static CHILD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s+-\s+(.*)$").unwrap());

static HOURGLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^⌛\x{FE0F}?\s*(\d{2}:\d{2})?\s*(?:[–-]\s*(\d{2}:\d{2}))?").unwrap()
});
static DONE_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d{2}:\d{2})\s*[–-]\s*(\d{2}:\d{2})").unwrap());
static ANNOTATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\+(\d+)m\b").unwrap());

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*tc:id=([A-Za-z0-9_-]+)\s*-->").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!--.*?-->").unwrap());
static ESTIMATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*(\d{1,4})\s*m?\s*\)").unwrap());
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
static WIKI_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").unwrap());
static MUST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(^|\s)#must\b").unwrap());
static SCHEDULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(\d{1,2}:\d{2})(?:\s|$)").unwrap());
static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Classify one line. Column-0 dash wins over every other reading.
pub fn classify(line: &str) -> LineKind {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if let Some(caps) = HEADING_RE.captures(line) {
        return LineKind::Heading {
            level: caps[1].len(),
        };
    }
    if PARENT_RE.is_match(line) {
        return LineKind::Parent;
    }
    if let Some(caps) = CHILD_RE.captures(line) {
        return LineKind::Child(classify_child(caps.get(1).map_or("", |m| m.as_str())));
    }
    LineKind::Other
}

/// Classify the content of a child line (the part after `- `).
fn classify_child(content: &str) -> ChildEntry {
    let content = content.trim_end();
    if let Some(caps) = HOURGLASS_RE.captures(content) {
        return ChildEntry::Hourglass {
            start: caps.get(1).and_then(|m| Clock::parse(m.as_str())),
            end: caps.get(2).and_then(|m| Clock::parse(m.as_str())),
        };
    }
    if let Some(rest) = strip_done_marker(content) {
        let (start, end) = match DONE_RANGE_RE.captures(rest) {
            Some(caps) => (Clock::parse(&caps[1]), Clock::parse(&caps[2])),
            None => (None, None),
        };
        let recorded_minutes = ANNOTATION_RE
            .captures(rest)
            .and_then(|caps| caps[1].parse().ok());
        return ChildEntry::Done {
            start,
            end,
            recorded_minutes,
        };
    }
    if let Some(rest) = content.strip_prefix(MEMO) {
        return ChildEntry::Memo {
            text: rest.trim().to_string(),
        };
    }
    ChildEntry::Note {
        text: content.to_string(),
    }
}

/// Text after any accepted done marker
pub fn strip_done_marker(content: &str) -> Option<&str> {
    DONE_MARKERS.iter().find_map(|m| content.strip_prefix(m))
}

pub fn is_heading(line: &str) -> bool {
    HEADING_RE.is_match(line)
}

/// `##` exactly (section headings that tasks are inserted under)
pub fn is_section_heading(line: &str) -> bool {
    matches!(classify(line), LineKind::Heading { level: 2 })
}

pub fn is_parent(line: &str) -> bool {
    PARENT_RE.is_match(line)
}

/// Indented dash line that is not a parent
pub fn is_child(line: &str) -> bool {
    !is_parent(line) && CHILD_RE.is_match(line)
}

pub fn is_hourglass_line(line: &str) -> bool {
    matches!(classify(line), LineKind::Child(ChildEntry::Hourglass { .. }))
}

/// Hourglass line without an end time
pub fn is_running_line(line: &str) -> bool {
    matches!(classify(line), LineKind::Child(e) if e.is_running())
}

pub fn is_done_line(line: &str) -> bool {
    matches!(classify(line), LineKind::Child(ChildEntry::Done { .. }))
}

/// Text of a parent line after the leading dash
pub fn parent_text(line: &str) -> &str {
    match PARENT_RE.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Parent text begins with the memo marker
pub fn is_memo_parent(line: &str) -> bool {
    is_parent(line) && parent_text(line).starts_with(MEMO)
}

/// The `tc:id` value embedded in a line
pub fn extract_id(line: &str) -> Option<String> {
    ID_RE.captures(line).map(|caps| caps[1].to_string())
}

/// Every `tc:id` in a text, duplicates included, in order.
pub fn collect_ids<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    lines
        .into_iter()
        .flat_map(|line| ID_RE.captures_iter(line).map(|caps| caps[1].to_string()))
        .collect()
}

/// The first `(Nm)` token and its minutes, when it is an accepted estimate.
fn estimate_match(text: &str) -> Option<(Range<usize>, u32)> {
    let caps = ESTIMATE_RE.captures(text)?;
    let minutes: u32 = caps[1].parse().ok()?;
    if !(1..=999).contains(&minutes) {
        return None;
    }
    Some((caps.get(0)?.range(), minutes))
}

/// `(20m)` / `(20)` → 20. Out-of-range or malformed → None.
pub fn extract_estimate(text: &str) -> Option<u32> {
    estimate_match(text).map(|(_, minutes)| minutes)
}

/// First link: markdown style wins over wiki style.
pub fn extract_link(text: &str) -> Option<Link> {
    if let Some(caps) = MD_LINK_RE.captures(text) {
        return Some(Link::Markdown {
            label: caps[1].to_string(),
            url: caps[2].to_string(),
        });
    }
    WIKI_LINK_RE.captures(text).map(|caps| {
        let target = caps[1].trim().to_string();
        let label = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| target.clone());
        Link::Wiki { target, label }
    })
}

pub fn is_must(text: &str) -> bool {
    MUST_RE.is_match(text)
}

/// A standalone `H:mm` time in the task text marks it as scheduled.
pub fn extract_schedule(text: &str) -> Option<Clock> {
    let stripped = COMMENT_RE.replace_all(text, " ");
    SCHEDULE_RE
        .captures(&stripped)
        .and_then(|caps| Clock::parse_loose(&caps[1]))
}

/// Display title of a parent line. Only the accepted estimate is dropped;
/// a rejected `(1000)` stays part of the title.
pub fn title_of(line: &str) -> String {
    let mut text = COMMENT_RE.replace_all(parent_text(line), " ").into_owned();
    if let Some((range, _)) = estimate_match(&text) {
        text.replace_range(range, " ");
    }
    let text = MUST_RE.replace_all(&text, "$1");
    SPACES_RE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> Clock {
        Clock::parse(s).unwrap()
    }

    #[test]
    fn test_classify_shapes() {
        assert_eq!(classify("# TaskChute 2026-01-10"), LineKind::Heading { level: 1 });
        assert_eq!(classify("## Morning"), LineKind::Heading { level: 2 });
        assert_eq!(classify("- Task A (20m)"), LineKind::Parent);
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("   "), LineKind::Blank);
        assert_eq!(classify("just prose"), LineKind::Other);
        assert_eq!(classify("#hashtag without space"), LineKind::Other);
    }

    #[test]
    fn test_classify_running_hourglass() {
        assert_eq!(
            classify("  - ⌛ 09:00–"),
            LineKind::Child(ChildEntry::Hourglass {
                start: Some(c("09:00")),
                end: None
            })
        );
        assert!(is_running_line("  - ⌛ 09:00–  "));
    }

    #[test]
    fn test_classify_hourglass_without_start() {
        assert_eq!(
            classify("  - ⌛"),
            LineKind::Child(ChildEntry::Hourglass {
                start: None,
                end: None
            })
        );
    }

    #[test]
    fn test_classify_hourglass_with_end_is_not_running() {
        let kind = classify("  - ⌛ 09:00–09:30");
        assert_eq!(
            kind,
            LineKind::Child(ChildEntry::Hourglass {
                start: Some(c("09:00")),
                end: Some(c("09:30"))
            })
        );
        assert!(!is_running_line("  - ⌛ 09:00–09:30"));
    }

    #[test]
    fn test_classify_done_variants() {
        for marker in ["✅", "✔️", "✔"] {
            let line = format!("  - {} 06:20–06:29 +9m", marker);
            assert_eq!(
                classify(&line),
                LineKind::Child(ChildEntry::Done {
                    start: Some(c("06:20")),
                    end: Some(c("06:29")),
                    recorded_minutes: Some(9),
                }),
                "marker {}",
                marker
            );
        }
    }

    #[test]
    fn test_classify_done_without_annotation() {
        assert_eq!(
            classify("  - ✅ 10:00-10:30"),
            LineKind::Child(ChildEntry::Done {
                start: Some(c("10:00")),
                end: Some(c("10:30")),
                recorded_minutes: None,
            })
        );
    }

    #[test]
    fn test_classify_memo_and_note() {
        assert_eq!(
            classify("  - 📝 called back"),
            LineKind::Child(ChildEntry::Memo {
                text: "called back".into()
            })
        );
        assert_eq!(
            classify("    - plain sub bullet"),
            LineKind::Child(ChildEntry::Note {
                text: "plain sub bullet".into()
            })
        );
    }

    #[test]
    fn test_parent_priority_over_child() {
        assert!(is_parent("- ⌛ 09:00–"));
        assert!(!is_child("- ⌛ 09:00–"));
        assert_eq!(classify("- ⌛ 09:00–"), LineKind::Parent);
    }

    #[test]
    fn test_extract_id() {
        assert_eq!(
            extract_id("- 英語 (2m)<!-- tc:id=yyccy0 -->").as_deref(),
            Some("yyccy0")
        );
        assert_eq!(extract_id("- no id"), None);
    }

    #[test]
    fn test_collect_ids_keeps_duplicates() {
        let ids = collect_ids([
            "- A <!-- tc:id=aaa -->",
            "  - ⌛ 09:00–",
            "- B <!-- tc:id=aaa -->",
            "- C <!--tc:id=ccc-->",
        ]);
        assert_eq!(ids, vec!["aaa", "aaa", "ccc"]);
    }

    #[test]
    fn test_extract_estimate() {
        assert_eq!(extract_estimate("- Task (20m)"), Some(20));
        assert_eq!(extract_estimate("- Task (20)"), Some(20));
        assert_eq!(extract_estimate("- Task ( 15 M )"), Some(15));
        assert_eq!(extract_estimate("- Task (0m)"), None);
        assert_eq!(extract_estimate("- Task (1000m)"), None);
        assert_eq!(extract_estimate("- Task (abc)"), None);
        assert_eq!(extract_estimate("- Task"), None);
    }

    #[test]
    fn test_extract_markdown_link_first() {
        let link = extract_link("- [英語](shortcuts://run?name=English) [[Note]]").unwrap();
        assert_eq!(
            link,
            Link::Markdown {
                label: "英語".into(),
                url: "shortcuts://run?name=English".into()
            }
        );
    }

    #[test]
    fn test_extract_wiki_link() {
        let link = extract_link("- [[2026-01-10 ミッション|ミッション]]をみる (1m)").unwrap();
        assert_eq!(link.label(), "ミッション");
        assert_eq!(link.target(), "2026-01-10 ミッション");

        let bare = extract_link("- read [[Inbox]]").unwrap();
        assert_eq!(bare.label(), "Inbox");
    }

    #[test]
    fn test_must_marker() {
        assert!(is_must("- 書類発送 #must (20m)"));
        assert!(is_must("- #MUST pay rent"));
        assert!(!is_must("- #mustard shopping"));
        assert!(!is_must("- must do later"));
    }

    #[test]
    fn test_schedule_token() {
        assert_eq!(extract_schedule("- 10:30 dentist"), Some(c("10:30")));
        assert_eq!(extract_schedule("- meet at 9:05"), Some(c("09:05")));
        assert_eq!(extract_schedule("- no time here (20m)"), None);
    }

    #[test]
    fn test_title_strips_annotations() {
        assert_eq!(title_of("- Task A (20m)"), "Task A");
        assert_eq!(
            title_of("- [英語](shortcuts://x) (2m)<!-- tc:id=yyccy0 -->"),
            "[英語](shortcuts://x)"
        );
        assert_eq!(title_of("- 書類発送 #must (20m)"), "書類発送");
    }

    #[test]
    fn test_title_keeps_rejected_estimate() {
        let line = "- Review (1000) items";
        assert_eq!(extract_estimate(line), None);
        assert_eq!(title_of(line), "Review (1000) items");
        assert_eq!(title_of("- Sort (0m) photos"), "Sort (0m) photos");
        assert_eq!(title_of("- Read (15m) ch. 2 (20m)"), "Read ch. 2 (20m)");
    }

    #[test]
    fn test_memo_parent() {
        assert!(is_memo_parent("- 📝 thoughts for today"));
        assert!(!is_memo_parent("  - 📝 child memo"));
    }
}
