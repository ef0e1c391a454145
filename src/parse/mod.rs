pub mod classify;
pub mod tree;

pub use classify::classify;
pub use tree::{build_records, record_at};

use crate::model::record::TaskRecord;

/// Parse the raw text of a daily log into task records.
pub fn parse_log(text: &str) -> Vec<TaskRecord> {
    let lines: Vec<&str> = text.lines().collect();
    build_records(&lines)
}
