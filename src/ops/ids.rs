use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::parse::classify::extract_id;

static ID_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*tc:id=[A-Za-z0-9_-]+\s*-->").unwrap());

/// Length of a generated id
pub const ID_LEN: usize = 6;
/// Fresh ids tried before settling for the last one
pub const MAX_RETRIES: usize = 20;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A random 6-character lowercase base36 token.
pub fn generate_id() -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(ID_LEN);
    for _ in 0..ID_LEN {
        out.push(ALPHABET[(n % 36) as usize] as char);
        n /= 36;
    }
    out
}

/// True when `id` appears more than once in the file.
pub fn is_duplicate(ids_in_file: &[String], id: &str) -> bool {
    ids_in_file.iter().filter(|x| *x == id).count() >= 2
}

/// Draw ids from `generate` until one is not already in the file.
pub fn generate_unique_id(ids_in_file: &[String], generate: &mut impl FnMut() -> String) -> String {
    let mut id = generate();
    let mut tries = 0;
    while ids_in_file.contains(&id) && tries < MAX_RETRIES {
        id = generate();
        tries += 1;
    }
    id
}

/// Write `id` into a parent line: replace an existing id comment, or append one.
pub fn set_id(line: &str, id: &str) -> String {
    let comment = format!("<!-- tc:id={} -->", id);
    if ID_COMMENT_RE.is_match(line) {
        ID_COMMENT_RE
            .replacen(line, 1, regex::NoExpand(&comment))
            .into_owned()
    } else {
        format!("{} {}", line.trim_end(), comment)
    }
}

/// Make sure a parent line carries an id that no other task shares.
///
/// Returns the (possibly unchanged) line and its id. `ids_in_file` is every
/// id in the document, this line's own included.
pub fn upsert_unique_id(
    parent_line: &str,
    ids_in_file: &[String],
    generate: &mut impl FnMut() -> String,
) -> (String, String) {
    match extract_id(parent_line) {
        Some(id) if !is_duplicate(ids_in_file, &id) => (parent_line.to_string(), id),
        _ => {
            let id = generate_unique_id(ids_in_file, generate);
            (set_id(parent_line, &id), id)
        }
    }
}
