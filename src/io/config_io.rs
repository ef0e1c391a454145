use std::fs;
use std::path::Path;

use log::warn;
use toml_edit::{DocumentMut, Item, Table, Value};

use crate::io::log_io::{CONFIG_FILE, LogError, atomic_write};
use crate::model::config::Config;

/// Read chute.toml as an editable document. A missing file reads as empty.
pub fn read_config_doc(root: &Path) -> Result<DocumentMut, LogError> {
    let path = root.join(CONFIG_FILE);
    let text = if path.is_file() {
        fs::read_to_string(&path).map_err(|e| LogError::ReadError {
            path: path.clone(),
            source: e,
        })?
    } else {
        String::new()
    };
    Ok(text.parse::<DocumentMut>()?)
}

/// Write the document back, preserving comments and layout.
pub fn write_config_doc(root: &Path, doc: &DocumentMut) -> Result<(), LogError> {
    let path = root.join(CONFIG_FILE);
    atomic_write(&path, doc.to_string().as_bytes()).map_err(|e| LogError::WriteError {
        path: path.clone(),
        source: e,
    })
}

fn split_key(key: &str) -> Result<Vec<&str>, LogError> {
    let parts: Vec<&str> = key.split('.').map(str::trim).collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(LogError::UnknownKey(key.to_string()));
    }
    Ok(parts)
}

/// Look up a dotted key such as `cockpit.must_limit`.
///
/// Keys not written in the file fall back to the effective default.
pub fn get_value(doc: &DocumentMut, key: &str) -> Result<String, LogError> {
    let parts = split_key(key)?;
    let mut item: Option<&Item> = Some(doc.as_item());
    for part in &parts {
        item = item.and_then(|i| i.get(*part));
    }
    if let Some(value) = item.and_then(Item::as_value) {
        return Ok(display_value(value));
    }

    let config: Config = toml::from_str(&doc.to_string())?;
    let defaults = toml::Value::try_from(&config).map_err(|e| LogError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    let mut current = Some(&defaults);
    for part in &parts {
        current = current.and_then(|v| v.get(*part));
    }
    match current {
        Some(toml::Value::String(s)) => Ok(s.clone()),
        Some(v) if !v.is_table() => Ok(v.to_string()),
        _ => Err(LogError::UnknownKey(key.to_string())),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.value().clone(),
        other => {
            let mut bare = other.clone();
            bare.decor_mut().clear();
            bare.to_string()
        }
    }
}

/// Set a dotted key, creating tables on the way. Integers and booleans are
/// written as such, anything else as a string. The result must still load
/// as a valid config; on error `doc` is left as it was.
pub fn set_value(doc: &mut DocumentMut, key: &str, raw: &str) -> Result<(), LogError> {
    let parts = split_key(key)?;
    let (last, tables) = parts
        .split_last()
        .ok_or_else(|| LogError::UnknownKey(key.to_string()))?;

    let mut candidate = doc.clone();
    let mut table: &mut Table = candidate.as_table_mut();
    for part in tables {
        if !table.contains_key(part) {
            let mut fresh = Table::new();
            fresh.set_implicit(false);
            table.insert(part, Item::Table(fresh));
        }
        table = table
            .get_mut(part)
            .and_then(Item::as_table_mut)
            .ok_or_else(|| LogError::InvalidValue {
                key: key.to_string(),
                reason: format!("{} is not a table", part),
            })?;
    }
    table.insert(last, toml_edit::value(parse_scalar(raw)));

    if let Err(e) = toml::from_str::<Config>(&candidate.to_string()) {
        warn!("rejected config value {} = {}", key, raw);
        return Err(LogError::InvalidValue {
            key: key.to_string(),
            reason: e.message().to_string(),
        });
    }
    *doc = candidate;
    Ok(())
}

fn parse_scalar(raw: &str) -> Value {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    match raw {
        "true" => Value::from(true),
        "false" => Value::from(false),
        _ => Value::from(raw),
    }
}
