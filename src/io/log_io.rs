use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use log::debug;
use tempfile::NamedTempFile;

use crate::io::lock::LockError;
use crate::model::config::Config;
use crate::model::document::LogDocument;

/// Name of the vault config file that marks a vault root
pub const CONFIG_FILE: &str = "chute.toml";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error type for log and config I/O
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse chute.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit chute.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("unknown config key: {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("invalid date: {0} (expected YYYY-MM-DD)")]
    BadDate(String),
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// A directory holding `chute.toml` and the daily log folder.
#[derive(Debug, Clone)]
pub struct Vault {
    pub root: PathBuf,
    pub config: Config,
}

/// Walk up from `start` looking for `chute.toml`. Falls back to `start`
/// itself so `tc` works in a bare directory with default settings.
pub fn discover_vault(start: &Path) -> PathBuf {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).is_file() {
            return current;
        }
        if !current.pop() {
            return start.to_path_buf();
        }
    }
}

/// Read the vault's config; a missing `chute.toml` means defaults.
pub fn load_vault(root: &Path) -> Result<Vault, LogError> {
    let config_path = root.join(CONFIG_FILE);
    let config = if config_path.is_file() {
        let text = fs::read_to_string(&config_path).map_err(|e| LogError::ReadError {
            path: config_path.clone(),
            source: e,
        })?;
        toml::from_str(&text)?
    } else {
        debug!("no {} under {}, using defaults", CONFIG_FILE, root.display());
        Config::default()
    };
    Ok(Vault {
        root: root.to_path_buf(),
        config,
    })
}

impl Vault {
    /// Folder holding the daily logs
    pub fn log_dir(&self) -> PathBuf {
        self.root.join(&self.config.log.folder)
    }

    /// `<vault>/<folder>/YYYY-MM-DD.md`
    pub fn log_path(&self, date: NaiveDate) -> PathBuf {
        self.log_dir()
            .join(format!("{}.md", date.format(DATE_FORMAT)))
    }
}

/// The date a daily log file is named after.
pub fn date_of_path(path: &Path) -> Option<NaiveDate> {
    if path.extension().and_then(|e| e.to_str()) != Some("md") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}

/// `YYYY-MM-DD` as typed on the command line.
pub fn parse_date(s: &str) -> Result<NaiveDate, LogError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| LogError::BadDate(s.to_string()))
}

pub fn prev_day(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(1)).unwrap_or(date)
}

pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

/// First lines of a freshly created log
pub fn log_header(date: NaiveDate) -> String {
    format!("# TaskChute {}\n\n", date.format(DATE_FORMAT))
}

/// Make sure the log for `date` exists, creating folder and header as needed.
pub fn ensure_daily_log(vault: &Vault, date: NaiveDate) -> Result<PathBuf, LogError> {
    let dir = vault.log_dir();
    if !dir.is_dir() {
        fs::create_dir_all(&dir).map_err(|e| LogError::WriteError {
            path: dir.clone(),
            source: e,
        })?;
    }
    let path = vault.log_path(date);
    if !path.exists() {
        atomic_write(&path, log_header(date).as_bytes()).map_err(|e| LogError::WriteError {
            path: path.clone(),
            source: e,
        })?;
        debug!("created {}", path.display());
    }
    Ok(path)
}

pub fn read_log(path: &Path) -> Result<LogDocument, LogError> {
    let text = fs::read_to_string(path).map_err(|e| LogError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!("read {} ({} bytes)", path.display(), text.len());
    Ok(LogDocument::from_text(&text))
}

pub fn write_log(path: &Path, doc: &LogDocument) -> Result<(), LogError> {
    let text = doc.to_text();
    atomic_write(path, text.as_bytes()).map_err(|e| LogError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!("wrote {} ({} bytes)", path.display(), text.len());
    Ok(())
}

/// Write via a temp file in the same directory, then rename over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
