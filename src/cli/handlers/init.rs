use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::commands::InitArgs;
use crate::io::log_io::{CONFIG_FILE, atomic_write};

const CHUTE_TOML_TEMPLATE: &str = r##"# chute vault settings

[log]
# Folder holding one YYYY-MM-DD.md log per day, relative to this file
folder = "{folder}"

[cockpit]
# How many #must tasks the cockpit lists
must_limit = 3
# Ribbon segments longer than this (minutes) are drawn at this width
ribbon_cap_minutes = 240
# Rows in the task list panel
task_list_limit = 30

[ui]
# Start the cockpit with only ⌛ entries visible under each task
focus_mode = false

# --- Colors ---
# Uncomment and edit to override theme colors.
#
# [ui.colors]
# background = "#0C001B"
# text = "#A09BFE"
# text_bright = "#FFFFFF"
# highlight = "#FB4196"
# dim = "#5A5580"
# red = "#FF4444"
# yellow = "#FFD700"
# green = "#44FF88"
# cyan = "#44DDFF"
"##;

const DEFAULT_FOLDER: &str = "taskchute";

/// Log folder names are relative paths without `..` or quotes.
fn validate_folder(folder: &str) -> Result<(), String> {
    let path = Path::new(folder);
    if folder.trim().is_empty() {
        return Err("log folder must not be empty".to_string());
    }
    if path.is_absolute() {
        return Err(format!("log folder must be relative to the vault: {}", folder));
    }
    if path.components().any(|c| matches!(c, std::path::Component::ParentDir)) {
        return Err(format!("log folder must stay inside the vault: {}", folder));
    }
    if folder.contains('"') || folder.contains('\\') {
        return Err(format!("invalid character in log folder: {}", folder));
    }
    Ok(())
}

fn render_chute_toml(folder: &str) -> String {
    CHUTE_TOML_TEMPLATE.replace("{folder}", folder)
}

/// Write chute.toml into `root` and create the log folder.
/// Returns the path of the config file.
pub fn init_vault(root: &Path, folder: Option<&str>, force: bool) -> Result<PathBuf, String> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        ));
    }

    let folder = folder.unwrap_or(DEFAULT_FOLDER).trim_end_matches('/');
    validate_folder(folder)?;

    fs::create_dir_all(root.join(folder))
        .map_err(|e| format!("could not create {}: {}", root.join(folder).display(), e))?;
    atomic_write(&config_path, render_chute_toml(folder).as_bytes())
        .map_err(|e| format!("could not write {}: {}", config_path.display(), e))?;
    Ok(config_path)
}

pub fn cmd_init(args: InitArgs, vault_dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match vault_dir {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    let path = init_vault(&root, args.folder.as_deref(), args.force)?;
    println!("Initialized chute vault: {}", path.display());
    Ok(())
}
