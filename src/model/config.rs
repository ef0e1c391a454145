use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from chute.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub cockpit: CockpitConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Folder (relative to the vault root) holding `YYYY-MM-DD.md` logs
    #[serde(default = "default_folder")]
    pub folder: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            folder: default_folder(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CockpitConfig {
    /// How many must tasks a dashboard shows
    #[serde(default = "default_must_limit")]
    pub must_limit: usize,
    /// Ribbon segments wider than this are drawn at this width
    #[serde(default = "default_ribbon_cap")]
    pub ribbon_cap_minutes: u32,
    /// Rows in the task list panel
    #[serde(default = "default_task_list_limit")]
    pub task_list_limit: usize,
}

impl Default for CockpitConfig {
    fn default() -> Self {
        CockpitConfig {
            must_limit: default_must_limit(),
            ribbon_cap_minutes: default_ribbon_cap(),
            task_list_limit: default_task_list_limit(),
        }
    }
}

/// Default: see src/cli/handlers/init.rs template
fn default_folder() -> String {
    "taskchute".to_string()
}

fn default_must_limit() -> usize {
    3
}

fn default_ribbon_cap() -> u32 {
    240
}

fn default_task_list_limit() -> usize {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    /// Hex overrides for theme slots, e.g. `highlight = "#FB4196"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
    /// Start the cockpit with Focus Mode on
    #[serde(default)]
    pub focus_mode: bool,
}
