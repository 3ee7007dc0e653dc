//! Presentation-level settings

use std::path::PathBuf;

/// REPL-related settings
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Show a spinner while waiting for a reply
    pub show_progress: bool,
    /// Path to history file (default: `<data dir>/musing/history.txt`)
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
        }
    }
}

impl ReplConfig {
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("musing").join("history.txt")))
    }
}
