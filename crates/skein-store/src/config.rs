use serde::Deserialize;
use std::path::Path;

fn default_model() -> String {
    "claude-haiku-4-5".to_string()
}

fn default_window_days() -> i64 {
    7
}

/// Store-level configuration, read from `config.json` at the store root.
/// Missing file, missing keys, or unparsable content all fall back to
/// defaults — configuration problems never break a run.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Roots under which working directories follow the
    /// `{root}/{project}/{worktree}` layout.
    #[serde(default)]
    pub workspace_roots: Vec<String>,
    /// Model used for synthesis and confirmation calls.
    #[serde(default = "default_model")]
    pub model: String,
    /// Trailing window (days) of accomplished items considered during
    /// resolution matching.
    #[serde(default = "default_window_days")]
    pub window_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_roots: Vec::new(),
            model: default_model(),
            window_days: default_window_days(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("unparsable config at {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }
}
