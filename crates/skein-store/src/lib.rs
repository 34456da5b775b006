pub mod config;
pub mod overlay;
pub mod records;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub use config::Config;

/// Handle to one storage root. All reads and writes go through this.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the default per-user store: `$SKEIN_HOME`, else
    /// `data_dir/skein`, else `~/.skein`.
    pub fn open_default() -> Self {
        Self::new(default_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    pub fn overlay_path(&self) -> PathBuf {
        self.root.join("resolutions.json")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn config(&self) -> Config {
        Config::load(&self.config_path())
    }
}

fn default_root() -> PathBuf {
    if let Ok(home) = std::env::var("SKEIN_HOME") {
        if !home.is_empty() {
            return PathBuf::from(home);
        }
    }
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("skein")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".skein")
    } else {
        PathBuf::from(".skein-store")
    }
}

/// Atomic write: temp file in the same dir, then rename. A crash mid-write
/// leaves the previous file contents intact.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("no parent dir for {}", path.display()))?;
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.persist(path)?;
    Ok(())
}
