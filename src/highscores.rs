//! Persist the best score (XDG config or ~/.config/tetris-2048).

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

const APP_DIR: &str = "tetris-2048";
const FILENAME: &str = "best_score";

/// Where the best score lives between runs.
pub trait BestScoreStore {
    /// Stored best, or 0 when nothing usable is stored.
    fn read(&self) -> u32;
    fn write(&mut self, score: u32) -> Result<()>;
}

/// Resolve the store path from `XDG_CONFIG_HOME` and `HOME` values.
fn config_path_from(xdg: Option<&str>, home: Option<&str>) -> PathBuf {
    let base = match xdg {
        Some(x) if !x.is_empty() => PathBuf::from(x),
        _ => home
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    base.join(APP_DIR).join(FILENAME)
}

/// Default path for the best-score file (config dir / tetris-2048 / best_score).
pub fn default_path() -> PathBuf {
    let xdg = std::env::var("XDG_CONFIG_HOME").ok();
    let home = std::env::var("HOME").ok();
    config_path_from(xdg.as_deref(), home.as_deref())
}

/// One decimal line in a file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the XDG default location.
    pub fn at_default_path() -> Self {
        Self::new(default_path())
    }
}

impl BestScoreStore for FileStore {
    fn read(&self) -> u32 {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.lines().next().and_then(|l| l.trim().parse::<u32>().ok()))
            .unwrap_or(0)
    }

    /// Creates the parent directory if needed.
    fn write(&mut self, score: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut f = fs::File::create(&self.path)
            .with_context(|| format!("writing {}", self.path.display()))?;
        writeln!(f, "{}", score)?;
        Ok(())
    }
}

/// Keeps the best score for this process only (`--no-save`, tests).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    best: u32,
}

impl MemoryStore {
    pub fn new(best: u32) -> Self {
        Self { best }
    }
}

impl BestScoreStore for MemoryStore {
    fn read(&self) -> u32 {
        self.best
    }

    fn write(&mut self, score: u32) -> Result<()> {
        self.best = score;
        Ok(())
    }
}
