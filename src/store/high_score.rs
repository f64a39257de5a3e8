//! Personal best record
//!
//! A single `{wpm, accuracy}` record kept under a fixed key. Read once at
//! startup, written only when a match ends with a strictly higher speed.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[cfg(test)]
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Storage key for the best-score record
pub const HIGH_SCORE_KEY: &str = "codebattle_high_score";

/// Best score shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighScore {
    pub wpm: u32,
    pub accuracy: u32,
}

impl HighScore {
    /// Whether `wpm` strictly beats this record
    pub fn beaten_by(&self, wpm: u32) -> bool {
        wpm > self.wpm
    }
}

/// Key-value persistence for the best score
pub trait ScoreStore: Send + Sync {
    fn load(&self) -> Result<Option<HighScore>, StoreError>;
    fn save(&self, record: &HighScore) -> Result<(), StoreError>;
}

/// JSON file named after the storage key inside a directory
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{HIGH_SCORE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoreStore for FileScoreStore {
    fn load(&self) -> Result<Option<HighScore>, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored high score");
                return Ok(None);
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let record = serde_json::from_str(&json)?;
        Ok(Some(record))
    }

    fn save(&self, record: &HighScore) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write then rename so a crash never leaves a torn record
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(record)?)?;
        fs::rename(&tmp, &self.path)?;

        info!(wpm = record.wpm, accuracy = record.accuracy, "High score saved");
        Ok(())
    }
}

/// In-process store for tests
#[cfg(test)]
#[derive(Default)]
pub struct MemoryScoreStore {
    record: Mutex<Option<HighScore>>,
}

#[cfg(test)]
impl MemoryScoreStore {
    pub fn new(record: Option<HighScore>) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }
}

#[cfg(test)]
impl ScoreStore for MemoryScoreStore {
    fn load(&self) -> Result<Option<HighScore>, StoreError> {
        Ok(*self.record.lock())
    }

    fn save(&self, record: &HighScore) -> Result<(), StoreError> {
        *self.record.lock() = Some(*record);
        Ok(())
    }
}

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Score file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed score record: {0}")]
    Format(#[from] serde_json::Error),
}
