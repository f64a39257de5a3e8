//! Best-score persistence

pub mod high_score;

pub use high_score::{FileScoreStore, HighScore, ScoreStore};

#[cfg(test)]
pub use high_score::MemoryScoreStore;
