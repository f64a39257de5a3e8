//! Application state shared by the session

use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use crate::config::Config;
use crate::game::{MatchController, MatchRules};
use crate::snippets::{GithubSource, SnippetSupplier};
use crate::store::{FileScoreStore, HighScore, ScoreStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub supplier: Arc<SnippetSupplier>,
    pub store: Arc<dyn ScoreStore>,
    /// Seed for the match RNG; derived seeds feed the snippet sources
    pub seed: u64,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = FileScoreStore::new(&config.score_dir);
        info!(path = %store.path().display(), "High score file");
        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: Config, store: Arc<dyn ScoreStore>) -> Self {
        let config = Arc::new(config);
        let seed = config.match_seed.unwrap_or_else(|| rand::thread_rng().gen());

        // Snippet supply: GitHub when enabled, bundled pool always
        let supplier = if config.remote_snippets {
            let github = GithubSource::new(
                config.github_api_url.clone(),
                config.github_token.clone(),
                seed.wrapping_add(1),
            );
            SnippetSupplier::new(
                Arc::new(github),
                config.snippet_fetch_per_minute,
                seed.wrapping_add(2),
            )
        } else {
            info!("Remote snippets disabled, using bundled pool");
            SnippetSupplier::offline(seed.wrapping_add(2))
        };

        Self {
            config,
            supplier: Arc::new(supplier),
            store,
            seed,
        }
    }

    /// Best score on record; unreadable storage counts as none
    pub fn load_high_score(&self) -> Option<HighScore> {
        match self.store.load() {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "Failed to load high score");
                None
            }
        }
    }

    /// Fresh controller in the lobby
    pub fn new_controller(&self) -> MatchController {
        MatchController::new(MatchRules::default(), self.seed, self.load_high_score())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::MatchState;
    use crate::store::MemoryScoreStore;

    fn offline_config() -> Config {
        Config::from_lookup(|name| match name {
            "REMOTE_SNIPPETS" => Some("false".to_string()),
            "MATCH_SEED" => Some("77".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn controller_starts_with_stored_best() {
        let best = HighScore { wpm: 55, accuracy: 91 };
        let store = Arc::new(MemoryScoreStore::new(Some(best)));
        let state = AppState::with_store(offline_config(), store);
        assert_eq!(state.seed, 77);

        let controller = state.new_controller();
        assert_eq!(controller.state(), MatchState::Lobby);
        assert_eq!(controller.best(), Some(best));
    }

    #[test]
    fn file_backed_state_reads_score_dir() {
        let dir = tempfile::tempdir().unwrap();
        let best = HighScore { wpm: 64, accuracy: 88 };
        FileScoreStore::new(dir.path()).save(&best).unwrap();

        let score_dir = dir.path().display().to_string();
        let config = Config::from_lookup(|name| match name {
            "REMOTE_SNIPPETS" => Some("false".to_string()),
            "TICK_RATE_MS" => Some("40".to_string()),
            "SCORE_DIR" => Some(score_dir.clone()),
            _ => None,
        })
        .unwrap();

        let state = AppState::new(config);
        assert_eq!(state.config.tick_rate, std::time::Duration::from_millis(40));
        assert_eq!(state.new_controller().best(), Some(best));
    }

    #[test]
    fn offline_supplier_serves_bundled_snippets() {
        let state = AppState::with_store(offline_config(), Arc::new(MemoryScoreStore::default()));
        let snippet = tokio_test::block_on(state.supplier.fetch_next(&[]));
        assert!(snippet.origin.starts_with("fallback-"));
    }
}
