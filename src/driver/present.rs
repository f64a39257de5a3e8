//! Frame presentation

use tracing::info;

use crate::game::{MatchState, WorldSnapshot};

/// Receives a read-only snapshot once per frame
pub trait Presenter: Send {
    fn present(&mut self, snapshot: &WorldSnapshot);
}

/// Headless presenter: HUD line plus any new terminal output, via tracing
#[derive(Debug, Default)]
pub struct LogPresenter {
    last_state: Option<MatchState>,
    last_snippet: Option<String>,
}

impl Presenter for LogPresenter {
    fn present(&mut self, snapshot: &WorldSnapshot) {
        info!(target: "hud", "{}", snapshot.status_line());

        let file_name = snapshot.snippet.as_ref().map(|s| s.file_name.clone());
        if file_name != self.last_snippet {
            if let Some(snippet) = &snapshot.snippet {
                info!(
                    target: "hud",
                    repo = %snippet.repo,
                    file = %snippet.file_name,
                    language = %snippet.language,
                    "New target:\n{}",
                    snippet.code
                );
            }
            self.last_snippet = file_name;
        }

        if self.last_state != Some(snapshot.state) {
            if let (MatchState::GameOver, Some(stats)) = (snapshot.state, &snapshot.stats) {
                info!(
                    target: "hud",
                    rank = stats.rank,
                    total = stats.total_players,
                    wpm = stats.wpm,
                    accuracy = stats.accuracy,
                    survived_secs = stats.time_survived_secs,
                    "GAME OVER. Type :restart to play again"
                );
            }
            self.last_state = Some(snapshot.state);
        }
    }
}
