//! Read-only world snapshots handed to the presenter

use serde::Serialize;
use uuid::Uuid;

use crate::store::HighScore;

use super::combat::SafeZone;
use super::guard::Guard;
use super::physics::PhysicsSystem;
use super::r#match::{GameStats, LogLine, MatchController, MatchState, PlayerState};

/// Snippet as shown on screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnippetView {
    pub code: String,
    pub language: String,
    pub repo: String,
    pub file_name: String,
    /// What the player has typed so far
    pub typed: String,
    pub correct: usize,
    pub errors: usize,
    pub total: usize,
}

/// Everything a frame needs to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub generation: u64,
    pub tick: u64,
    pub state: MatchState,
    pub local_id: Uuid,
    pub zone: SafeZone,
    pub players: Vec<PlayerState>,
    pub guards: Vec<Guard>,
    pub alive_count: usize,
    pub total_players: usize,
    pub local_health: f32,
    pub wpm: u32,
    pub accuracy: u32,
    pub snippets_completed: u32,
    pub snippet: Option<SnippetView>,
    /// Input currently evaluated (false while loading or stunned)
    pub accepting_input: bool,
    pub stunned: bool,
    /// Local player's distance past the zone edge; negative while inside
    pub zone_margin: f32,
    /// Distance from the local player to the closest guard
    pub nearest_guard: Option<f32>,
    pub logs: Vec<LogLine>,
    pub spectator_chat: Vec<String>,
    pub stats: Option<GameStats>,
    pub best: Option<HighScore>,
}

impl WorldSnapshot {
    pub fn capture(controller: &MatchController) -> Self {
        let progress = controller.typing_progress().unwrap_or_default();
        let snippet = controller.snippet().map(|s| SnippetView {
            code: s.code.clone(),
            language: s.language.clone(),
            repo: s.repo.clone(),
            file_name: s.file_name.clone(),
            typed: controller.typed_input(),
            correct: progress.correct,
            errors: progress.errors,
            total: progress.total,
        });

        let zone = controller.zone();
        let local = controller.local_player();
        let zone_margin = local
            .map(|p| {
                PhysicsSystem::zone_distance(p.x, p.y, zone.center_x, zone.center_y, zone.radius)
            })
            .unwrap_or(0.0);
        let nearest_guard = local.and_then(|p| {
            controller
                .guards()
                .iter()
                .map(|g| g.distance_to(p.x, p.y))
                .min_by(|a, b| a.total_cmp(b))
        });

        Self {
            generation: controller.generation(),
            tick: controller.tick_count(),
            state: controller.state(),
            local_id: controller.local_id(),
            zone: controller.zone().clone(),
            players: controller.players().to_vec(),
            guards: controller.guards().to_vec(),
            alive_count: controller.alive_count(),
            total_players: controller.players().len(),
            local_health: local.map(|p| p.health).unwrap_or(0.0),
            wpm: controller.wpm(),
            accuracy: controller.accuracy(),
            snippets_completed: controller.snippets_completed(),
            snippet,
            accepting_input: controller.accepts_input(),
            stunned: controller.is_stunned(),
            zone_margin,
            nearest_guard,
            logs: controller.logs().cloned().collect(),
            spectator_chat: controller.spectator_chat().cloned().collect(),
            stats: controller.stats().cloned(),
            best: controller.best(),
        }
    }

    /// One-line HUD
    pub fn status_line(&self) -> String {
        let mut line = format!(
            "[{:?}] tick={} alive={}/{} hp={:.0} wpm={} acc={}% zone={:.1}",
            self.state,
            self.tick,
            self.alive_count,
            self.total_players,
            self.local_health,
            self.wpm,
            self.accuracy,
            self.zone.radius,
        );
        if let Some(snippet) = &self.snippet {
            line.push_str(&format!(" typed={}/{}", snippet.correct, snippet.total));
        }
        if self.zone_margin > 0.0 {
            line.push_str(" OUTSIDE ZONE");
        }
        if self.stunned {
            line.push_str(" STUNNED");
        }
        if let Some(distance) = self.nearest_guard {
            line.push_str(&format!(" guard={:.0}", distance));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::r#match::MatchRules;
    use crate::snippets::CodeSnippet;

    #[test]
    fn capture_reflects_controller() {
        let mut controller = MatchController::new(MatchRules::default(), 7, None);
        let snapshot = WorldSnapshot::capture(&controller);
        assert_eq!(snapshot.state, MatchState::Lobby);
        assert_eq!(snapshot.alive_count, 50);
        assert_eq!(snapshot.local_health, 100.0);
        assert!(snapshot.snippet.is_none());
        assert!(!snapshot.accepting_input);
        let local = snapshot.players.iter().find(|p| p.id == snapshot.local_id).unwrap();
        assert!(!local.is_bot);

        let request = controller.take_snippet_request().unwrap();
        controller.deliver_snippet(
            request.generation,
            CodeSnippet {
                code: "fn main() {}".to_string(),
                language: "rust".to_string(),
                repo: "a/b".to_string(),
                file_name: "main.rs".to_string(),
                origin: "o".to_string(),
            },
        );
        let snapshot = WorldSnapshot::capture(&controller);
        assert!(snapshot.accepting_input);
        assert!(!snapshot.stunned);
        assert!(snapshot.zone_margin < 0.0);
        assert_eq!(snapshot.nearest_guard, None);
        let view = snapshot.snippet.unwrap();
        assert_eq!(view.file_name, "main.rs");
        assert_eq!(view.total, 12);
    }

    #[test]
    fn strike_shows_stun_and_guard() {
        let mut controller = MatchController::new(MatchRules::default(), 7, None);
        let request = controller.take_snippet_request().unwrap();
        controller.deliver_snippet(
            request.generation,
            CodeSnippet {
                code: "abcdef".to_string(),
                language: "rust".to_string(),
                repo: "a/b".to_string(),
                file_name: "lib.rs".to_string(),
                origin: "o".to_string(),
            },
        );
        let now = std::time::Instant::now();
        for c in "xyz".chars() {
            controller.handle_key(crate::game::Key::Char(c), now);
        }

        let snapshot = WorldSnapshot::capture(&controller);
        assert!(snapshot.stunned);
        assert!(!snapshot.accepting_input);
        assert!(snapshot.nearest_guard.unwrap() > 12.0);
        assert_eq!(snapshot.snippet.as_ref().unwrap().errors, 3);
        assert!(snapshot.status_line().contains("STUNNED"));
    }

    #[test]
    fn snapshot_serializes() {
        let controller = MatchController::new(MatchRules::default(), 7, None);
        let json = serde_json::to_value(WorldSnapshot::capture(&controller)).unwrap();
        assert_eq!(json["state"], "lobby");
        assert_eq!(json["players"].as_array().unwrap().len(), 50);
    }
}
