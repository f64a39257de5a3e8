//! Game events emitted by the match controller
//! Consumed by the audio, persistence and presentation collaborators

use serde::Serialize;
use uuid::Uuid;

use crate::store::HighScore;

use super::r#match::GameStats;

/// Why an entity was eliminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationCause {
    /// Health drained outside the safe zone
    Zone,
    /// Random attrition of a bot
    Attrition,
    /// Typing strike penalty
    Strike,
    /// Caught by a guard
    Guard,
}

/// Discrete audio triggers; fire-and-forget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    Type,
    Error,
    Alert,
    Elimination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// First accepted keystroke moved the match out of the lobby
    MatchStarted,

    /// Accepted keystroke that grew the buffer without a new error
    KeyTyped,

    /// Accepted keystroke that raised the error count
    TypingError { errors: usize },

    /// Error threshold reached; a guard was dispatched
    Strike { guard_id: Uuid, damage: f32 },

    /// Snippet typed out correctly
    SnippetCompleted { heal: f32 },

    /// Safe zone crossed an alert boundary
    ZoneAlert { radius: f32 },

    /// Entity took exposure damage this tick
    ZoneDamage { player_id: Uuid, damage: f32 },

    /// Guard reached its target
    GuardCapture {
        guard_id: Uuid,
        target_id: Uuid,
        damage: f32,
    },

    /// Entity died; position is where it died
    Eliminated {
        player_id: Uuid,
        is_bot: bool,
        x: f32,
        y: f32,
        cause: EliminationCause,
    },

    /// Local player died
    GameOver { stats: GameStats },

    /// Stored best score should be replaced
    NewHighScore { record: HighScore },
}

impl GameEvent {
    /// Sound to play for this event, if any
    pub fn audio_cue(&self) -> Option<AudioCue> {
        match self {
            GameEvent::KeyTyped => Some(AudioCue::Type),
            GameEvent::TypingError { .. } => Some(AudioCue::Error),
            GameEvent::Strike { .. } | GameEvent::ZoneAlert { .. } => Some(AudioCue::Alert),
            GameEvent::GuardCapture { .. } | GameEvent::Eliminated { .. } => {
                Some(AudioCue::Elimination)
            }
            GameEvent::MatchStarted
            | GameEvent::SnippetCompleted { .. }
            | GameEvent::ZoneDamage { .. }
            | GameEvent::GameOver { .. }
            | GameEvent::NewHighScore { .. } => None,
        }
    }
}
