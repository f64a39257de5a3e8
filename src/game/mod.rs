//! Game simulation modules

pub mod combat;
pub mod events;
pub mod guard;
pub mod r#match;
pub mod physics;
pub mod snapshot;
pub mod typing;

pub use events::{AudioCue, GameEvent};
pub use r#match::{MatchController, MatchRules, MatchState};
pub use snapshot::WorldSnapshot;
pub use typing::Key;
