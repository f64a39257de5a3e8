//! Guard pursuit AI

use serde::Serialize;
use uuid::Uuid;

use super::physics::{distance, PhysicsSystem};

/// Pursuit entity summoned by a typing strike
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Guard {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    /// Looked up by id every tick; the guard does not own its target
    pub target_id: Uuid,
    pub speed: f32,
}

/// Result of advancing a guard one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardStep {
    /// Still chasing
    Pursuing,
    /// Reached the target; the guard must be removed after dealing damage
    Captured,
}

impl Guard {
    pub fn new(id: Uuid, x: f32, y: f32, target_id: Uuid, speed: f32) -> Self {
        Self {
            id,
            x,
            y,
            target_id,
            speed,
        }
    }

    /// Step towards the target's current position, then test for capture
    pub fn advance(&mut self, target_x: f32, target_y: f32, capture_radius: f32) -> GuardStep {
        let (x, y) =
            PhysicsSystem::step_toward(self.x, self.y, target_x, target_y, self.speed, 0.0);
        self.x = x;
        self.y = y;

        if PhysicsSystem::within(self.x, self.y, target_x, target_y, capture_radius) {
            GuardStep::Captured
        } else {
            GuardStep::Pursuing
        }
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        distance(self.x, self.y, x, y)
    }
}
