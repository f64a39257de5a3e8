//! Combat resolution - safe zone, exposure damage, bot drift and attrition

use rand::Rng;
use serde::Serialize;

use super::physics::PhysicsSystem;

/// Shrinking circular safe zone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafeZone {
    pub center_x: f32,
    pub center_y: f32,
    /// Current radius, never below `min_radius`
    pub radius: f32,
    /// Radius at match start
    pub initial_radius: f32,
    pub min_radius: f32,
}

impl SafeZone {
    pub fn new(center_x: f32, center_y: f32, initial_radius: f32, min_radius: f32) -> Self {
        Self {
            center_x,
            center_y,
            radius: initial_radius,
            initial_radius,
            min_radius,
        }
    }

    /// Restore the radius for a new match
    pub fn reset(&mut self) {
        self.radius = self.initial_radius;
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        PhysicsSystem::is_in_zone(x, y, self.center_x, self.center_y, self.radius)
    }

    /// How far the radius has closed in since match start
    pub fn closed_in(&self) -> f32 {
        self.initial_radius - self.radius
    }
}

/// Stateless per-tick combat rules
pub struct CombatSystem;

impl CombatSystem {
    /// Shrink the zone by `step`, floored at its minimum radius.
    ///
    /// Returns true when the floored radius crossed a multiple of
    /// `alert_interval` on the way down.
    pub fn shrink_zone(zone: &mut SafeZone, step: f32, alert_interval: f32) -> bool {
        let previous = zone.radius;
        zone.radius = (zone.radius - step).max(zone.min_radius);

        let prev_floor = previous.floor() as i64;
        let next_floor = zone.radius.floor() as i64;
        let interval = alert_interval.floor() as i64;

        interval > 0 && next_floor != prev_floor && next_floor.rem_euclid(interval) == 0
    }

    /// Damage dealt this tick to an entity at (x, y); zero inside the zone
    pub fn exposure_damage(zone: &SafeZone, x: f32, y: f32, damage_per_tick: f32) -> f32 {
        if zone.contains(x, y) {
            0.0
        } else {
            damage_per_tick
        }
    }

    /// Apply damage to health, returns (new_health, is_dead)
    pub fn apply_damage(current_health: f32, damage: f32) -> (f32, bool) {
        let new_health = (current_health - damage).max(0.0);
        (new_health, new_health <= 0.0)
    }

    /// Heal up to `max_health`
    pub fn heal(current_health: f32, amount: f32, max_health: f32) -> f32 {
        (current_health + amount).clamp(0.0, max_health)
    }

    /// Drift a bot towards the zone center
    pub fn bot_step(
        zone: &SafeZone,
        x: f32,
        y: f32,
        step: f32,
        settle_distance: f32,
    ) -> (f32, f32) {
        PhysicsSystem::step_toward(x, y, zone.center_x, zone.center_y, step, settle_distance)
    }

    /// Per-tick chance that a bot is knocked out regardless of position.
    /// Grows as the zone closes in.
    pub fn attrition_chance(zone: &SafeZone, base: f64, shrink_divisor: f64) -> f64 {
        if shrink_divisor <= 0.0 {
            return base.clamp(0.0, 1.0);
        }
        (base + f64::from(zone.closed_in()) / shrink_divisor).clamp(0.0, 1.0)
    }

    pub fn roll_attrition<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
        chance > 0.0 && rng.gen_bool(chance)
    }
}
