//! Arena geometry: distances, zone containment and pursuit steps

/// Euclidean distance between two arena points
pub fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

/// Geometry helpers shared by the combat resolver and guard AI
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Check if a point is inside the zone (the boundary counts as inside)
    pub fn is_in_zone(
        x: f32,
        y: f32,
        zone_center_x: f32,
        zone_center_y: f32,
        zone_radius: f32,
    ) -> bool {
        let dx = x - zone_center_x;
        let dy = y - zone_center_y;
        let dist_sq = dx * dx + dy * dy;
        dist_sq <= zone_radius * zone_radius
    }

    /// Calculate distance from zone edge (negative = inside, positive = outside)
    pub fn zone_distance(
        x: f32,
        y: f32,
        zone_center_x: f32,
        zone_center_y: f32,
        zone_radius: f32,
    ) -> f32 {
        distance(x, y, zone_center_x, zone_center_y) - zone_radius
    }

    /// Move a point `step` units along the normalized vector towards a target.
    ///
    /// Points closer than `min_distance` stay put. Returns the new position.
    pub fn step_toward(
        x: f32,
        y: f32,
        target_x: f32,
        target_y: f32,
        step: f32,
        min_distance: f32,
    ) -> (f32, f32) {
        let dx = target_x - x;
        let dy = target_y - y;
        let dist = (dx * dx + dy * dy).sqrt();

        if dist <= min_distance || dist < f32::EPSILON {
            return (x, y);
        }

        (x + dx / dist * step, y + dy / dist * step)
    }

    /// Check whether a point lies within `radius` of another
    pub fn within(x1: f32, y1: f32, x2: f32, y2: f32, radius: f32) -> bool {
        distance(x1, y1, x2, y2) < radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        assert!((distance(0.0, 0.0, 3.0, 4.0) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn zone_boundary_counts_as_inside() {
        assert!(PhysicsSystem::is_in_zone(450.0, 300.0, 400.0, 300.0, 50.0));
        assert!(!PhysicsSystem::is_in_zone(451.0, 300.0, 400.0, 300.0, 50.0));
        assert!(PhysicsSystem::zone_distance(451.0, 300.0, 400.0, 300.0, 50.0) > 0.0);
    }

    #[test]
    fn step_toward_moves_unit_direction() {
        let (x, y) = PhysicsSystem::step_toward(0.0, 0.0, 30.0, 40.0, 5.0, 0.0);
        assert!((x - 3.0).abs() < 1e-5);
        assert!((y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn step_toward_settles_inside_min_distance() {
        let (x, y) = PhysicsSystem::step_toward(398.0, 300.0, 400.0, 300.0, 0.8, 4.0);
        assert_eq!((x, y), (398.0, 300.0));
    }

    #[test]
    fn step_toward_same_point_is_noop() {
        assert_eq!(PhysicsSystem::step_toward(1.0, 1.0, 1.0, 1.0, 3.0, 0.0), (1.0, 1.0));
    }
}
