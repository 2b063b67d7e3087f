// src/engine_lib/crossing.rs

use glam::Vec3;

use crate::engine_lib::portal::{EndpointId, PortalTable};
use crate::engine_lib::surface::OrientedSurface;

/// Default agent collision radius, in world units.
pub const DEFAULT_COLLISION_RADIUS: f32 = 0.5;

/// True when the segment `prev_pos -> new_pos` pierces `surface` this step.
///
/// One-sided: only movement against the normal (entering the front face) is detected.
/// The hit rectangle is the surface inflated by `collision_radius` on every side.
pub fn is_crossing(surface: &OrientedSurface, prev_pos: Vec3, new_pos: Vec3, collision_radius: f32) -> bool {
    let movement = new_pos - prev_pos;
    let dot_normal_movement = surface.normal().dot(movement);
    if dot_normal_movement >= 0.0 {
        return false;
    }

    let t = -surface.signed_distance(prev_pos) / dot_normal_movement;
    if !(0.0..=1.0).contains(&t) {
        return false;
    }

    let local = surface.to_local(prev_pos + t * movement);
    let half = surface.half_extents();
    local.x.abs() <= half.x + collision_radius && local.y.abs() <= half.y + collision_radius
}

/// First endpoint, in ascending id order, whose surface the step crosses.
pub fn first_crossing(
    portals: &PortalTable,
    prev_pos: Vec3,
    new_pos: Vec3,
    collision_radius: f32,
) -> Option<EndpointId> {
    portals
        .iter()
        .find(|(_, endpoint)| is_crossing(endpoint.surface(), prev_pos, new_pos, collision_radius))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{first_crossing, is_crossing};
    use crate::engine_lib::portal::{EndpointId, PortalDefinition, PortalTable};
    use crate::engine_lib::surface::OrientedSurface;

    fn unit_surface() -> OrientedSurface {
        OrientedSurface::new(Vec3::ZERO, Vec3::X, Vec3::Y, 2.0, 2.0).unwrap()
    }

    #[test]
    fn detects_entry_through_front_face() {
        let s = unit_surface();
        assert!(is_crossing(&s, Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 0.5));
    }

    #[test]
    fn ignores_exit_through_back_face() {
        let s = unit_surface();
        assert!(!is_crossing(&s, Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 0.5));
    }

    #[test]
    fn ignores_hits_outside_the_rectangle() {
        let s = unit_surface();
        assert!(!is_crossing(&s, Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, 5.0, 0.0), 0.5));
    }

    #[test]
    fn radius_inflates_rectangle_not_circle() {
        let s = unit_surface();
        // hit lands ~0.57 from the rectangle's corner, so only a square inflation accepts it
        let corner = Vec3::new(0.0, 1.4, 1.4);
        let prev = corner + Vec3::X;
        let next = corner - Vec3::X;
        assert!(is_crossing(&s, prev, next, 0.5));
        assert!(!is_crossing(&s, prev, next, 0.3));
    }

    #[test]
    fn ignores_parallel_and_short_moves() {
        let s = unit_surface();
        assert!(!is_crossing(&s, Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0), 0.5));
        // plane is not reached this step
        assert!(!is_crossing(&s, Vec3::new(2.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), 0.5));
        // plane was already behind at the start
        assert!(!is_crossing(&s, Vec3::new(-0.5, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0), 0.5));
    }

    #[test]
    fn endpoint_on_plane_counts() {
        let s = unit_surface();
        assert!(is_crossing(&s, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO, 0.0));
    }

    #[test]
    fn first_crossing_uses_table_order() {
        let mut table = PortalTable::new();
        let near = table
            .insert(&PortalDefinition::new(Vec3::new(-0.5, 0.0, 0.0), Vec3::X, Vec3::Y, 2.0, 2.0))
            .unwrap();
        let far = table
            .insert(&PortalDefinition::new(Vec3::new(0.5, 0.0, 0.0), Vec3::X, Vec3::Y, 2.0, 2.0))
            .unwrap();

        let prev = Vec3::new(1.0, 0.0, 0.0);
        let next = Vec3::new(-1.0, 0.0, 0.0);
        assert_eq!(first_crossing(&table, prev, next, 0.5), Some(near));
        assert_ne!(near, far);

        table.remove(near);
        assert_eq!(first_crossing(&table, prev, next, 0.5), Some(EndpointId(1)));
        assert_eq!(first_crossing(&table, next, prev, 0.5), None);
    }
}
