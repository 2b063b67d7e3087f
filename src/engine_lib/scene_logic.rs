// src/engine_lib/scene_logic.rs
use glam::Vec3;
use log::info;

use crate::engine_lib::crossing::first_crossing;
use crate::engine_lib::scene_types::{Scene, StepOutcome};

/// Moves the observer to `potential_new_pos` and honours at most one portal crossing.
///
/// The segment from the current position is tested against every endpoint in id order, using
/// the observer's scaled collision radius. The first hit wins even when it is unlinked, so a
/// second portal on the same segment is never considered.
pub fn update_observer_in_scene(scene: &mut Scene, potential_new_pos: Vec3) -> StepOutcome {
    let prev_pos = scene.observer.position();
    let radius = scene.locomotion.collision_radius(&scene.observer);
    scene.observer.set_position(potential_new_pos);

    let Some(entry) = first_crossing(&scene.portals, prev_pos, potential_new_pos, radius) else {
        return StepOutcome::Moved;
    };
    let Some(link) = scene.portals.link_from(entry) else {
        return StepOutcome::PassedUnlinked(entry);
    };
    let exit = link.exit_id;

    scene.observer = link.transform_pose(&scene.observer);
    info!(
        "Crossed portal {} -> {}: scale effect {:.3}, movement speed now {:.3}",
        entry,
        exit,
        link.exit.scale_effect(),
        scene.locomotion.speed(&scene.observer)
    );
    StepOutcome::Transited { entry, exit }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::update_observer_in_scene;
    use crate::demo_scene::create_demo_portals;
    use crate::engine_lib::portal::{PortalDefinition, PortalTable};
    use crate::engine_lib::pose::ObserverPose;
    use crate::engine_lib::scene_types::{Locomotion, Scene, StepOutcome};

    const EPS: f32 = 1e-4;

    fn scene_with(portals: PortalTable, start: Vec3) -> Scene {
        Scene {
            portals,
            observer: ObserverPose::new(start, 180.0, 0.0),
            locomotion: Locomotion { base_speed: 2.5, base_collision_radius: 0.5 },
            props: Vec::new(),
        }
    }

    #[test]
    fn plain_move_keeps_pose_and_scale() {
        let mut scene = scene_with(PortalTable::new(), Vec3::new(0.0, 1.0, 0.0));
        let outcome = update_observer_in_scene(&mut scene, Vec3::new(0.5, 1.0, 0.0));
        assert_eq!(outcome, StepOutcome::Moved);
        assert_eq!(scene.observer.position(), Vec3::new(0.5, 1.0, 0.0));
        assert_eq!(scene.observer.scale(), 1.0);
    }

    #[test]
    fn crossing_transits_and_rescales() {
        let mut table = PortalTable::new();
        let a = table
            .insert(&PortalDefinition::new(Vec3::new(5.0, 1.5, 0.0), Vec3::X, Vec3::Y, 2.5, 4.0))
            .unwrap();
        let b = table
            .insert(&PortalDefinition::new(Vec3::new(15.0, 1.5, 0.0), Vec3::NEG_X, Vec3::Y, 2.5, 4.0).with_scale(5.0))
            .unwrap();
        table.link(a, b).unwrap();

        let mut scene = scene_with(table, Vec3::new(5.2, 1.5, 0.0));
        let target = Vec3::new(4.9, 1.5, 0.0);
        let expected = scene.portals.transform_pose(a, &moved_to(&scene.observer, target));

        let outcome = update_observer_in_scene(&mut scene, target);
        assert_eq!(outcome, StepOutcome::Transited { entry: a, exit: b });
        assert!((scene.observer.position() - expected.position()).length() < EPS);
        assert!((scene.observer.scale() - 5.0).abs() < EPS);
        assert!((scene.locomotion.speed(&scene.observer) - 12.5).abs() < EPS);
    }

    #[test]
    fn only_first_of_two_struck_portals_applies() {
        let mut table = PortalTable::new();
        let first = table
            .insert(&PortalDefinition::new(Vec3::new(0.5, 0.0, 0.0), Vec3::X, Vec3::Y, 2.0, 2.0))
            .unwrap();
        let second = table
            .insert(&PortalDefinition::new(Vec3::new(-0.5, 0.0, 0.0), Vec3::X, Vec3::Y, 2.0, 2.0))
            .unwrap();
        let first_exit = table
            .insert(&PortalDefinition::new(Vec3::new(0.0, 0.0, 30.0), Vec3::Z, Vec3::Y, 2.0, 2.0).with_scale(2.0))
            .unwrap();
        let second_exit = table
            .insert(&PortalDefinition::new(Vec3::new(0.0, 0.0, -30.0), Vec3::NEG_Z, Vec3::Y, 2.0, 2.0).with_scale(3.0))
            .unwrap();
        table.link(first, first_exit).unwrap();
        table.link(second, second_exit).unwrap();

        let mut scene = scene_with(table, Vec3::new(1.0, 0.0, 0.0));
        let target = Vec3::new(-1.0, 0.0, 0.0);
        let expected = scene.portals.transform_pose(first, &moved_to(&scene.observer, target));

        let outcome = update_observer_in_scene(&mut scene, target);
        assert_eq!(outcome, StepOutcome::Transited { entry: first, exit: first_exit });
        assert_eq!(scene.observer, expected);
        // a second application would have compounded the scale
        assert!((scene.observer.scale() - 2.0).abs() < EPS);
    }

    #[test]
    fn unlinked_hit_keeps_the_move() {
        let mut table = PortalTable::new();
        let lonely = table
            .insert(&PortalDefinition::new(Vec3::ZERO, Vec3::X, Vec3::Y, 2.0, 2.0))
            .unwrap();
        let mut scene = scene_with(table, Vec3::new(0.3, 0.0, 0.0));
        let outcome = update_observer_in_scene(&mut scene, Vec3::new(-0.3, 0.0, 0.0));
        assert_eq!(outcome, StepOutcome::PassedUnlinked(lonely));
        assert_eq!(scene.observer.position(), Vec3::new(-0.3, 0.0, 0.0));
    }

    #[test]
    fn collision_radius_scales_with_observer() {
        let table = || {
            let mut table = PortalTable::new();
            table
                .insert(&PortalDefinition::new(Vec3::ZERO, Vec3::X, Vec3::Y, 2.0, 2.0))
                .unwrap();
            table
        };
        let (from, to) = (Vec3::new(0.2, 1.4, 0.0), Vec3::new(-0.2, 1.4, 0.0));

        // 1.4 off-axis: inside a 0.5 margin, outside a 0.1 margin
        let mut full_size = scene_with(table(), from);
        assert!(matches!(
            update_observer_in_scene(&mut full_size, to),
            StepOutcome::PassedUnlinked(_)
        ));

        let mut shrunk = scene_with(table(), from);
        shrunk.observer = shrunk.observer.clone().with_scale(0.2);
        assert_eq!(update_observer_in_scene(&mut shrunk, to), StepOutcome::Moved);
    }

    #[test]
    fn walking_through_scaling_pair_transits_once() {
        let (portals, ids) = create_demo_portals().unwrap();
        let mut scene = scene_with(portals, Vec3::new(5.3, 1.5, 0.0));
        let outcomes = walk_forward(&mut scene, 30);

        let transits: Vec<_> = outcomes
            .iter()
            .filter(|o| matches!(o, StepOutcome::Transited { .. }))
            .collect();
        assert_eq!(transits, vec![&StepOutcome::Transited { entry: ids.a, exit: ids.b }]);

        let exit = scene.portals.get(ids.b).unwrap().surface().clone();
        assert!((scene.observer.scale() - 5.0).abs() < EPS);
        assert!(scene.observer.front().dot(exit.normal()) > 0.0);
        assert!(exit.signed_distance(scene.observer.position()) > 0.5);
        assert!(scene.observer.position().x < 14.9);
    }

    #[test]
    fn walking_through_rotating_pair_transits_once() {
        let (portals, ids) = create_demo_portals().unwrap();
        let mut scene = scene_with(portals, Vec3::new(0.0, 1.5, 7.7));
        scene.observer = ObserverPose::new(scene.observer.position(), 90.0, 0.0);
        let outcomes = walk_forward(&mut scene, 30);

        let transits: Vec<_> = outcomes
            .iter()
            .filter(|o| matches!(o, StepOutcome::Transited { .. }))
            .collect();
        assert_eq!(transits, vec![&StepOutcome::Transited { entry: ids.c, exit: ids.d }]);

        let exit = scene.portals.get(ids.d).unwrap().surface().clone();
        assert!((scene.observer.front() - Vec3::Z).length() < EPS);
        assert!(exit.signed_distance(scene.observer.position()) > 0.5);
        assert!((scene.observer.position().x - 20.0).abs() < EPS);
    }

    /// Steps straight ahead at locomotion speed, one 16 ms frame at a time.
    fn walk_forward(scene: &mut Scene, steps: usize) -> Vec<StepOutcome> {
        (0..steps)
            .map(|_| {
                let step = scene.observer.front() * scene.locomotion.speed(&scene.observer) * 0.016;
                let target = scene.observer.position() + step;
                update_observer_in_scene(scene, target)
            })
            .collect()
    }

    fn moved_to(pose: &ObserverPose, position: Vec3) -> ObserverPose {
        let mut pose = pose.clone();
        pose.set_position(position);
        pose
    }
}
