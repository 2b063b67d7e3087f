// src/demo_scene.rs

use glam::Vec3;

use crate::config::EngineConfig;
use crate::engine_lib::portal::{EndpointId, PortalDefinition, PortalTable};
use crate::engine_lib::pose::ObserverPose;
use crate::engine_lib::scene_types::{Locomotion, Prop, Scene};
use crate::error::Result;

pub const PORTAL_WIDTH: f32 = 2.5;
pub const PORTAL_HEIGHT: f32 = 4.0;
const PORTAL_CENTER_Y: f32 = 1.5;

/// X offset of each area's origin.
pub const AREA_OFFSETS: [f32; 2] = [0.0, 20.0];
const FLOOR_EXTENT: f32 = 50.0;
const CUBE_GRID: i32 = 2;
const CUBE_SPACING: f32 = 2.0;
const CUBE_EDGE: f32 = 1.0;

const BLUE: [f32; 4] = [0.0, 0.4, 0.8, 0.7];
const ORANGE: [f32; 4] = [1.0, 0.5, 0.0, 0.7];
const PURPLE: [f32; 4] = [0.5, 0.0, 0.5, 0.7];

const FLOOR_COLORS: [[f32; 4]; 2] = [[0.35, 0.38, 0.42, 1.0], [0.42, 0.36, 0.32, 1.0]];

/// Ids of the demo portals, in insertion order.
#[derive(Clone, Copy, Debug)]
pub struct DemoPortals {
    /// Shrinks the traveller to a fifth.
    pub a: EndpointId,
    /// Grows the traveller five times.
    pub b: EndpointId,
    pub c: EndpointId,
    pub d: EndpointId,
}

fn portal(position: Vec3, normal: Vec3) -> PortalDefinition {
    PortalDefinition::new(position, normal, Vec3::Y, PORTAL_WIDTH, PORTAL_HEIGHT)
}

/// A and B join the two areas with a scaling pair; C and D are a rotating pair.
pub fn create_demo_portals() -> Result<(PortalTable, DemoPortals)> {
    let mut table = PortalTable::new();

    let a = table.insert(
        &portal(Vec3::new(5.0, PORTAL_CENTER_Y, 0.0), Vec3::X)
            .with_edge_color(BLUE)
            .with_scale(0.2)
            .with_rotation(Vec3::new(0.0, 5.0_f32.to_radians(), 0.0)),
    )?;
    let b = table.insert(
        &portal(Vec3::new(15.0, PORTAL_CENTER_Y, 0.0), Vec3::NEG_X)
            .with_edge_color(ORANGE)
            .with_scale(5.0)
            .with_rotation(Vec3::new(0.0, (-5.0_f32).to_radians(), 0.0)),
    )?;
    let c = table.insert(
        &portal(Vec3::new(0.0, PORTAL_CENTER_Y, 8.0), Vec3::NEG_Z)
            .with_edge_color(PURPLE)
            .with_rotation(Vec3::new(90.0_f32.to_radians(), 0.0, 0.0)),
    )?;
    let d = table.insert(
        &portal(Vec3::new(20.0, PORTAL_CENTER_Y, -8.0), Vec3::Z)
            .with_edge_color(PURPLE)
            .with_rotation(Vec3::new(0.0, 180.0_f32.to_radians(), 0.0)),
    )?;

    table.link(a, b)?;
    table.link(c, d)?;
    Ok((table, DemoPortals { a, b, c, d }))
}

/// Floor plus a 5x5 grid of cubes (centre cell left empty) for each area.
pub fn create_demo_props() -> Vec<Prop> {
    let mut props = Vec::new();
    for (area, offset) in AREA_OFFSETS.into_iter().enumerate() {
        props.push(Prop::plane(Vec3::new(offset, 0.0, 0.0), FLOOR_EXTENT, FLOOR_COLORS[area]));
        for i in -CUBE_GRID..=CUBE_GRID {
            for j in -CUBE_GRID..=CUBE_GRID {
                if i == 0 && j == 0 {
                    continue;
                }
                let position = Vec3::new(offset + i as f32 * CUBE_SPACING, 0.5, j as f32 * CUBE_SPACING);
                props.push(Prop::cube(position, CUBE_EDGE, cube_color(area, i, j)));
            }
        }
    }
    props
}

fn cube_color(area: usize, i: i32, j: i32) -> [f32; 4] {
    let u = (i + CUBE_GRID) as f32 / (2 * CUBE_GRID) as f32;
    let v = (j + CUBE_GRID) as f32 / (2 * CUBE_GRID) as f32;
    if area == 0 {
        [0.2 + 0.6 * u, 0.5, 0.2 + 0.6 * v, 1.0]
    } else {
        [0.9, 0.3 + 0.5 * u, 0.2 + 0.3 * v, 1.0]
    }
}

pub fn create_demo_scene(config: &EngineConfig) -> Result<Scene> {
    let (portals, _) = create_demo_portals()?;
    let camera = &config.camera;
    Ok(Scene {
        portals,
        observer: ObserverPose::new(camera.start_position, camera.start_yaw_deg, camera.start_pitch_deg),
        locomotion: Locomotion {
            base_speed: camera.movement_speed,
            base_collision_radius: camera.collision_radius,
        },
        props: create_demo_props(),
    })
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::engine_lib::scene_types::PropKind;

    #[test]
    fn portals_are_linked_in_pairs() {
        let (table, ids) = create_demo_portals().unwrap();
        assert_eq!(table.len(), 4);
        let dest = |id| table.get(id).unwrap().destination();
        assert_eq!(dest(ids.a), Some(ids.b));
        assert_eq!(dest(ids.b), Some(ids.a));
        assert_eq!(dest(ids.c), Some(ids.d));
        assert_eq!(dest(ids.d), Some(ids.c));
    }

    #[test]
    fn scaling_pair_is_reciprocal() {
        let (table, ids) = create_demo_portals().unwrap();
        let a = table.get(ids.a).unwrap();
        let b = table.get(ids.b).unwrap();
        assert_eq!(a.scale_effect(), 0.2);
        assert_eq!(b.scale_effect(), 5.0);
        assert!((a.scale_effect() * b.scale_effect() - 1.0).abs() < 1e-6);
        assert_eq!(a.surface().normal(), Vec3::X);
        assert_eq!(b.surface().normal(), Vec3::NEG_X);
        assert_eq!(a.surface().width(), PORTAL_WIDTH);
        assert_eq!(a.surface().height(), PORTAL_HEIGHT);
    }

    #[test]
    fn props_cover_both_areas() {
        let props = create_demo_props();
        let floors = props.iter().filter(|p| p.kind == PropKind::Plane).count();
        let cubes = props.iter().filter(|p| p.kind == PropKind::Cube).count();
        assert_eq!(floors, 2);
        assert_eq!(cubes, 48);
        assert!(props.iter().all(|p| p.position != Vec3::new(0.0, 0.5, 0.0)));
        assert!(props.iter().any(|p| p.position == Vec3::new(24.0, 0.5, -4.0)));
    }

    #[test]
    fn scene_starts_from_config() {
        let mut config = EngineConfig::default();
        config.camera.start_position = Vec3::new(1.0, 2.0, 3.0);
        config.camera.movement_speed = 4.0;
        let scene = create_demo_scene(&config).unwrap();
        assert_eq!(scene.observer.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(scene.observer.scale(), 1.0);
        assert_eq!(scene.locomotion.speed(&scene.observer), 4.0);
        assert_eq!(scene.portals.len(), 4);
    }
}
