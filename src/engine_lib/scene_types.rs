// src/engine_lib/scene_types.rs
use glam::Vec3;

use crate::engine_lib::portal::{EndpointId, PortalTable};
use crate::engine_lib::pose::ObserverPose;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropKind {
    /// Horizontal square centred on `position`; `size.x` by `size.z`.
    Plane,
    /// Axis-aligned box centred on `position`.
    Cube,
}

/// Static decoration. Props never move; the distortion effect is applied when drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct Prop {
    pub kind: PropKind,
    pub position: Vec3,
    pub size: Vec3,
    pub color: [f32; 4],
}

impl Prop {
    pub fn plane(position: Vec3, extent: f32, color: [f32; 4]) -> Self {
        Self { kind: PropKind::Plane, position, size: Vec3::new(extent, 0.0, extent), color }
    }

    pub fn cube(position: Vec3, edge: f32, color: [f32; 4]) -> Self {
        Self { kind: PropKind::Cube, position, size: Vec3::splat(edge), color }
    }
}

/// Base movement values for an unscaled observer. The effective values grow and shrink with
/// the observer's cumulative portal scale; the field of view never does.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Locomotion {
    pub base_speed: f32,
    pub base_collision_radius: f32,
}

impl Locomotion {
    pub fn speed(&self, observer: &ObserverPose) -> f32 {
        self.base_speed * observer.scale()
    }

    pub fn collision_radius(&self, observer: &ObserverPose) -> f32 {
        self.base_collision_radius * observer.scale()
    }
}

#[derive(Debug)]
pub struct Scene {
    pub portals: PortalTable,
    pub observer: ObserverPose,
    pub locomotion: Locomotion,
    pub props: Vec<Prop>,
}

/// What one simulation step did to the observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    /// The observer went through `entry` and now stands at `exit`.
    Transited { entry: EndpointId, exit: EndpointId },
    /// The step hit an endpoint with no destination; the move is kept as is.
    PassedUnlinked(EndpointId),
}
