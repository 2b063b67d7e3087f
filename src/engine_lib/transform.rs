// src/engine_lib/transform.rs

use glam::{Mat3, Vec3};

use crate::engine_lib::portal::{EndpointId, PortalLink, PortalTable};
use crate::engine_lib::pose::ObserverPose;
use crate::engine_lib::surface::OrientedSurface;

/// Rotation effects with a smaller magnitude than this are treated as absent.
pub const ROTATION_EFFECT_EPSILON: f32 = 1e-4;

/// Product of the two surface frames, `basis(exit) * basis(entry)`, each with columns
/// (right, up, normal). For upright pairs a gaze that walks into the entry's front face comes
/// out along the exit's normal, so the traveller leaves the exit instead of re-entering it.
pub fn basis_change(entry: &OrientedSurface, exit: &OrientedSurface) -> Mat3 {
    exit.basis() * entry.basis()
}

/// Intrinsic X-then-Y-then-Z rotation, or `None` when the effect is negligible.
pub fn rotation_effect_matrix(effect: Vec3) -> Option<Mat3> {
    if effect.length() <= ROTATION_EFFECT_EPSILON {
        return None;
    }
    Some(Mat3::from_rotation_x(effect.x) * Mat3::from_rotation_y(effect.y) * Mat3::from_rotation_z(effect.z))
}

impl<'a> PortalLink<'a> {
    /// Maps a world point near the entry surface to the matching point at the exit surface.
    ///
    /// The offset is scaled by the *exit* endpoint's scale effect and its depth is negated
    /// along the exit normal.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        let local = self.entry.surface().to_local(point) * self.exit.scale_effect();
        let exit = self.exit.surface();
        exit.position() + (-local.z) * exit.normal() + local.x * exit.right() + local.y * exit.up()
    }

    /// The full rotation applied to observer directions: the exit's rotation effect first,
    /// then the basis change.
    pub fn orientation_transform(&self) -> Mat3 {
        let basis = basis_change(self.entry.surface(), self.exit.surface());
        match rotation_effect_matrix(self.exit.rotation_effect()) {
            Some(effect) => basis * effect,
            None => basis,
        }
    }

    /// Pure pose transit. The returned pose has its cumulative scale multiplied by the exit's
    /// scale effect; the field of view is left alone.
    pub fn transform_pose(&self, pose: &ObserverPose) -> ObserverPose {
        let rotation = self.orientation_transform();
        let mut out = pose.clone();
        out.replace(
            self.transform_point(pose.position()),
            (rotation * pose.front()).normalize(),
            (rotation * pose.up()).normalize(),
            pose.scale() * self.exit.scale_effect(),
        );
        out
    }
}

impl PortalTable {
    /// Pass-through when `entry` is unknown or unlinked.
    pub fn transform_point(&self, entry: EndpointId, point: Vec3) -> Vec3 {
        match self.link_from(entry) {
            Some(link) => link.transform_point(point),
            None => point,
        }
    }

    /// Pass-through when `entry` is unknown or unlinked.
    pub fn transform_pose(&self, entry: EndpointId, pose: &ObserverPose) -> ObserverPose {
        match self.link_from(entry) {
            Some(link) => link.transform_pose(pose),
            None => pose.clone(),
        }
    }
}
