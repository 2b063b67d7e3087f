// src/engine_lib/pose.rs

use glam::{Mat4, Vec3};

pub const WORLD_UP: Vec3 = Vec3::Y;
pub const MAX_PITCH_DEG: f32 = 89.0;

/// Observer position plus an orthonormal (front, right, up) basis.
///
/// Yaw and pitch are not stored: they are recomputed from `front` whenever they are asked
/// for, so the basis stays the single source of truth across portal transits.
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverPose {
    position: Vec3,
    front: Vec3,
    right: Vec3,
    up: Vec3,
    /// Cumulative scale picked up from portal transits; 1.0 at spawn.
    scale: f32,
}

impl ObserverPose {
    /// Builds the basis from Euler angles in degrees, with world +Y as the reference up.
    pub fn new(position: Vec3, yaw_deg: f32, pitch_deg: f32) -> Self {
        let (front, right, up) = basis_from_yaw_pitch(yaw_deg, pitch_deg);
        Self { position, front, right, up, scale: 1.0 }
    }

    /// Builds the pose from an arbitrary front/up pair, re-orthonormalizing it.
    /// Falls back to world up when `up` is parallel to `front`.
    pub fn from_basis(position: Vec3, front: Vec3, up: Vec3) -> Self {
        let (front, right, up) = orthonormalize(front, up);
        Self { position, front, right, up, scale: 1.0 }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Degrees; `atan2(front.z, front.x)`.
    pub fn yaw(&self) -> f32 {
        yaw_pitch_from_front(self.front).0
    }

    /// Degrees; `asin(front.y)`.
    pub fn pitch(&self) -> f32 {
        yaw_pitch_from_front(self.front).1
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Mouse-look: adds to the derived angles and rebuilds the basis around world up.
    /// Any roll picked up from a rotation effect is dropped here.
    pub fn rotate(&mut self, yaw_delta_deg: f32, pitch_delta_deg: f32) {
        let yaw = self.yaw() + yaw_delta_deg;
        let pitch = (self.pitch() + pitch_delta_deg).clamp(-MAX_PITCH_DEG, MAX_PITCH_DEG);
        let (front, right, up) = basis_from_yaw_pitch(yaw, pitch);
        self.front = front;
        self.right = right;
        self.up = up;
    }

    pub(crate) fn replace(&mut self, position: Vec3, front: Vec3, up: Vec3, scale: f32) {
        let (front, right, up) = orthonormalize(front, up);
        self.position = position;
        self.front = front;
        self.right = right;
        self.up = up;
        self.scale = scale;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }
}

/// (yaw, pitch) in degrees. `front.y` is clamped so a slightly denormalized vector cannot
/// produce NaN.
pub fn yaw_pitch_from_front(front: Vec3) -> (f32, f32) {
    let pitch = front.y.clamp(-1.0, 1.0).asin().to_degrees();
    let yaw = front.z.atan2(front.x).to_degrees();
    (yaw, pitch)
}

fn basis_from_yaw_pitch(yaw_deg: f32, pitch_deg: f32) -> (Vec3, Vec3, Vec3) {
    let (yaw, pitch) = (yaw_deg.to_radians(), pitch_deg.to_radians());
    let front = Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos());
    orthonormalize(front, WORLD_UP)
}

fn orthonormalize(front: Vec3, up: Vec3) -> (Vec3, Vec3, Vec3) {
    let front = front.try_normalize().unwrap_or(Vec3::NEG_Z);
    let right = front
        .cross(up)
        .try_normalize()
        .or_else(|| front.cross(WORLD_UP).try_normalize())
        .unwrap_or(Vec3::X);
    let up = right.cross(front).normalize();
    (front, right, up)
}
