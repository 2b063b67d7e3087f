// src/engine_lib/virtual_view.rs

use glam::{Mat4, Vec3};

use crate::engine_lib::portal::{EndpointId, PortalLink, PortalTable};
use crate::engine_lib::pose::ObserverPose;
use crate::engine_lib::surface::OrientedSurface;

pub const DEFAULT_MAX_VISIBLE_DISTANCE: f32 = 50.0;
pub const DEFAULT_FACING_THRESHOLD: f32 = 0.1;

/// Standing closer than this to a portal's centre always counts as facing it.
const AT_PORTAL_DISTANCE: f32 = 1e-4;

/// Cheap gating heuristic deciding whether a portal's view is rendered this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityGate {
    pub max_distance: f32,
    pub facing_threshold: f32,
}

impl Default for VisibilityGate {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_VISIBLE_DISTANCE,
            facing_threshold: DEFAULT_FACING_THRESHOLD,
        }
    }
}

impl VisibilityGate {
    pub fn is_visible(&self, surface: &OrientedSurface, observer: &ObserverPose) -> bool {
        let to_portal = surface.position() - observer.position();
        let distance = to_portal.length();
        if distance > self.max_distance {
            return false;
        }
        if distance < AT_PORTAL_DISTANCE {
            return true;
        }
        observer.front().dot(to_portal / distance) > self.facing_threshold
    }
}

/// Camera used to render "the view through" a portal. Never becomes the real observer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VirtualView {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
}

impl VirtualView {
    /// The real camera's own view; used for unlinked portals.
    pub fn direct(observer: &ObserverPose, projection: Mat4) -> Self {
        Self {
            position: observer.position(),
            front: observer.front(),
            up: observer.up(),
            view: observer.view_matrix(),
            projection,
        }
    }
}

/// Hook for per-portal projection tweaks (near/far under extreme scales). Currently the real
/// projection is reused unchanged.
pub fn portal_projection(_link: &PortalLink<'_>, projection: Mat4) -> Mat4 {
    projection
}

impl<'a> PortalLink<'a> {
    /// Places a virtual camera at the exit: the observer's offset from the entry surface is
    /// re-expressed at the exit with its length scaled by the exit's scale effect, and the
    /// gaze is rotated the same way a pose transit rotates it.
    pub fn virtual_view(&self, observer: &ObserverPose, projection: Mat4) -> VirtualView {
        let local = self.entry.surface().to_local(observer.position());
        let exit = self.exit.surface();
        let offset = -local.z * exit.normal() + local.x * exit.right() + local.y * exit.up();
        let position = exit.position() + offset * self.exit.scale_effect();

        let rotation = self.orientation_transform();
        let front = (rotation * observer.front()).normalize();
        let up = (rotation * observer.up()).normalize();

        VirtualView {
            position,
            front,
            up,
            view: Mat4::look_at_rh(position, position + front, up),
            projection: portal_projection(self, projection),
        }
    }
}

impl PortalTable {
    /// Falls back to the direct camera view when `entry` has no destination.
    pub fn virtual_view(&self, entry: EndpointId, observer: &ObserverPose, projection: Mat4) -> VirtualView {
        match self.link_from(entry) {
            Some(link) => link.virtual_view(observer, projection),
            None => VirtualView::direct(observer, projection),
        }
    }

    /// Linked endpoints that pass `gate` for `observer`, in id order.
    pub fn visible_portals<'a>(
        &'a self,
        observer: &'a ObserverPose,
        gate: &'a VisibilityGate,
    ) -> impl Iterator<Item = EndpointId> + 'a {
        self.iter()
            .filter(|(_, endpoint)| endpoint.is_linked())
            .filter(move |(_, endpoint)| gate.is_visible(endpoint.surface(), observer))
            .map(|(id, _)| id)
    }
}
