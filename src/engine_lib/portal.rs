// src/engine_lib/portal.rs

use std::fmt;

use glam::Vec3;
use log::debug;

use crate::engine_lib::surface::OrientedSurface;
use crate::error::{PortalError, Result};

/// Handle into a [`PortalTable`]. Ids are handed out in insertion order and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(pub usize);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// In-memory construction parameters for one portal endpoint, supplied at world setup.
#[derive(Clone, Debug)]
pub struct PortalDefinition {
    pub position: Vec3,
    pub normal: Vec3,
    pub up: Vec3,
    pub width: f32,
    pub height: f32,
    pub edge_color: [f32; 4],
    pub scale_effect: f32,
    /// Intrinsic X, then Y, then Z rotation in radians.
    pub rotation_effect: Vec3,
}

impl PortalDefinition {
    pub fn new(position: Vec3, normal: Vec3, up: Vec3, width: f32, height: f32) -> Self {
        Self {
            position,
            normal,
            up,
            width,
            height,
            edge_color: [1.0, 1.0, 1.0, 1.0],
            scale_effect: 1.0,
            rotation_effect: Vec3::ZERO,
        }
    }

    pub fn with_edge_color(mut self, color: [f32; 4]) -> Self {
        self.edge_color = color;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale_effect = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation_effect = rotation;
        self
    }
}

#[derive(Clone, Debug)]
pub struct PortalEndpoint {
    surface: OrientedSurface,
    scale_effect: f32,
    rotation_effect: Vec3,
    edge_color: [f32; 4],
    destination: Option<EndpointId>,
}

impl PortalEndpoint {
    pub fn new(def: &PortalDefinition) -> Result<Self> {
        let surface = OrientedSurface::new(def.position, def.normal, def.up, def.width, def.height)?;
        if !(def.scale_effect.is_finite() && def.scale_effect > 0.0) {
            return Err(PortalError::InvalidScale(def.scale_effect));
        }
        if !def.rotation_effect.is_finite() {
            return Err(PortalError::InvalidRotation);
        }
        Ok(Self {
            surface,
            scale_effect: def.scale_effect,
            rotation_effect: def.rotation_effect,
            edge_color: def.edge_color,
            destination: None,
        })
    }

    pub fn surface(&self) -> &OrientedSurface {
        &self.surface
    }

    pub fn scale_effect(&self) -> f32 {
        self.scale_effect
    }

    pub fn rotation_effect(&self) -> Vec3 {
        self.rotation_effect
    }

    pub fn edge_color(&self) -> [f32; 4] {
        self.edge_color
    }

    pub fn destination(&self) -> Option<EndpointId> {
        self.destination
    }

    pub fn is_linked(&self) -> bool {
        self.destination.is_some()
    }
}

/// A resolved traversal: `exit` is always `entry`'s destination.
#[derive(Clone, Copy, Debug)]
pub struct PortalLink<'a> {
    pub entry: &'a PortalEndpoint,
    pub exit: &'a PortalEndpoint,
    pub exit_id: EndpointId,
}

/// Flat table of endpoints. Links are stored as ids on both sides, so removing one endpoint
/// only has to clear its partner's `destination`.
#[derive(Debug, Default)]
pub struct PortalTable {
    slots: Vec<Option<PortalEndpoint>>,
}

impl PortalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, def: &PortalDefinition) -> Result<EndpointId> {
        let endpoint = PortalEndpoint::new(def)?;
        let id = EndpointId(self.slots.len());
        self.slots.push(Some(endpoint));
        Ok(id)
    }

    pub fn get(&self, id: EndpointId) -> Option<&PortalEndpoint> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    fn get_mut(&mut self, id: EndpointId) -> Option<&mut PortalEndpoint> {
        self.slots.get_mut(id.0).and_then(|slot| slot.as_mut())
    }

    pub fn contains(&self, id: EndpointId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live endpoints in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (EndpointId, &PortalEndpoint)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|endpoint| (EndpointId(index), endpoint)))
    }

    /// Links `a` and `b` in both directions. Any previous partner of either side is detached
    /// first, so `x.destination == Some(y)` always implies `y.destination == Some(x)`.
    pub fn link(&mut self, a: EndpointId, b: EndpointId) -> Result<()> {
        if !self.contains(a) {
            return Err(PortalError::UnknownEndpoint(a));
        }
        if !self.contains(b) {
            return Err(PortalError::UnknownEndpoint(b));
        }
        if a == b {
            return Err(PortalError::SelfLink(a));
        }

        self.unlink(a);
        self.unlink(b);
        if let Some(endpoint) = self.get_mut(a) {
            endpoint.destination = Some(b);
        }
        if let Some(endpoint) = self.get_mut(b) {
            endpoint.destination = Some(a);
        }
        debug!("Linked portal {} <-> {}", a, b);
        Ok(())
    }

    /// Clears the link on both sides. No-op for unlinked or unknown ids.
    pub fn unlink(&mut self, id: EndpointId) {
        let Some(partner) = self.get(id).and_then(PortalEndpoint::destination) else {
            return;
        };
        if let Some(endpoint) = self.get_mut(partner) {
            endpoint.destination = None;
        }
        if let Some(endpoint) = self.get_mut(id) {
            endpoint.destination = None;
        }
    }

    pub fn remove(&mut self, id: EndpointId) -> Option<PortalEndpoint> {
        self.unlink(id);
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    /// `None` when `id` is unknown or unlinked; callers then fall back to pass-through.
    pub fn link_from(&self, id: EndpointId) -> Option<PortalLink<'_>> {
        let entry = self.get(id)?;
        let exit_id = entry.destination?;
        let exit = self.get(exit_id)?;
        Some(PortalLink { entry, exit, exit_id })
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::{EndpointId, PortalDefinition, PortalTable};
    use crate::error::PortalError;

    fn def_at(x: f32) -> PortalDefinition {
        PortalDefinition::new(Vec3::new(x, 0.0, 0.0), Vec3::X, Vec3::Y, 2.0, 2.0)
    }

    #[test]
    fn link_is_symmetric() {
        let mut table = PortalTable::new();
        let a = table.insert(&def_at(0.0)).unwrap();
        let b = table.insert(&def_at(10.0)).unwrap();
        assert_eq!(table.get(a).unwrap().destination(), None);
        assert_eq!(table.get(b).unwrap().destination(), None);

        table.link(a, b).unwrap();
        assert_eq!(table.get(a).unwrap().destination(), Some(b));
        assert_eq!(table.get(b).unwrap().destination(), Some(a));
    }

    #[test]
    fn relinking_detaches_previous_partner() {
        let mut table = PortalTable::new();
        let a = table.insert(&def_at(0.0)).unwrap();
        let b = table.insert(&def_at(1.0)).unwrap();
        let c = table.insert(&def_at(2.0)).unwrap();
        table.link(a, b).unwrap();
        table.link(a, c).unwrap();

        assert_eq!(table.get(a).unwrap().destination(), Some(c));
        assert_eq!(table.get(c).unwrap().destination(), Some(a));
        assert_eq!(table.get(b).unwrap().destination(), None);
    }

    #[test]
    fn remove_clears_partner() {
        let mut table = PortalTable::new();
        let a = table.insert(&def_at(0.0)).unwrap();
        let b = table.insert(&def_at(1.0)).unwrap();
        table.link(a, b).unwrap();

        assert!(table.remove(a).is_some());
        assert!(table.get(a).is_none());
        assert_eq!(table.get(b).unwrap().destination(), None);
        assert!(table.link_from(b).is_none());

        // ids are not reused
        let c = table.insert(&def_at(3.0)).unwrap();
        assert_eq!(c, EndpointId(2));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn link_errors() {
        let mut table = PortalTable::new();
        let a = table.insert(&def_at(0.0)).unwrap();
        assert!(matches!(table.link(a, a), Err(PortalError::SelfLink(_))));
        assert!(matches!(
            table.link(a, EndpointId(9)),
            Err(PortalError::UnknownEndpoint(EndpointId(9)))
        ));
    }

    #[test]
    fn rejects_non_positive_scale() {
        let mut table = PortalTable::new();
        let zero = table.insert(&def_at(0.0).with_scale(0.0));
        assert!(matches!(zero, Err(PortalError::InvalidScale(_))));
        let nan = table.insert(&def_at(0.0).with_scale(f32::NAN));
        assert!(matches!(nan, Err(PortalError::InvalidScale(_))));
        assert!(table.is_empty());
    }

    #[test]
    fn link_from_resolves_exit() {
        let mut table = PortalTable::new();
        let a = table.insert(&def_at(0.0).with_scale(2.0)).unwrap();
        let b = table.insert(&def_at(5.0).with_scale(3.0)).unwrap();
        assert!(table.link_from(a).is_none());
        table.link(a, b).unwrap();

        let link = table.link_from(a).unwrap();
        assert_eq!(link.entry.scale_effect(), 2.0);
        assert_eq!(link.exit.scale_effect(), 3.0);
        assert_eq!(link.exit_id, b);
    }
}
