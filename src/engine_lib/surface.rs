// src/engine_lib/surface.rs

use glam::{Mat3, Vec2, Vec3};

use crate::error::{PortalError, Result};

const MIN_AXIS_LENGTH_SQ: f32 = 1e-12;

/// A bounded planar rectangle with a strict right-handed (right, up, normal) basis.
///
/// The basis is derived once in [`OrientedSurface::new`] and is read-only afterwards, so
/// `right`, `up` and `normal` can never drift out of orthonormality.
#[derive(Clone, Debug, PartialEq)]
pub struct OrientedSurface {
    position: Vec3,
    normal: Vec3,
    up: Vec3,
    right: Vec3,
    width: f32,
    height: f32,
}

impl OrientedSurface {
    /// `up` only needs to be roughly up; it is re-derived so the basis is orthonormal.
    pub fn new(position: Vec3, normal: Vec3, up: Vec3, width: f32, height: f32) -> Result<Self> {
        if !position.is_finite() || !normal.is_finite() || !up.is_finite() {
            return Err(PortalError::DegenerateBasis { reason: "non-finite input" });
        }
        if normal.length_squared() < MIN_AXIS_LENGTH_SQ {
            return Err(PortalError::DegenerateBasis { reason: "zero-length normal" });
        }
        if up.length_squared() < MIN_AXIS_LENGTH_SQ {
            return Err(PortalError::DegenerateBasis { reason: "zero-length up vector" });
        }
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PortalError::InvalidExtent { width, height });
        }

        let normal = normal.normalize();
        let right = up.normalize().cross(normal);
        if right.length_squared() < MIN_AXIS_LENGTH_SQ {
            return Err(PortalError::DegenerateBasis { reason: "normal is parallel to up" });
        }
        let right = right.normalize();
        let up = normal.cross(right).normalize();

        Ok(Self { position, normal, up, right, width, height })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Columns are (right, up, normal): maps surface-local coordinates to world directions.
    pub fn basis(&self) -> Mat3 {
        Mat3::from_cols(self.right, self.up, self.normal)
    }

    /// World point -> (right, up, depth) coordinates relative to the surface centre.
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        let rel = point - self.position;
        Vec3::new(rel.dot(self.right), rel.dot(self.up), rel.dot(self.normal))
    }

    /// Inverse of [`Self::to_local`].
    pub fn from_local(&self, local: Vec3) -> Vec3 {
        self.position + local.x * self.right + local.y * self.up + local.z * self.normal
    }

    /// Signed distance along the normal; positive in front.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.position).dot(self.normal)
    }

    /// Corners in order top-left, top-right, bottom-left, bottom-right.
    pub fn corners(&self) -> [Vec3; 4] {
        let half_w = self.right * (self.width * 0.5);
        let half_h = self.up * (self.height * 0.5);
        [
            self.position - half_w + half_h,
            self.position + half_w + half_h,
            self.position - half_w - half_h,
            self.position + half_w - half_h,
        ]
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::OrientedSurface;
    use crate::error::PortalError;

    const EPS: f32 = 1e-5;

    fn assert_orthonormal(s: &OrientedSurface) {
        assert!(s.right().dot(s.up()).abs() < EPS);
        assert!(s.right().dot(s.normal()).abs() < EPS);
        assert!(s.up().dot(s.normal()).abs() < EPS);
        assert!((s.right().length() - 1.0).abs() < EPS);
        assert!((s.up().length() - 1.0).abs() < EPS);
        assert!((s.normal().length() - 1.0).abs() < EPS);
        // right-handed
        assert!((s.right().cross(s.up()) - s.normal()).length() < EPS);
    }

    #[test]
    fn basis_is_orthonormal_for_skewed_inputs() {
        let inputs = [
            (Vec3::X, Vec3::Y),
            (Vec3::new(0.0, 0.0, -3.0), Vec3::new(0.0, 2.0, 0.0)),
            (Vec3::new(1.0, 0.3, -0.2), Vec3::new(0.4, 1.0, 0.1)),
            (Vec3::new(-0.7, 0.0, 0.7), Vec3::new(0.0, 1.0, 0.9)),
            (Vec3::Y, Vec3::Z),
        ];
        for (normal, up) in inputs {
            let s = OrientedSurface::new(Vec3::new(1.0, 2.0, 3.0), normal, up, 2.0, 3.0).unwrap();
            assert_orthonormal(&s);
            assert!((s.normal() - normal.normalize()).length() < EPS);
        }
    }

    #[test]
    fn right_follows_up_cross_normal() {
        let s = OrientedSurface::new(Vec3::ZERO, Vec3::X, Vec3::Y, 2.0, 2.0).unwrap();
        assert!((s.right() - Vec3::NEG_Z).length() < EPS);
        assert!((s.up() - Vec3::Y).length() < EPS);
    }

    #[test]
    fn rejects_degenerate_bases() {
        let zero_normal = OrientedSurface::new(Vec3::ZERO, Vec3::ZERO, Vec3::Y, 1.0, 1.0);
        assert!(matches!(zero_normal, Err(PortalError::DegenerateBasis { .. })));

        let zero_up = OrientedSurface::new(Vec3::ZERO, Vec3::X, Vec3::ZERO, 1.0, 1.0);
        assert!(matches!(zero_up, Err(PortalError::DegenerateBasis { .. })));

        let parallel = OrientedSurface::new(Vec3::ZERO, Vec3::Y, Vec3::new(0.0, -2.0, 0.0), 1.0, 1.0);
        assert!(matches!(parallel, Err(PortalError::DegenerateBasis { .. })));

        let nan = OrientedSurface::new(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::X, Vec3::Y, 1.0, 1.0);
        assert!(matches!(nan, Err(PortalError::DegenerateBasis { .. })));
    }

    #[test]
    fn rejects_bad_extents() {
        let flat = OrientedSurface::new(Vec3::ZERO, Vec3::X, Vec3::Y, 0.0, 1.0);
        assert!(matches!(flat, Err(PortalError::InvalidExtent { .. })));
        let negative = OrientedSurface::new(Vec3::ZERO, Vec3::X, Vec3::Y, 1.0, -4.0);
        assert!(matches!(negative, Err(PortalError::InvalidExtent { .. })));
    }

    #[test]
    fn local_coordinates_round_trip() {
        let s = OrientedSurface::new(
            Vec3::new(5.0, 1.5, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::Y,
            2.5,
            4.0,
        )
        .unwrap();
        let p = Vec3::new(7.0, -2.0, 3.5);
        let local = s.to_local(p);
        assert!((s.from_local(local) - p).length() < 1e-4);
        assert!((local.z - s.signed_distance(p)).abs() < EPS);
    }

    #[test]
    fn corners_span_the_extents() {
        let s = OrientedSurface::new(Vec3::ZERO, Vec3::Z, Vec3::Y, 2.0, 4.0).unwrap();
        let [tl, tr, bl, br] = s.corners();
        assert!(((tr - tl).length() - 2.0).abs() < EPS);
        assert!(((tl - bl).length() - 4.0).abs() < EPS);
        assert!(((br - bl).length() - 2.0).abs() < EPS);
        assert!(tl.y > bl.y);
    }
}
