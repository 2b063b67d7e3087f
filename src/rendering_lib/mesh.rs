// src/rendering_lib/mesh.rs

use glam::{Mat3, Vec3};

use super::vertex::Vertex;
use crate::engine_lib::scene_types::{Prop, PropKind};
use crate::engine_lib::surface::OrientedSurface;

pub const FRAME_THICKNESS_RATIO: f32 = 0.05;
pub const FRAME_DEPTH: f32 = 0.1;
pub const FRAME_CORNER_SCALE: f32 = 1.5;

/// Corner order (s, t) around a quad, counter-clockwise when `u x v` points at the viewer.
const QUAD_CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
const QUAD_TRIANGLES: [usize; 6] = [0, 1, 2, 0, 2, 3];

/// (normal, u, v) per box face, with `u x v == normal`.
const BOX_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::NEG_X, Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

/// Two triangles spanning `center +- u_half +- v_half`. UVs run 0..1 along `u` and `v`.
pub fn quad(center: Vec3, u_half: Vec3, v_half: Vec3, normal: Vec3, color: [f32; 4]) -> [Vertex; 6] {
    let corners = QUAD_CORNERS.map(|(s, t)| {
        Vertex::new(
            (center + u_half * s + v_half * t).to_array(),
            normal.to_array(),
            [(s + 1.0) * 0.5, (t + 1.0) * 0.5],
            color,
        )
    });
    QUAD_TRIANGLES.map(|index| corners[index])
}

/// Box with half extents `half` measured along the columns of `axes`.
pub fn oriented_box(center: Vec3, axes: Mat3, half: Vec3, color: [f32; 4]) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(36);
    for (normal, u, v) in BOX_FACES {
        let face_center = center + axes * (normal * half);
        let u_half = axes * (u * half);
        let v_half = axes * (v * half);
        vertices.extend(quad(face_center, u_half, v_half, axes * normal, color));
    }
    vertices
}

/// The textured opening: top-left (0,1), bottom-left (0,0), top-right (1,1), bottom-right (1,0).
pub fn aperture_vertices(surface: &OrientedSurface, color: [f32; 4]) -> [Vertex; 6] {
    let half = surface.half_extents();
    quad(surface.position(), surface.right() * half.x, surface.up() * half.y, surface.normal(), color)
}

/// Decorative frame: four bars and four corner ornaments, recessed half their depth behind the
/// surface plane.
pub fn frame_vertices(surface: &OrientedSurface, color: [f32; 4]) -> Vec<Vertex> {
    let half = surface.half_extents();
    let thickness = FRAME_THICKNESS_RATIO * surface.width();
    let corner = FRAME_CORNER_SCALE * thickness;
    let depth_half = FRAME_DEPTH * 0.5;
    let (edge_r, edge_u) = (half.x + thickness * 0.5, half.y + thickness * 0.5);

    // (right, up) centre and half extents, in surface-local units
    let mut pieces = vec![
        ((-edge_r, 0.0), (thickness * 0.5, half.y + thickness)),
        ((edge_r, 0.0), (thickness * 0.5, half.y + thickness)),
        ((0.0, edge_u), (half.x, thickness * 0.5)),
        ((0.0, -edge_u), (half.x, thickness * 0.5)),
    ];
    for (r, u) in [(-edge_r, edge_u), (edge_r, edge_u), (-edge_r, -edge_u), (edge_r, -edge_u)] {
        pieces.push(((r, u), (corner * 0.5, corner * 0.5)));
    }

    let axes = surface.basis();
    pieces
        .into_iter()
        .flat_map(|((r, u), (hr, hu))| {
            let center = surface.from_local(Vec3::new(r, u, -depth_half));
            oriented_box(center, axes, Vec3::new(hr, hu, depth_half), color)
        })
        .collect()
}

pub fn prop_vertices(prop: &Prop) -> Vec<Vertex> {
    match prop.kind {
        PropKind::Plane => quad(
            prop.position,
            Vec3::Z * (prop.size.z * 0.5),
            Vec3::X * (prop.size.x * 0.5),
            Vec3::Y,
            prop.color,
        )
        .to_vec(),
        PropKind::Cube => oriented_box(prop.position, Mat3::IDENTITY, prop.size * 0.5, prop.color),
    }
}

pub fn scene_vertices(props: &[Prop]) -> Vec<Vertex> {
    props.iter().flat_map(prop_vertices).collect()
}
