// src/rendering_lib/shader.rs

// Shared by every pipeline; must match `ViewUniform` in renderer.rs.
const VIEW_UNIFORM_WGSL: &str = r#"
struct View {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    time: f32,
    distortion: f32,
    _padding: vec2<f32>,
}

@group(0) @binding(0)
var<uniform> camera: View;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
}
"#;

const SCENE_BODY_WGSL: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
    @location(2) world_position: vec3<f32>,
}

// Swirls everything above the floor around its area's vertical axis. Depends on position
// only, so vertices shared between faces stay together.
fn distort(p: vec3<f32>) -> vec3<f32> {
    if (camera.distortion < 0.5 || p.y <= 0.001) {
        return p;
    }
    let area = vec2<f32>(round(p.x / 20.0) * 20.0, 0.0);
    let rel = p.xz - area;
    let dist = length(rel);
    let angle = sin(dist * 0.5 + camera.time * 0.5) * 0.15;
    let c = cos(angle);
    let s = sin(angle);
    let swirled = vec2<f32>(rel.x * c - rel.y * s, rel.x * s + rel.y * c) + area;
    let lift = sin(dist * 0.8 + camera.time * 0.6) * 0.25;
    return vec3<f32>(swirled.x, p.y + lift, swirled.y);
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = distort(in.position);
    out.clip_position = camera.projection * camera.view * vec4<f32>(world, 1.0);
    out.normal = in.normal;
    out.color = in.color;
    out.world_position = world;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(0.4, 1.0, 0.3));
    let diffuse = max(dot(normalize(in.normal), light_dir), 0.0);
    var rgb = in.color.rgb * (0.35 + 0.65 * diffuse);
    if (camera.distortion > 0.5) {
        let pulse = 0.5 + 0.5 * sin(camera.time * 0.8 + in.world_position.x * 0.3 + in.world_position.z * 0.2);
        rgb = mix(rgb, rgb.gbr, pulse * 0.25);
    }
    return vec4<f32>(rgb, in.color.a);
}
"#;

const PORTAL_SURFACE_BODY_WGSL: &str = r#"
@group(1) @binding(0)
var portal_texture: texture_2d<f32>;
@group(1) @binding(1)
var portal_sampler: sampler;

struct PortalParams {
    edge_color: vec4<f32>,
    linked: f32,
    _padding0: f32,
    _padding1: f32,
    _padding2: f32,
}

@group(2) @binding(0)
var<uniform> params: PortalParams;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) screen: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.projection * camera.view * vec4<f32>(in.position, 1.0);
    out.uv = in.uv;
    out.screen = out.clip_position;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let edge = min(min(in.uv.x, 1.0 - in.uv.x), min(in.uv.y, 1.0 - in.uv.y));
    let glow = 1.0 - smoothstep(0.0, 0.06, edge);
    // The virtual view shares the real projection, so the fragment's own screen position
    // is where it sits in the portal's target.
    let ndc = in.screen.xy / in.screen.w;
    let screen_uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    let through = textureSample(portal_texture, portal_sampler, screen_uv).rgb;
    if (params.linked < 0.5) {
        return params.edge_color;
    }
    let rgb = mix(through, params.edge_color.rgb, glow * params.edge_color.a);
    return vec4<f32>(rgb, 1.0);
}
"#;

const PORTAL_FRAME_BODY_WGSL: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) color: vec4<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.projection * camera.view * vec4<f32>(in.position, 1.0);
    out.normal = in.normal;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(-0.3, 1.0, 0.5));
    let diffuse = max(dot(normalize(in.normal), light_dir), 0.0);
    let shimmer = 0.85 + 0.15 * sin(camera.time * 2.0);
    return vec4<f32>(in.color.rgb * (0.45 + 0.55 * diffuse) * shimmer, 1.0);
}
"#;

fn with_view_header(body: &str) -> String {
    format!("{VIEW_UNIFORM_WGSL}{body}")
}

pub fn scene_shader_source() -> String {
    with_view_header(SCENE_BODY_WGSL)
}

pub fn portal_surface_shader_source() -> String {
    with_view_header(PORTAL_SURFACE_BODY_WGSL)
}

pub fn portal_frame_shader_source() -> String {
    with_view_header(PORTAL_FRAME_BODY_WGSL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shader_has_entry_points_and_view() {
        for source in [scene_shader_source(), portal_surface_shader_source(), portal_frame_shader_source()] {
            assert!(source.contains("fn vs_main"));
            assert!(source.contains("fn fs_main"));
            assert!(source.contains("var<uniform> camera: View;"));
        }
    }
}
